//! Per-request tracing span keyed by a correlation ID.
//!
//! The ID is taken from `X-Correlation-ID`, else from the trace-id segment of a
//! W3C `traceparent` header, else generated. It is echoed back on the response
//! so ingest clients can tie their writes to server logs.

use axum::{
    extract::Request,
    http::{header::HeaderValue, HeaderMap, HeaderName},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

/// The header name for correlation IDs (`X-Correlation-ID`).
pub const CORRELATION_ID_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

const TRACEPARENT_HEADER: HeaderName = HeaderName::from_static("traceparent");

/// Correlation ID of the current request, stored as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Pick the ID from request headers, generating one when neither is usable.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        header(CORRELATION_ID_HEADER)
            .map(str::to_string)
            .or_else(|| {
                // version-traceid-parentid-flags
                header(TRACEPARENT_HEADER)
                    .and_then(|tp| tp.split('-').nth(1))
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
            })
            .map(Self)
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wrap the request in an `http_request` span and tag the response.
pub async fn correlation_id_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = CorrelationId::from_headers(request.headers());
    let span = tracing::info_span!(
        "http_request",
        correlation_id = %correlation_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    request.extensions_mut().insert(correlation_id.clone());

    async move {
        let mut response = next.run(request).await;
        if let Ok(value) = HeaderValue::from_str(correlation_id.as_str()) {
            response.headers_mut().insert(CORRELATION_ID_HEADER, value);
        }
        tracing::info!(status = response.status().as_u16(), "Request completed");
        response
    }
    .instrument(span)
    .await
}
