//! OpenAPI document generated from handler annotations via utoipa.

use axum::Json;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Root OpenAPI document. Handler modules contribute their own paths and
/// schemas and are merged in by [`build_openapi`].
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Log Ingestor API",
        description = "Ingests structured log records and answers filtered queries over them.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "logs", description = "Log record ingestion and queries"),
        (name = "auth", description = "Token login"),
        (name = "health", description = "Health checks"),
    ),
    components(schemas(ErrorResponse))
)]
pub struct ApiDoc;

/// Error body returned by every endpoint on failure.
#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g. "NOT_FOUND", "VALIDATION_ERROR")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Field name to messages; present on validation errors
    #[schema(value_type = Option<Object>)]
    pub errors: Option<serde_json::Value>,
}

/// Registers the `Authorization: Token <key>` scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token_auth",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "Authorization",
                    "Token <key> or Bearer <key>",
                ))),
            );
        }
    }
}

/// Build the merged OpenAPI document from all handler modules.
pub fn build_openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.merge(super::handlers::log_records::LogRecordsApiDoc::openapi());
    doc.merge(super::handlers::auth::AuthApiDoc::openapi());
    doc.merge(super::handlers::health::HealthApiDoc::openapi());
    doc
}

/// Serve the OpenAPI document as JSON.
pub async fn swagger_json() -> Json<utoipa::openapi::OpenApi> {
    Json(build_openapi())
}
