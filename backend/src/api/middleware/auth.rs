//! Token authentication middleware.
//!
//! Accepted header forms (scheme is case-insensitive):
//! - `Authorization: Token <key>`
//! - `Authorization: Bearer <key>`

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
        HeaderValue, Method,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::api::SharedState;
use crate::error::AppError;
use crate::models::user::User;

/// Authenticated user, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct AuthExtension {
    pub user_id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

impl From<User> for AuthExtension {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            is_admin: user.is_admin,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ExtractedToken<'a> {
    Key(&'a str),
    None,
    Invalid(&'static str),
}

fn extract_token_from_auth_header(auth_header: &str) -> ExtractedToken<'_> {
    let mut parts = auth_header.split_whitespace();
    let scheme = match parts.next() {
        Some(s) => s,
        None => return ExtractedToken::None,
    };
    if !(scheme.eq_ignore_ascii_case("Token") || scheme.eq_ignore_ascii_case("Bearer")) {
        return ExtractedToken::None;
    }
    match (parts.next(), parts.next()) {
        (Some(key), None) => ExtractedToken::Key(key),
        (None, _) => ExtractedToken::Invalid("Invalid token header. No credentials provided."),
        (Some(_), Some(_)) => {
            ExtractedToken::Invalid("Invalid token header. Token string should not contain spaces.")
        }
    }
}

fn extract_token(request: &Request) -> ExtractedToken<'_> {
    match request.headers().get(AUTHORIZATION) {
        Some(value) => match value.to_str() {
            Ok(header) => extract_token_from_auth_header(header),
            Err(_) => ExtractedToken::Invalid(
                "Invalid token header. Token string should not contain invalid characters.",
            ),
        },
        None => ExtractedToken::None,
    }
}

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn unauthorized(message: &str) -> Response {
    let mut response = AppError::Authentication(message.to_string()).into_response();
    response
        .headers_mut()
        .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Token"));
    response
}

/// Require a valid token on writes when `REQUIRE_AUTH_FOR_WRITES` is enabled.
///
/// Reads pass through untouched. A valid token on any request attaches an
/// [`AuthExtension`].
pub async fn write_guard_middleware(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Response {
    let enforce = state.config.require_auth_for_writes && !is_safe_method(request.method());

    let key = match extract_token(&request) {
        ExtractedToken::Key(key) => key.to_string(),
        ExtractedToken::Invalid(message) if enforce => return unauthorized(message),
        ExtractedToken::None if enforce => {
            return unauthorized("Authentication credentials were not provided.")
        }
        _ => return next.run(request).await,
    };

    match state.auth_service().authenticate_token(&key).await {
        Ok(user) => {
            tracing::debug!(username = %user.username, "Request authenticated");
            request.extensions_mut().insert(AuthExtension::from(user));
            next.run(request).await
        }
        Err(AppError::Authentication(message)) if enforce => unauthorized(&message),
        Err(AppError::Authentication(_)) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_schemes() {
        let key = "9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b";
        assert_eq!(
            extract_token_from_auth_header(&format!("Token {key}")),
            ExtractedToken::Key(key)
        );
        assert_eq!(
            extract_token_from_auth_header(&format!("bearer {key}")),
            ExtractedToken::Key(key)
        );
    }

    #[test]
    fn test_extract_token_other_schemes_ignored() {
        assert_eq!(
            extract_token_from_auth_header("Basic dXNlcjpwYXNz"),
            ExtractedToken::None
        );
        assert_eq!(extract_token_from_auth_header(""), ExtractedToken::None);
    }

    #[test]
    fn test_extract_token_malformed() {
        assert!(matches!(
            extract_token_from_auth_header("Token"),
            ExtractedToken::Invalid(_)
        ));
        assert!(matches!(
            extract_token_from_auth_header("Token abc def"),
            ExtractedToken::Invalid(_)
        ));
    }

    #[test]
    fn test_safe_methods() {
        assert!(is_safe_method(&Method::GET));
        assert!(is_safe_method(&Method::HEAD));
        assert!(!is_safe_method(&Method::POST));
        assert!(!is_safe_method(&Method::DELETE));
    }
}
