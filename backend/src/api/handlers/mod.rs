//! HTTP request handlers.

pub mod auth;
pub mod health;
pub mod log_records;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::{AppError, Result, NON_FIELD_ERRORS};

/// Unwrap a JSON body, reporting malformed input as a validation error.
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(AppError::field(NON_FIELD_ERRORS, rejection.body_text())),
    }
}
