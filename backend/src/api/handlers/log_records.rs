//! Log record handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use utoipa::OpenApi;

use super::json_body;
use crate::api::openapi::ErrorResponse;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::log_record::{LogRecord, LogRecordPayload};

/// Log record routes. Trailing slashes on detail paths are optional.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_log_records).post(create_log_record))
        .route(
            "/:id",
            get(get_log_record)
                .put(replace_log_record)
                .patch(update_log_record)
                .delete(delete_log_record),
        )
        .route(
            "/:id/",
            get(get_log_record)
                .put(replace_log_record)
                .patch(update_log_record)
                .delete(delete_log_record),
        )
}

/// List log records matching the query filters.
///
/// Every supplied filter must match. Empty values, repeated keys (last value
/// wins) and unknown keys are tolerated.
#[utoipa::path(
    get,
    path = "/",
    tag = "logs",
    params(
        ("level" = Option<String>, Query, description = "Case-insensitive substring of the level"),
        ("message" = Option<String>, Query, description = "Case-insensitive substring of the message"),
        ("resourceId" = Option<String>, Query, description = "Exact resource id"),
        ("timestamp_after" = Option<String>, Query, description = "Inclusive lower bound on the timestamp"),
        ("timestamp_before" = Option<String>, Query, description = "Inclusive upper bound on the timestamp"),
        ("traceId" = Option<String>, Query, description = "Exact trace id"),
        ("spanId" = Option<String>, Query, description = "Exact span id"),
        ("commit" = Option<String>, Query, description = "Exact commit"),
        ("parentResourceId" = Option<String>, Query, description = "Case-insensitive substring of metadata.parentResourceId"),
        ("search" = Option<String>, Query, description = "Terms matched against every text field"),
        ("regex" = Option<String>, Query, description = "Regular expression matched against the message; prefix with (?i) to ignore case"),
    ),
    responses(
        (status = 200, description = "Matching log records", body = Vec<LogRecord>),
        (status = 400, description = "Invalid filter value", body = ErrorResponse),
    )
)]
pub async fn list_log_records(
    State(state): State<SharedState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<LogRecord>>> {
    let records = state.log_record_service().list(params).await?;
    Ok(Json(records))
}

/// Create a log record
#[utoipa::path(
    post,
    path = "/",
    tag = "logs",
    request_body = LogRecordPayload,
    responses(
        (status = 201, description = "Log record created", body = LogRecord),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
    ),
    security((), ("token_auth" = []))
)]
pub async fn create_log_record(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<LogRecordPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<LogRecord>)> {
    let record = state
        .log_record_service()
        .create(json_body(payload)?)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Get a log record by ID
#[utoipa::path(
    get,
    path = "/{id}/",
    tag = "logs",
    params(("id" = String, Path, description = "Log record ID")),
    responses(
        (status = 200, description = "Log record", body = LogRecord),
        (status = 404, description = "Log record not found", body = ErrorResponse),
    )
)]
pub async fn get_log_record(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<LogRecord>> {
    Ok(Json(state.log_record_service().get(&id).await?))
}

/// Replace a log record
#[utoipa::path(
    put,
    path = "/{id}/",
    tag = "logs",
    params(("id" = String, Path, description = "Log record ID")),
    request_body = LogRecordPayload,
    responses(
        (status = 200, description = "Log record replaced", body = LogRecord),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 404, description = "Log record not found", body = ErrorResponse),
    ),
    security((), ("token_auth" = []))
)]
pub async fn replace_log_record(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<LogRecordPayload>, JsonRejection>,
) -> Result<Json<LogRecord>> {
    let service = state.log_record_service();
    // Unknown ids are reported before body problems.
    service.get(&id).await?;
    let record = service.replace(&id, json_body(payload)?).await?;
    Ok(Json(record))
}

/// Partially update a log record
#[utoipa::path(
    patch,
    path = "/{id}/",
    tag = "logs",
    params(("id" = String, Path, description = "Log record ID")),
    request_body = LogRecordPayload,
    responses(
        (status = 200, description = "Log record updated", body = LogRecord),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 404, description = "Log record not found", body = ErrorResponse),
    ),
    security((), ("token_auth" = []))
)]
pub async fn update_log_record(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<LogRecordPayload>, JsonRejection>,
) -> Result<Json<LogRecord>> {
    let service = state.log_record_service();
    service.get(&id).await?;
    let record = service.patch(&id, json_body(payload)?).await?;
    Ok(Json(record))
}

/// Delete a log record
#[utoipa::path(
    delete,
    path = "/{id}/",
    tag = "logs",
    params(("id" = String, Path, description = "Log record ID")),
    responses(
        (status = 204, description = "Log record deleted"),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 404, description = "Log record not found", body = ErrorResponse),
    ),
    security((), ("token_auth" = []))
)]
pub async fn delete_log_record(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.log_record_service().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_log_records,
        create_log_record,
        get_log_record,
        replace_log_record,
        update_log_record,
        delete_log_record,
    ),
    components(schemas(LogRecord, LogRecordPayload))
)]
pub struct LogRecordsApiDoc;
