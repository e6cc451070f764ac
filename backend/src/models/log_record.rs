//! Log record model and payload validation.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Result, ValidationErrors};

/// Maximum length of the indexed string columns.
pub const MAX_FIELD_LEN: usize = 255;

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const TOO_LONG: &str = "Ensure this field has no more than 255 characters.";
pub const INVALID_DATETIME: &str = "Datetime has wrong format. Use one of these formats instead: \
     YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z].";

/// Free-form metadata attached to a record.
///
/// `parentResourceId` is mandatory; every other key is kept as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(rename = "parentResourceId")]
    pub parent_resource_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    pub fn new(parent_resource_id: impl Into<String>) -> Self {
        Self {
            parent_resource_id: parent_resource_id.into(),
            extra: Map::new(),
        }
    }
}

/// A stored log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub id: Uuid,
    pub level: String,
    pub message: String,
    pub resource_id: String,
    pub timestamp: DateTime<Utc>,
    pub trace_id: String,
    pub span_id: String,
    pub commit: String,
    #[schema(value_type = Object)]
    pub metadata: Metadata,
}

impl LogRecord {
    /// Attach an identifier to validated fields.
    pub fn from_new(id: Uuid, record: NewLogRecord) -> Self {
        Self {
            id,
            level: record.level,
            message: record.message,
            resource_id: record.resource_id,
            timestamp: record.timestamp,
            trace_id: record.trace_id,
            span_id: record.span_id,
            commit: record.commit,
            metadata: record.metadata,
        }
    }
}

/// Validated record contents, ready to be written to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogRecord {
    pub level: String,
    pub message: String,
    pub resource_id: String,
    pub timestamp: DateTime<Utc>,
    pub trace_id: String,
    pub span_id: String,
    pub commit: String,
    pub metadata: Metadata,
}

/// Request body for create, replace and partial update.
///
/// Every field is optional at the type level so that missing fields are
/// reported through the field-level error map instead of a decode failure.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogRecordPayload {
    pub level: Option<String>,
    pub message: Option<String>,
    pub resource_id: Option<String>,
    /// RFC 3339 timestamp; naive values are read as UTC
    pub timestamp: Option<String>,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub commit: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
}

impl LogRecordPayload {
    /// Validate a complete payload (create / replace).
    pub fn validate(self) -> Result<NewLogRecord> {
        let mut errors = ValidationErrors::new();

        let level = required_str(&mut errors, "level", self.level, Some(MAX_FIELD_LEN));
        let message = required_str(&mut errors, "message", self.message, None);
        let resource_id =
            required_str(&mut errors, "resourceId", self.resource_id, Some(MAX_FIELD_LEN));
        let trace_id = required_str(&mut errors, "traceId", self.trace_id, Some(MAX_FIELD_LEN));
        let span_id = required_str(&mut errors, "spanId", self.span_id, Some(MAX_FIELD_LEN));
        let commit = required_str(&mut errors, "commit", self.commit, Some(MAX_FIELD_LEN));

        let timestamp = match self.timestamp {
            None => {
                errors.add("timestamp", REQUIRED);
                None
            }
            Some(raw) => {
                let parsed = parse_timestamp(&raw);
                if parsed.is_none() {
                    errors.add("timestamp", INVALID_DATETIME);
                }
                parsed
            }
        };

        let metadata = match self.metadata {
            None | Some(Value::Null) => {
                errors.add("metadata", REQUIRED);
                None
            }
            Some(value) => validate_metadata(&mut errors, value),
        };

        errors.into_result()?;

        match (level, message, resource_id, timestamp, trace_id, span_id, commit, metadata) {
            (
                Some(level),
                Some(message),
                Some(resource_id),
                Some(timestamp),
                Some(trace_id),
                Some(span_id),
                Some(commit),
                Some(metadata),
            ) => Ok(NewLogRecord {
                level,
                message,
                resource_id,
                timestamp,
                trace_id,
                span_id,
                commit,
                metadata,
            }),
            _ => Err(crate::error::AppError::Internal(
                "log record validation lost a field".to_string(),
            )),
        }
    }

    /// Fill the fields this payload leaves out from `existing` (partial update).
    pub fn merged_over(self, existing: &LogRecord) -> Self {
        Self {
            level: self.level.or_else(|| Some(existing.level.clone())),
            message: self.message.or_else(|| Some(existing.message.clone())),
            resource_id: self.resource_id.or_else(|| Some(existing.resource_id.clone())),
            timestamp: self
                .timestamp
                .or_else(|| Some(existing.timestamp.to_rfc3339())),
            trace_id: self.trace_id.or_else(|| Some(existing.trace_id.clone())),
            span_id: self.span_id.or_else(|| Some(existing.span_id.clone())),
            commit: self.commit.or_else(|| Some(existing.commit.clone())),
            metadata: self
                .metadata
                .or_else(|| serde_json::to_value(&existing.metadata).ok()),
        }
    }
}

fn required_str(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    max_len: Option<usize>,
) -> Option<String> {
    let Some(value) = value else {
        errors.add(field, REQUIRED);
        return None;
    };
    if value.trim().is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    if let Some(max) = max_len {
        if value.chars().count() > max {
            errors.add(field, TOO_LONG);
            return None;
        }
    }
    Some(value)
}

fn validate_metadata(errors: &mut ValidationErrors, value: Value) -> Option<Metadata> {
    let Value::Object(mut map) = value else {
        errors.add(
            "metadata",
            format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_type_name(&value)
            ),
        );
        return None;
    };

    const PARENT: &str = "metadata.parentResourceId";
    let parent = match map.remove("parentResourceId") {
        None | Some(Value::Null) => {
            errors.add(PARENT, REQUIRED);
            return None;
        }
        Some(Value::String(s)) => s,
        Some(_) => {
            errors.add(PARENT, "Not a valid string.");
            return None;
        }
    };
    let parent = required_str(errors, PARENT, Some(parent), Some(MAX_FIELD_LEN))?;

    Some(Metadata {
        parent_resource_id: parent,
        extra: map,
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%dT%H:%M%:z",
];

/// Parse a timestamp from a payload or a filter value.
///
/// Offsets are honoured and normalised to UTC; naive date-times and bare
/// dates are read as UTC. Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
