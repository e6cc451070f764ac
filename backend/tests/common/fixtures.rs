//! Test fixtures and data factories for backend tests

#![allow(dead_code)]

use serde_json::{json, Value};

/// Test user credentials
pub struct TestUser {
    pub username: String,
    pub password: String,
}

impl TestUser {
    pub fn regular() -> Self {
        Self {
            username: "testuser".to_string(),
            password: "password123".to_string(),
        }
    }

    pub fn with_name(name: &str) -> Self {
        Self {
            username: name.to_string(),
            password: "password123".to_string(),
        }
    }
}

/// A complete, valid log record body.
pub fn log_record(level: &str, message: &str) -> Value {
    json!({
        "level": level,
        "message": message,
        "resourceId": "server-1234",
        "timestamp": "2023-09-15T08:00:00Z",
        "traceId": "abc-xyz-123",
        "spanId": "span-456",
        "commit": "5e5342f",
        "metadata": {
            "parentResourceId": "server-0987"
        }
    })
}

/// Variations over the base record used by the filter tests.
pub fn sample_records() -> Vec<Value> {
    let mut disk = log_record("error", "Failed to connect to DB: disk full");
    disk["resourceId"] = json!("server-1234");
    disk["timestamp"] = json!("2023-09-15T08:00:00Z");

    let mut startup = log_record("info", "Service started");
    startup["resourceId"] = json!("server-5678");
    startup["timestamp"] = json!("2023-09-15T09:30:00Z");
    startup["traceId"] = json!("trace-777");
    startup["commit"] = json!("a1b2c3d");
    startup["metadata"] = json!({"parentResourceId": "cluster-east"});

    let mut warning = log_record("WARNING", "Disk usage at 91%");
    warning["resourceId"] = json!("server-1234");
    warning["timestamp"] = json!("2023-09-16T12:00:00Z");
    warning["spanId"] = json!("span-999");

    vec![disk, startup, warning]
}
