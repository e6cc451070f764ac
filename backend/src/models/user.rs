//! User and auth token models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Account allowed to log in and write log records.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Bearer token bound to a single user.
///
/// A user owns at most one token; logging in again hands back the same key.
#[derive(Clone, FromRow, Serialize)]
pub struct AuthToken {
    pub key: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

redacted_debug!(AuthToken {
    redact key,
    show user_id,
    show created_at,
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_token_debug_redacts_key() {
        let token = AuthToken {
            key: "9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b".to_string(),
            user_id: Uuid::nil(),
            created_at: Utc::now(),
        };
        let debug = format!("{:?}", token);
        assert!(!debug.contains("9944b091"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("user_id"));
    }

    #[test]
    fn test_user_serialization_skips_password_hash() {
        let user = User {
            id: Uuid::nil(),
            username: "ingest-bot".to_string(),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".to_string(),
            is_active: true,
            is_admin: false,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["username"], "ingest-bot");
        assert!(value.get("password_hash").is_none());
    }
}
