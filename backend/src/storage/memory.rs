//! In-process store.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountStore, LogStore};
use crate::error::{AppError, Result};
use crate::models::log_record::{LogRecord, NewLogRecord};
use crate::models::user::{AuthToken, User};
use crate::services::log_filter::LogFilter;

/// Store holding records, users and tokens in memory.
///
/// Records are kept in a `Vec`, so insertion order is the natural order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<LogRecord>>,
    users: RwLock<Vec<User>>,
    tokens: RwLock<Vec<AuthToken>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn insert(&self, record: NewLogRecord) -> Result<LogRecord> {
        let record = LogRecord::from_new(Uuid::new_v4(), record);
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<LogRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn update(&self, id: Uuid, record: NewLogRecord) -> Result<Option<LogRecord>> {
        let mut records = self.records.write().await;
        Ok(records.iter_mut().find(|r| r.id == id).map(|slot| {
            *slot = LogRecord::from_new(id, record);
            slot.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() != before)
    }

    async fn query(&self, filter: &LogFilter) -> Result<Vec<LogRecord>> {
        let records = self.records.read().await;
        Ok(filter.apply(records.iter()))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == username) {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            is_active: true,
            is_admin,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn get_or_create_token(&self, user_id: Uuid, candidate_key: &str) -> Result<AuthToken> {
        let mut tokens = self.tokens.write().await;
        if let Some(existing) = tokens.iter().find(|t| t.user_id == user_id) {
            return Ok(existing.clone());
        }
        let token = AuthToken {
            key: candidate_key.to_string(),
            user_id,
            created_at: Utc::now(),
        };
        tokens.push(token.clone());
        Ok(token)
    }

    async fn find_user_by_token(&self, key: &str) -> Result<Option<User>> {
        let user_id = {
            let tokens = self.tokens.read().await;
            match tokens.iter().find(|t| t.key == key) {
                Some(token) => token.user_id,
                None => return Ok(None),
            }
        };
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.id == user_id && u.is_active)
            .cloned())
    }
}
