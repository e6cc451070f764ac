//! Record stores.
//!
//! `postgres` is the production backend; `memory` keeps everything in-process
//! and backs local runs and the test suite.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::{Config, StoreBackend};
use crate::error::{AppError, Result};
use crate::models::log_record::{LogRecord, NewLogRecord};
use crate::models::user::{AuthToken, User};
use crate::services::log_filter::LogFilter;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence for log records.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Persist a new record and return it with its identifier.
    async fn insert(&self, record: NewLogRecord) -> Result<LogRecord>;

    /// Fetch a record by identifier.
    async fn get(&self, id: Uuid) -> Result<Option<LogRecord>>;

    /// Overwrite a record. Returns `None` when the identifier is unknown.
    async fn update(&self, id: Uuid, record: NewLogRecord) -> Result<Option<LogRecord>>;

    /// Remove a record. Returns `false` when the identifier is unknown.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Records matching `filter`, in insertion order.
    async fn query(&self, filter: &LogFilter) -> Result<Vec<LogRecord>>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<()>;
}

/// Persistence for users and their auth tokens.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Create a user; fails with `Conflict` when the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str, is_admin: bool)
        -> Result<User>;

    /// Return the user's token, storing `candidate_key` first if they have none.
    async fn get_or_create_token(&self, user_id: Uuid, candidate_key: &str) -> Result<AuthToken>;

    /// Resolve a token key to its active owner.
    async fn find_user_by_token(&self, key: &str) -> Result<Option<User>>;
}

/// Store handles shared by the API layer.
#[derive(Clone)]
pub struct Stores {
    pub logs: Arc<dyn LogStore>,
    pub accounts: Arc<dyn AccountStore>,
}

impl Stores {
    /// Open the backend selected in configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        match config.store_backend {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| AppError::Config("DATABASE_URL not set".into()))?;
                let pool = crate::db::create_pool(url, config.db_max_connections).await?;
                tracing::info!("Connected to database");
                crate::db::run_migrations(&pool).await?;
                Ok(Self::shared(Arc::new(PgStore::new(pool))))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory record store; data is lost on restart");
                Ok(Self::shared(Arc::new(MemoryStore::new())))
            }
        }
    }

    /// Use one store for both records and accounts.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: LogStore + AccountStore + 'static,
    {
        Self {
            logs: store.clone(),
            accounts: store,
        }
    }
}
