//! Execution of the one-shot CLI commands.

use crate::config::{Config, StoreBackend};
use crate::error::{AppError, Result};
use crate::services::auth_service::AuthService;
use crate::storage::Stores;

/// Create a user in the configured store.
pub async fn create_user(config: &Config, username: &str, password: &str, admin: bool) -> Result<()> {
    if config.store_backend == StoreBackend::Memory {
        tracing::warn!("Creating a user in the in-memory store; it is discarded on exit");
    }
    let stores = Stores::from_config(config).await?;
    let user = AuthService::new(stores.accounts)
        .create_user(username, password, admin)
        .await?;
    println!("Created user {} ({})", user.username, user.id);
    Ok(())
}

/// Apply migrations against `DATABASE_URL`.
pub async fn migrate(config: &Config) -> Result<()> {
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL not set".into()))?;
    let pool = crate::db::create_pool(url, 1).await?;
    crate::db::run_migrations(&pool).await?;
    println!("Migrations applied");
    Ok(())
}
