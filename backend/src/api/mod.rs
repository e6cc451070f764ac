//! API module - HTTP handlers and middleware.

pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;

use std::sync::Arc;

use crate::config::Config;
use crate::services::auth_service::AuthService;
use crate::services::log_record_service::LogRecordService;
use crate::storage::Stores;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub stores: Stores,
}

impl AppState {
    pub fn new(config: Config, stores: Stores) -> Self {
        Self { config, stores }
    }

    pub fn log_record_service(&self) -> LogRecordService {
        LogRecordService::new(self.stores.logs.clone())
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(self.stores.accounts.clone())
    }
}

pub type SharedState = Arc<AppState>;
