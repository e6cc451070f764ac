//! Application configuration loaded from environment variables.

use crate::error::{AppError, Result};
use std::env;

/// Which record store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgreSQL through sqlx
    Postgres,
    /// In-process store, contents are lost on restart
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::Config(format!("Unknown store backend: {}", other))),
        }
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Server bind address (host:port)
    pub bind_address: String,

    /// Record store backend: "postgres" or "memory"
    pub store_backend: StoreBackend,

    /// Database connection URL (required when store_backend = "postgres")
    pub database_url: Option<String>,

    /// Upper bound on pooled database connections
    pub db_max_connections: u32,

    /// When true, POST/PUT/PATCH/DELETE on log records require a token
    pub require_auth_for_writes: bool,

    /// Username provisioned at startup when it does not exist yet
    pub admin_username: Option<String>,

    /// Password for the provisioned user
    pub admin_password: Option<String>,

    /// OTLP collector endpoint; span export is disabled when unset
    pub otel_endpoint: Option<String>,

    /// Service name reported to the OTLP collector
    pub otel_service_name: String,
}

redacted_debug!(Config {
    show bind_address,
    show store_backend,
    redact_option database_url,
    show db_max_connections,
    show require_auth_for_writes,
    show admin_username,
    redact_option admin_password,
    show otel_endpoint,
    show otel_service_name,
});

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let store_backend: StoreBackend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".into())
            .parse()?;

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(AppError::Config("DATABASE_URL not set".into()));
        }

        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".into()),
            store_backend,
            database_url,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),
            require_auth_for_writes: env::var("REQUIRE_AUTH_FOR_WRITES")
                .map(|v| parse_bool(&v))
                .unwrap_or(false),
            admin_username: env::var("ADMIN_USERNAME").ok().filter(|s| !s.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty()),
            otel_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|s| !s.is_empty()),
            otel_service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "log-ingestor".into()),
        })
    }

    /// In-memory configuration, used by tests and local experiments.
    pub fn in_memory() -> Self {
        Self {
            bind_address: "127.0.0.1:0".into(),
            store_backend: StoreBackend::Memory,
            database_url: None,
            db_max_connections: 1,
            require_auth_for_writes: false,
            admin_username: None,
            admin_password: None,
            otel_endpoint: None,
            otel_service_name: "log-ingestor".into(),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
