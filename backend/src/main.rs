//! Log Ingestor - Main Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use log_ingestor_backend::{
    api,
    cli::{runner, Cli, Command},
    config::Config,
    error::Result,
    services::auth_service::AuthService,
    storage::Stores,
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_env()?;
    let _otel_guard =
        telemetry::init_tracing(config.otel_endpoint.as_deref(), &config.otel_service_name);

    match cli.command() {
        Command::Serve => serve(config).await,
        Command::CreateUser {
            username,
            password,
            admin,
        } => runner::create_user(&config, username, password, *admin).await,
        Command::Migrate => runner::migrate(&config).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    tracing::info!(backend = ?config.store_backend, "Starting Log Ingestor");

    let stores = Stores::from_config(&config).await?;
    provision_admin_user(&config, &stores).await?;

    let addr: SocketAddr = config.bind_address.parse()?;
    let state = Arc::new(api::AppState::new(config, stores));

    let app = api::routes::create_router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Create the configured admin user on first boot.
async fn provision_admin_user(config: &Config, stores: &Stores) -> Result<()> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        return Ok(());
    };

    let created = AuthService::new(stores.accounts.clone())
        .ensure_user(username, password, true)
        .await?;
    if created {
        tracing::info!(username = %username, "Provisioned admin user");
    } else {
        tracing::debug!(username = %username, "Admin user already exists");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
