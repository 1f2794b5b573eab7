use anyhow::Context;
use firebird_web_admin::{AdminConfig, AdminLayer};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "firebird_web_admin=info,admin_server=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AdminConfig::from_env().context("Failed to load configuration")?;

    if config.uses_development_secret() {
        tracing::warn!("JWT_SECRET is not set, signing tokens with the development secret");
    }
    if config.demo_mode {
        tracing::info!(database = %config.demo_database, "demo mode enabled");
    }

    let bind_address = config.bind_address;
    let version = config.version.clone();
    let app = AdminLayer::firebird(config).into_router();

    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;

    tracing::info!(address = %bind_address, %version, "Firebird web admin listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
