use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use billflow_backend::{
    config::Config,
    server::{build_state, create_app},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "billflow_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting BillFlow Backend...");

    let state = build_state(config.clone())
        .await
        .context("Failed to initialise application state")?;
    let app = create_app(state);

    let ip = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST: {}", config.host))?;
    let addr = SocketAddr::new(ip, config.port);
    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
