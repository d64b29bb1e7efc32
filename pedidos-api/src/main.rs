use anyhow::Context;
use pedidos_api::{app, AppState};
use pedidos_core::Store;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pedidos_api=debug,pedidos_order=debug,pedidos_inventory=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = pedidos_store::app_config::Config::load().context("Failed to load config")?;
    tracing::info!("Starting pedidos API on port {}", config.server.port);

    let store = pedidos_store::connect(&config.database)
        .await
        .context("Failed to connect to the database")?;

    match store.ping().await {
        Ok(time) => tracing::info!("Store reachable, clock at {}", time),
        Err(e) => tracing::error!("Store ping failed: {}", e),
    }

    let app_state = AppState::new(store, config.orders.strict_statuses, config.auth.clone());
    let app = app(
        app_state,
        Duration::from_secs(config.server.request_timeout_seconds),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
