use std::{net::SocketAddr, sync::Arc};

use tracing::{info, warn};
use tuberelay::{
    common::{logger, types::AnyResult},
    configs::Config,
    server::AppState,
    transport,
};

#[tokio::main]
async fn main() -> AnyResult<()> {
    let (config, load_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    logger::init(&config.logging);

    if let Some(e) = load_error {
        warn!("Could not load configuration ({}); using built-in defaults", e);
    }

    let address: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let shared_state = Arc::new(AppState::new(config)?);

    let app = transport::router(shared_state).layer(tower_http::trace::TraceLayer::new_for_http());

    info!(
        "{} {} listening on {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        address
    );

    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
