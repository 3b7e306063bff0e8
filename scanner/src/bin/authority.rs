//! Mock ticket authority.
//!
//! Serves the seeded in-memory booking table over the authority's HTTP API.

use std::sync::Arc;
use tixscan::InMemoryAuthority;
use tixscan::config::ServerConfig;
use tixscan::server::{AuthorityState, router};
use tixscan_core::environment::{Clock, SystemClock};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tixscan=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let authority = Arc::new(InMemoryAuthority::seeded(clock.clone()));
    let app = router(AuthorityState::new(authority, clock));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Mock authority listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Mock authority stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(error) => {
            warn!(%error, "Could not listen for Ctrl+C; serving until killed");
            std::future::pending::<()>().await;
        },
    }
}
