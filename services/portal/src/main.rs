use anyhow::Result;
use common::Settings;
use portal::{AppState, routes};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// How often expired sessions and login throttling keys are purged
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// `RUST_LOG`, then `LOG_LEVEL`, then `info`
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("LOG_LEVEL"))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter())
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting portal service");

    let settings = Settings::from_env()?;
    info!(
        "Backend at {}, request client at {}",
        settings.backend_url, settings.api_url
    );

    let app_state = AppState::from_settings(&settings)?;
    app_state.auth.sessions.spawn_cleanup(CLEANUP_INTERVAL);
    app_state.auth.rate_limiter.spawn_cleanup(CLEANUP_INTERVAL);

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    info!("Portal service listening on {}", settings.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
