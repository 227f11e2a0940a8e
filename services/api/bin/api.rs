//! Main Entrypoint for the Turn Relay API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging (stdout, or a dedicated log file).
//! 3. Wiring the conversation agent and its host bindings.
//! 4. Constructing the Axum router and applying middleware.
//! 5. Binding the listener, then probing the backend once in the background so
//!    a misconfiguration shows up in the logs early.
//! 6. Serving requests and handling graceful shutdown.

use anyhow::Context;
use std::{
    fs::OpenOptions,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use turn_relay_api::{build_state, config::Config, router::create_router, state::AppState};

/// Upper bound for the startup health probe.
const STARTUP_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
///
/// In-flight turns are dropped with their connections: a pending backend call
/// or re-arm delay is abandoned, while already dispatched speech still plays.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C; shutting down");
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.init(),
    }
    Ok(())
}

async fn probe_backend(app_state: Arc<AppState>) {
    match app_state
        .agent
        .validate_backend_with(STARTUP_PROBE_TIMEOUT)
        .await
    {
        Ok(validated) => info!(
            title = %validated.title,
            version = %validated.version,
            "Backend health check passed"
        ),
        Err(e) => warn!(
            error = %e,
            "Backend health check failed; turns will be attempted anyway"
        ),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    init_logging(&config)?;
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Shared Services ---
    let app_state = build_state(config.clone())?;

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state.clone()).layer(cors);

    // --- 5. Bind, then Probe the Backend ---
    info!(
        agent = %app_state.agent.settings().display_name(),
        timeout_secs = config.backend_timeout.as_secs(),
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    tokio::spawn(probe_backend(app_state.clone()));

    // --- 6. Serve ---

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
