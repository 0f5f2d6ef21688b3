//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the care visit REST API on its own.
//!
//! ## Intended use
//! Useful for development and debugging. The workspace's main `care-run` binary serves the same
//! router after loading a `.env` file.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the care REST API server
///
/// Starts the REST API server on the configured address (default: 0.0.0.0:3000).
/// See [`api_rest::app_state_from_env`] for the remaining environment variables.
///
/// # Environment Variables
/// - `CARE_REST_ADDR`: Server address (default: "0.0.0.0:3000")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration or seed file is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("care_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CARE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting care REST API on {}", addr);

    let state = api_rest::app_state_from_env()?;
    let app = api_rest::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
