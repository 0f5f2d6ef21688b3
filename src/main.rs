use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the care visit application
///
/// Loads `.env` if present, then serves the REST API (with Swagger UI under `/swagger-ui`).
///
/// Every request except `/health` must carry the `x-api-key` header matching `CARE_API_KEY`
/// and an `x-staff-id` header naming the acting staff member.
///
/// # Environment Variables
/// - `CARE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CARE_API_KEY`: API key for request authentication (required)
/// - `CARE_SEED_FILE`: optional JSON seed of staff, clients, appointments and invoice groups
/// - `CARE_CONFLICT_POLICY`, `CARE_UTC_OFFSET_MINUTES`, `CARE_RECURRENCE_OCCURRENCES`,
///   `CARE_GEOFENCE_RADIUS_M`: scheduling and geofence settings
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("care_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("care_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr: SocketAddr = std::env::var("CARE_REST_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".into())
        .parse()?;

    let state = api_rest::app_state_from_env()?;
    let config = state.service.config();
    tracing::info!(
        conflict_policy = ?config.conflict_policy(),
        utc_offset = %config.agency_offset(),
        recurrence_occurrences = config.recurrence_occurrences(),
        geofence_radius_m = config.geofence_radius_m(),
        "care configuration loaded"
    );
    tracing::info!("++ Starting care REST on {}", rest_addr);

    let app = api_rest::router(state);
    let listener = tokio::net::TcpListener::bind(rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
