use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::ApiState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: String,
    pub version: &'static str,
}

/// Liveness plus a database probe. A failing probe is reported in the body,
/// never as an error status.
pub async fn health(State(state): State<ApiState>) -> Json<HealthStatus> {
    let database = match state.store.ping().await {
        Ok(()) => "connected".to_string(),
        Err(err) => format!("error: {err}"),
    };
    Json(HealthStatus {
        status: "healthy",
        database,
        version: env!("CARGO_PKG_VERSION"),
    })
}
