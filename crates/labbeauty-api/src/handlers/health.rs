use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::state::AppState;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
/// Key probed to check the object store is reachable; it need not exist.
const STORAGE_PROBE_KEY: &str = "healthcheck.probe";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub environment: String,
    pub database: &'static str,
    pub storage: &'static str,
    pub background_tasks: usize,
}

/// Report status, environment, and database and storage reachability.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match &state.pool {
        Some(pool) => {
            match tokio::time::timeout(PROBE_TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await {
                Ok(Ok(_)) => "available",
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "Database health check failed");
                    "unavailable"
                }
                Err(_) => {
                    tracing::warn!("Database health check timed out");
                    "unavailable"
                }
            }
        }
        None => "not configured",
    };

    let storage = match tokio::time::timeout(
        PROBE_TIMEOUT,
        state.media.storage().exists(STORAGE_PROBE_KEY),
    )
    .await
    {
        Ok(Ok(_)) => "available",
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Storage health check failed");
            "unavailable"
        }
        Err(_) => {
            tracing::warn!("Storage health check timed out");
            "unavailable"
        }
    };

    let healthy = database != "unavailable" && storage != "unavailable";
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if healthy { "available" } else { "degraded" },
            environment: state.environment.clone(),
            database,
            storage,
            background_tasks: state.tasks.len(),
        }),
    )
}
