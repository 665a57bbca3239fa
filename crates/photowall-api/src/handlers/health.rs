//! Health check handler.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Run an async check with timeout; returns "healthy", "timeout", or "{prefix}: {error}".
async fn run_check<F, E>(timeout: Duration, f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub storage: String,
    pub queue: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_length: Option<u64>,
}

/// Storage is critical; the queue only degrades the service, since uploads still succeed
/// without it.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.store.clone();
    let storage = run_check(TIMEOUT, async move { store.health_check().await }, "unhealthy").await;
    let storage_healthy = storage == "healthy";

    let (queue, queue_length) = match &state.dispatcher {
        None => ("disabled".to_string(), None),
        Some(dispatcher) => {
            let status = run_check(TIMEOUT, dispatcher.ping(), "unavailable").await;
            let length = if status == "healthy" {
                match tokio::time::timeout(TIMEOUT, dispatcher.length()).await {
                    Ok(Ok(length)) => Some(length),
                    _ => None,
                }
            } else {
                None
            };
            (status, length)
        }
    };

    let status = if !storage_healthy {
        "unhealthy"
    } else if queue == "healthy" || queue == "disabled" {
        "healthy"
    } else {
        "degraded"
    };

    if status != "healthy" {
        tracing::warn!(storage = %storage, queue = %queue, "Health check not healthy");
    }

    let status_code = if storage_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthCheckResponse {
            status: status.to_string(),
            storage,
            queue,
            queue_length,
        }),
    )
}
