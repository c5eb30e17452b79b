use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::database;
use crate::edge::TableOrigin;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub directory: String,
    pub routing: TableOrigin,
}

/// GET /health - 200 when the staff directory answers, 503 when degraded.
/// Both carry the same report under `data`.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let table = state.edge.table().await;

    let directory = match &state.db {
        None => Ok("memory".to_string()),
        Some(pool) => match tokio::time::timeout(Duration::from_secs(2), database::health_check(pool)).await {
            Ok(Ok(())) => Ok("ok".to_string()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err("health check timed out".to_string()),
        },
    };

    let (status, healthy, report) = match directory {
        Ok(directory) => (
            StatusCode::OK,
            true,
            HealthReport {
                status: "ok",
                timestamp: Utc::now(),
                directory,
                routing: table.origin(),
            },
        ),
        Err(e) => {
            tracing::warn!("Health check degraded: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                false,
                HealthReport {
                    status: "degraded",
                    timestamp: Utc::now(),
                    directory: "unreachable".to_string(),
                    routing: table.origin(),
                },
            )
        }
    };

    (status, Json(json!({ "ok": healthy, "data": report })))
}
