//! Health and metrics.

use crate::router::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

/// `GET /health`
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "bg-api-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /metrics`: request counters plus the governance service's counters.
pub async fn metrics(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "gateway": state.metrics.to_json(),
        "governance": state.governance_metrics.snapshot(),
    }))
}
