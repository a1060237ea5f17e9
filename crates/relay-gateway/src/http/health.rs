use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// GET /health: liveness check with the enabled channels and fan-out target count.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "build": env!("RELAY_GIT_SHA"),
        "channels": state.adapters.kinds(),
        "fanout_targets": state.dispatcher.subscriptions().len(),
    }))
}
