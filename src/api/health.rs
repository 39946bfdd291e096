use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// Health check handler.
pub fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "chat-playground is running",
        "mock_mode": state.upstream.is_mock(),
        "models_cache_ttl_secs": state.config.server.models_cache_ttl_secs,
    }))
}
