use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use http::StatusCode;

use crate::error::json_error_response;
use crate::state::AppState;

pub const FETCH_MODELS_FAILED_MESSAGE: &str = "Failed to fetch models";

/// `GET /api/models`: the upstream model list, served through the cache.
pub async fn handler(State(state): State<Arc<AppState>>) -> Response {
    match state.models().await {
        Ok(models) => (StatusCode::OK, Json(&*models)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to fetch models");
            json_error_response(StatusCode::INTERNAL_SERVER_ERROR, FETCH_MODELS_FAILED_MESSAGE)
        }
    }
}
