use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use serde_json::Value;

use crate::error::{json_error_response, PlaygroundError};
use crate::protocol::{ChatCompletionRequest, ChatRequest};
use crate::state::AppState;

pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields: model and messages";

/// `POST /api/chat`: validate, then proxy the upstream SSE stream verbatim.
pub async fn handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request = match parse_chat_request(&body) {
        Ok(request) => request,
        Err(err @ PlaygroundError::InvalidRequest(_)) => {
            tracing::warn!(error = %err, "rejected chat request");
            return err.into_response();
        }
        Err(err) => {
            tracing::error!(error = %err, "error in chat API");
            return json_error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.public_message());
        }
    };

    tracing::debug!(
        model = %request.model,
        message_count = request.messages.len(),
        "chat request accepted"
    );
    let upstream_request = ChatCompletionRequest::streaming(request.model, request.messages);
    match state.upstream.chat_completion_stream(upstream_request).await {
        Ok(stream) => sse_ok_response(Body::from_stream(stream)),
        Err(err) => {
            tracing::error!(error = %err, "error in chat API");
            json_error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.public_message())
        }
    }
}

/// Decode and validate the inbound body.
///
/// Field presence follows JSON truthiness: `null`, `false`, `0` and `""`
/// count as missing. Message entries are not inspected.
pub(crate) fn parse_chat_request(body: &[u8]) -> Result<ChatRequest, PlaygroundError> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|err| PlaygroundError::Internal(format!("Invalid JSON body: {err}")))?;

    let model = payload.get("model").filter(|value| is_truthy(value));
    let messages = payload.get("messages").filter(|value| is_truthy(value));
    let (Some(Value::String(model)), Some(Value::Array(messages))) = (model, messages) else {
        return Err(PlaygroundError::InvalidRequest(MISSING_FIELDS_MESSAGE.to_string()));
    };

    Ok(ChatRequest {
        model: model.clone(),
        messages: messages.clone(),
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn sse_ok_response(body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    response
}
