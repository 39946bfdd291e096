use futures_util::future::BoxFuture;
use futures_util::{FutureExt, StreamExt, TryStreamExt};
use http::{header, HeaderMap, HeaderValue, Method};

use super::{ByteStream, ModelApi};
use crate::config::UpstreamConfig;
use crate::error::PlaygroundError;
use crate::protocol::{ChatCompletionRequest, ModelDescriptor};
use crate::transport::HttpTransport;

pub const MISSING_API_KEY_MESSAGE: &str = "FIREWORKS_API_KEY is not configured";

/// Client for the hosted Fireworks inference API (OpenAI-compatible).
pub struct FireworksClient {
    transport: HttpTransport,
    api_key: Option<String>,
    chat_url: String,
    models_url: String,
}

impl FireworksClient {
    #[must_use]
    pub fn new(transport: HttpTransport, config: &UpstreamConfig) -> Self {
        Self {
            transport,
            api_key: config.api_key().map(str::to_string),
            chat_url: build_chat_url(&config.base_url),
            models_url: config.models_url.clone(),
        }
    }

    fn require_api_key(&self) -> Result<&str, PlaygroundError> {
        self.api_key.as_deref().ok_or_else(|| {
            tracing::error!("{MISSING_API_KEY_MESSAGE}");
            PlaygroundError::Config(MISSING_API_KEY_MESSAGE.to_string())
        })
    }

    fn chat_headers(&self) -> Result<HeaderMap, PlaygroundError> {
        let api_key = self.require_api_key()?;
        let authorization = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
            PlaygroundError::Config("FIREWORKS_API_KEY contains invalid characters".to_string())
        })?;
        let mut headers = HeaderMap::with_capacity(3);
        headers.insert(header::AUTHORIZATION, authorization);
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/event-stream"));
        Ok(headers)
    }

    async fn fetch_models(&self) -> Result<Vec<ModelDescriptor>, PlaygroundError> {
        self.require_api_key()?;
        let response = self
            .transport
            .send_request(&self.models_url, Method::GET, HeaderMap::new(), None)
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PlaygroundError::Upstream {
                status: status.as_u16(),
                message: format!(
                    "Failed to fetch models: {}",
                    status.canonical_reason().unwrap_or("Unknown status")
                ),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| PlaygroundError::Transport(format!("Failed to read models body: {err}")))?;
        serde_json::from_slice(&body)
            .map_err(|err| PlaygroundError::Internal(format!("Invalid models payload: {err}")))
    }

    async fn open_chat_stream(
        &self,
        mut request: ChatCompletionRequest,
    ) -> Result<ByteStream, PlaygroundError> {
        let headers = self.chat_headers()?;
        request.stream = true;
        let body = serde_json::to_vec(&request)
            .map_err(|err| PlaygroundError::Internal(format!("Failed to encode request: {err}")))?;

        tracing::info!(
            model = %request.model,
            message_count = request.messages.len(),
            "opening upstream chat stream"
        );
        let response = self
            .transport
            .send_request(&self.chat_url, Method::POST, headers, Some(body.into()))
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let message = upstream_error_message(status, &body);
            tracing::warn!(status = status.as_u16(), error = %message, "upstream rejected chat request");
            return Err(PlaygroundError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response
            .bytes_stream()
            .map_err(|err| PlaygroundError::Transport(err.to_string()))
            .boxed())
    }
}

impl ModelApi for FireworksClient {
    fn list_models(&self) -> BoxFuture<'_, Result<Vec<ModelDescriptor>, PlaygroundError>> {
        self.fetch_models().boxed()
    }

    fn chat_completion_stream(
        &self,
        request: ChatCompletionRequest,
    ) -> BoxFuture<'_, Result<ByteStream, PlaygroundError>> {
        self.open_chat_stream(request).boxed()
    }
}

fn build_chat_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        return trimmed.to_string();
    }
    format!("{trimmed}/chat/completions")
}

/// Error text for a failed chat call: the JSON `error.message` of the body
/// when present, otherwise a generic status line.
pub(crate) fn upstream_error_message(status: http::StatusCode, body: &[u8]) -> String {
    const MAX_LEN: usize = 500;

    let extracted = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|e| e.get("message"))
                .and_then(serde_json::Value::as_str)
                .filter(|msg| !msg.is_empty())
                .map(str::to_string)
        });

    match extracted {
        Some(msg) if msg.len() > MAX_LEN => {
            let cut = (0..=MAX_LEN)
                .rev()
                .find(|&i| msg.is_char_boundary(i))
                .unwrap_or(0);
            format!("{}...", &msg[..cut])
        }
        Some(msg) => msg,
        None => format!(
            "Streaming chat completion failed: {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )
        .trim_end()
        .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_chat_url() {
        assert_eq!(
            build_chat_url("https://api.fireworks.ai/inference/v1/"),
            "https://api.fireworks.ai/inference/v1/chat/completions"
        );
        assert_eq!(
            build_chat_url("http://localhost:9/v1/chat/completions"),
            "http://localhost:9/v1/chat/completions"
        );
    }

    #[test]
    fn test_upstream_error_message_prefers_json_message() {
        let msg = upstream_error_message(
            http::StatusCode::UNAUTHORIZED,
            br#"{"error":{"message":"invalid api key","code":"unauthorized"}}"#,
        );
        assert_eq!(msg, "invalid api key");
    }

    #[test]
    fn test_upstream_error_message_fallback() {
        let msg = upstream_error_message(http::StatusCode::BAD_GATEWAY, b"<html>oops</html>");
        assert_eq!(msg, "Streaming chat completion failed: 502 Bad Gateway");
    }

    #[test]
    fn test_upstream_error_message_truncates() {
        let long = "é".repeat(400);
        let body = serde_json::to_vec(&serde_json::json!({ "error": { "message": long } })).unwrap();
        let msg = upstream_error_message(http::StatusCode::BAD_REQUEST, &body);
        assert!(msg.ends_with("..."));
        assert!(msg.len() <= 503);
    }
}
