//! Playground client: drives the server's chat and models routes the way the
//! browser UI does, recording the transcript and per-exchange metrics.

use std::sync::Arc;

use http::{header, HeaderMap, HeaderValue, Method};
use serde::Serialize;

use crate::clock::Clock;
use crate::conversation::Conversation;
use crate::error::PlaygroundError;
use crate::protocol::{ChatMessage, ModelDescriptor};
use crate::stream::{process_stream, ExchangeMetrics, ResponseMetrics, StreamError, StreamHandler};
use crate::transport::HttpTransport;

/// How one submitted exchange ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome {
    /// The stream completed; metrics are `None` when no content arrived.
    Completed(Option<ResponseMetrics>),
    /// The request failed before streaming; the placeholder holds the message.
    Failed(String),
    /// The byte stream broke mid-response; partial content was kept.
    Interrupted(String),
}

#[derive(Serialize)]
struct ChatPayload<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

pub struct PlaygroundClient {
    transport: HttpTransport,
    base_url: String,
    clock: Arc<dyn Clock>,
}

impl PlaygroundClient {
    #[must_use]
    pub fn new(base_url: &str, transport: HttpTransport, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            clock,
        }
    }

    /// Fetch the model list from the server.
    ///
    /// # Errors
    ///
    /// [`PlaygroundError::Upstream`] with `"Failed to fetch models: <reason>"`
    /// on a non-success status, or a transport/decoding error.
    pub async fn fetch_models(&self) -> Result<Vec<ModelDescriptor>, PlaygroundError> {
        let url = format!("{}/api/models", self.base_url);
        let response = self
            .transport
            .send_request(&url, Method::GET, HeaderMap::new(), None)
            .await?;
        let status = response.status();
        if !status.is_success() {
            let err = PlaygroundError::Upstream {
                status: status.as_u16(),
                message: format!(
                    "Failed to fetch models: {}",
                    status.canonical_reason().unwrap_or_default()
                ),
            };
            tracing::error!(error = %err, "failed to fetch models");
            return Err(err);
        }
        response
            .json()
            .await
            .map_err(|err| PlaygroundError::Internal(format!("Invalid models response: {err}")))
    }

    /// Submit `prompt` to `model` and stream the reply into `conversation`.
    ///
    /// # Errors
    ///
    /// Only when the exchange cannot start (blank prompt, or an exchange
    /// already open). Request and stream failures are reported through the
    /// returned [`ExchangeOutcome`] and the conversation.
    pub async fn submit(
        &self,
        conversation: &mut Conversation,
        model: &ModelDescriptor,
        prompt: &str,
    ) -> Result<ExchangeOutcome, PlaygroundError> {
        let metrics = ExchangeMetrics::start(self.clock.now_millis());
        let history = conversation.begin_exchange(prompt, &model.title)?;

        let response = match self.post_chat(&model.name, &history).await {
            Ok(response) => response,
            Err(err) => {
                let message = err.public_message();
                tracing::error!(error = %message, "chat submission error");
                conversation.fail(&message);
                return Ok(ExchangeOutcome::Failed(message));
            }
        };

        let mut handler = ExchangeHandler {
            conversation,
            metrics,
            clock: self.clock.as_ref(),
            outcome: None,
        };
        process_stream(response.bytes_stream(), &mut handler).await;

        let outcome = match handler.outcome {
            Some(outcome) => outcome,
            None => {
                handler.conversation.close();
                ExchangeOutcome::Completed(None)
            }
        };
        Ok(outcome)
    }

    async fn post_chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<reqwest::Response, PlaygroundError> {
        let body = serde_json::to_vec(&ChatPayload { model, messages })
            .map_err(|err| PlaygroundError::Internal(err.to_string()))?;
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .transport
            .send_request(&url, Method::POST, headers, Some(body.into()))
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PlaygroundError::Upstream {
                status: status.as_u16(),
                message: format!("HTTP error! status: {}", status.as_u16()),
            });
        }
        Ok(response)
    }
}

struct ExchangeHandler<'a> {
    conversation: &'a mut Conversation,
    metrics: ExchangeMetrics,
    clock: &'a dyn Clock,
    outcome: Option<ExchangeOutcome>,
}

impl StreamHandler for ExchangeHandler<'_> {
    fn on_chunk(&mut self, content: &str) {
        self.metrics.record_chunk(content, self.clock.now_millis());
        self.conversation.append_chunk(content);
    }

    fn on_error(&mut self, error: &StreamError) {
        if error.is_fatal() {
            self.conversation.close();
            self.outcome = Some(ExchangeOutcome::Interrupted(error.to_string()));
        }
    }

    fn on_complete(&mut self) {
        let metrics = self.metrics.finish(self.clock.now_millis());
        if let Some(metrics) = &metrics {
            tracing::debug!(%metrics, "exchange complete");
        }
        self.conversation.complete(metrics);
        self.outcome = Some(ExchangeOutcome::Completed(metrics));
    }
}
