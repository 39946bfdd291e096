//! Client-side transcript of a playground session.

use serde::Serialize;

use crate::error::PlaygroundError;
use crate::protocol::{ChatMessage, Role};
use crate::stream::ResponseMetrics;

/// A transcript entry as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayMessage {
    pub role: Role,
    pub content: String,
    /// Title of the model that produced an assistant message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ResponseMetrics>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl DisplayMessage {
    fn user(content: String) -> Self {
        Self {
            role: Role::User,
            content,
            model: None,
            metrics: None,
            is_error: false,
        }
    }

    fn placeholder(model_title: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            model: Some(model_title.to_string()),
            metrics: None,
            is_error: false,
        }
    }
}

/// Ordered transcript with at most one exchange in flight.
///
/// An open exchange ends with an assistant placeholder that streamed
/// content is appended to.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<DisplayMessage>,
    open: bool,
}

impl Conversation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> &[DisplayMessage] {
        &self.messages
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Append the user prompt and an empty assistant placeholder.
    ///
    /// Returns the history to send upstream: every message before the
    /// placeholder, reduced to role and content.
    ///
    /// # Errors
    ///
    /// [`PlaygroundError::InvalidRequest`] when the prompt is blank or an
    /// exchange is already open.
    pub fn begin_exchange(
        &mut self,
        prompt: &str,
        model_title: &str,
    ) -> Result<Vec<ChatMessage>, PlaygroundError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(PlaygroundError::InvalidRequest("Prompt is empty".to_string()));
        }
        if self.open {
            return Err(PlaygroundError::InvalidRequest(
                "A response is already in progress".to_string(),
            ));
        }

        self.messages.push(DisplayMessage::user(prompt.to_string()));
        let history = self
            .messages
            .iter()
            .map(|message| ChatMessage::new(message.role, message.content.clone()))
            .collect();
        self.messages.push(DisplayMessage::placeholder(model_title));
        self.open = true;
        Ok(history)
    }

    /// Append streamed content to the open placeholder. Ignored once the
    /// placeholder has been marked as an error.
    pub fn append_chunk(&mut self, content: &str) {
        if let Some(message) = self.open_placeholder() {
            message.content.push_str(content);
        }
    }

    /// Close the exchange, attaching metrics when there are any.
    pub fn complete(&mut self, metrics: Option<ResponseMetrics>) {
        if let Some(message) = self.open_placeholder() {
            message.metrics = metrics;
        }
        self.open = false;
    }

    /// Close the exchange, replacing the placeholder with an error message.
    pub fn fail(&mut self, error_message: &str) {
        if let Some(message) = self.open_placeholder() {
            message.content = error_message.to_string();
            message.is_error = true;
        }
        self.open = false;
    }

    /// Close the exchange keeping whatever content arrived, without metrics.
    pub fn close(&mut self) {
        self.open = false;
    }

    fn open_placeholder(&mut self) -> Option<&mut DisplayMessage> {
        if !self.open {
            return None;
        }
        self.messages
            .last_mut()
            .filter(|message| message.role == Role::Assistant && !message.is_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> ResponseMetrics {
        ResponseMetrics {
            ttft_ms: 100,
            response_time_ms: 1100,
            tps: 10.0,
        }
    }

    #[test]
    fn test_begin_exchange_returns_history_without_placeholder() {
        let mut conversation = Conversation::new();
        let history = conversation.begin_exchange("  Hello  ", "Qwen3").unwrap();
        assert_eq!(history, vec![ChatMessage::user("Hello")]);
        assert_eq!(conversation.messages().len(), 2);
        assert_eq!(conversation.messages()[1].model.as_deref(), Some("Qwen3"));
        assert!(conversation.is_open());
    }

    #[test]
    fn test_blank_prompt_and_concurrent_exchange_rejected() {
        let mut conversation = Conversation::new();
        assert!(conversation.begin_exchange("   ", "M").is_err());
        assert!(conversation.messages().is_empty());

        conversation.begin_exchange("one", "M").unwrap();
        let err = conversation.begin_exchange("two", "M").unwrap_err();
        assert!(matches!(err, PlaygroundError::InvalidRequest(_)));
        assert_eq!(conversation.messages().len(), 2);
    }

    #[test]
    fn test_stream_then_complete() {
        let mut conversation = Conversation::new();
        conversation.begin_exchange("hi", "M").unwrap();
        conversation.append_chunk("Hel");
        conversation.append_chunk("lo");
        conversation.complete(Some(metrics()));
        conversation.append_chunk("late");

        let reply = &conversation.messages()[1];
        assert_eq!(reply.content, "Hello");
        assert_eq!(reply.metrics, Some(metrics()));
        assert!(!conversation.is_open());
    }

    #[test]
    fn test_second_exchange_sends_full_history() {
        let mut conversation = Conversation::new();
        conversation.begin_exchange("hi", "M").unwrap();
        conversation.append_chunk("Hello!");
        conversation.complete(None);

        let history = conversation.begin_exchange("joke", "M").unwrap();
        assert_eq!(
            history,
            vec![
                ChatMessage::user("hi"),
                ChatMessage::assistant("Hello!"),
                ChatMessage::user("joke"),
            ]
        );
    }

    #[test]
    fn test_fail_replaces_placeholder() {
        let mut conversation = Conversation::new();
        conversation.begin_exchange("hi", "M").unwrap();
        conversation.append_chunk("partial");
        conversation.fail("HTTP error! status: 500");
        conversation.append_chunk("late");

        let reply = &conversation.messages()[1];
        assert_eq!(reply.content, "HTTP error! status: 500");
        assert!(reply.is_error);
        assert!(!conversation.is_open());
    }

    #[test]
    fn test_close_keeps_partial_content() {
        let mut conversation = Conversation::new();
        conversation.begin_exchange("hi", "M").unwrap();
        conversation.append_chunk("partial");
        conversation.close();

        let reply = &conversation.messages()[1];
        assert_eq!(reply.content, "partial");
        assert!(reply.metrics.is_none());
        assert!(!reply.is_error);
    }
}
