use serde_json::Value;

/// Content carried by the first choice of one streamed completion payload.
///
/// Two upstream shapes are accepted, checked in this order:
/// completions (`choices[0].text`) then chat completions
/// (`choices[0].delta.content`). Empty strings fall through to the next shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceDelta<'a> {
    Text(&'a str),
    ChatContent(&'a str),
    Empty,
}

impl<'a> ChoiceDelta<'a> {
    #[must_use]
    pub fn decode(payload: &'a Value) -> Self {
        let Some(choice) = payload
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
        else {
            return Self::Empty;
        };

        if let Some(text) = non_empty_str(choice.get("text")) {
            return Self::Text(text);
        }
        if let Some(content) = non_empty_str(choice.get("delta").and_then(|d| d.get("content"))) {
            return Self::ChatContent(content);
        }
        Self::Empty
    }

    #[must_use]
    pub fn content(self) -> Option<&'a str> {
        match self {
            Self::Text(text) | Self::ChatContent(text) => Some(text),
            Self::Empty => None,
        }
    }
}

#[inline]
fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}
