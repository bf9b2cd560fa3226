//! Common types for chat requests.

use serde::{Deserialize, Serialize};

/// A message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<MessageContent>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Plain text, or an ordered list of parts for multimodal input.
///
/// Serializes exactly as the OpenAI chat-completions schema expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

impl From<Vec<ContentPart>> for MessageContent {
    fn from(parts: Vec<ContentPart>) -> Self {
        MessageContent::Parts(parts)
    }
}

/// One part of a multimodal message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image(url: impl Into<String>, detail: Option<ImageDetail>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: url.into(),
                detail,
            },
        }
    }
}

/// Remote URL or base64 data URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ImageDetail>,
}

/// Resolution hint, honoured only by providers that support it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    Auto,
    Low,
    High,
}

/// Per-call overrides. Absent fields fall back to provider defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    /// Sampling temperature in `[0, 2]`.
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub model: Option<String>,
}

impl ChatOptions {
    pub const DEFAULT_TEMPERATURE: f64 = 0.7;
    pub const DEFAULT_MAX_TOKENS: u32 = 2000;

    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Self::default()
        }
    }

    pub(crate) fn temperature_or_default(&self) -> f64 {
        self.temperature
            .map(|t| t.clamp(0.0, 2.0))
            .unwrap_or(Self::DEFAULT_TEMPERATURE)
    }

    pub(crate) fn max_tokens_or_default(&self) -> u32 {
        self.max_tokens
            .filter(|&n| n > 0)
            .unwrap_or(Self::DEFAULT_MAX_TOKENS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_message_serializes_as_string() {
        let msg = ChatMessage::user("Hello!");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"role": "user", "content": "Hello!"})
        );
    }

    #[test]
    fn multimodal_message_keeps_part_order() {
        let msg = ChatMessage::user(vec![
            ContentPart::text("what is this?"),
            ContentPart::image("data:image/png;base64,QQ==", Some(ImageDetail::Auto)),
        ]);
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "role": "user",
                "content": [
                    {"type": "text", "text": "what is this?"},
                    {
                        "type": "image_url",
                        "image_url": {"url": "data:image/png;base64,QQ==", "detail": "auto"}
                    }
                ]
            })
        );
    }

    #[test]
    fn image_detail_is_omitted_when_absent() {
        let part = ContentPart::image("https://example.com/cat.png", None);
        let json = serde_json::to_string(&part).unwrap();
        assert!(!json.contains("detail"));
    }

    #[test]
    fn deserializes_both_content_shapes() {
        let text: ChatMessage =
            serde_json::from_value(json!({"role": "assistant", "content": "hi"})).unwrap();
        assert_eq!(text.content, MessageContent::Text("hi".to_string()));

        let parts: ChatMessage = serde_json::from_value(json!({
            "role": "user",
            "content": [{"type": "text", "text": "a"}]
        }))
        .unwrap();
        assert_eq!(parts.content, MessageContent::Parts(vec![ContentPart::text("a")]));
    }

    #[test]
    fn option_defaults() {
        let options = ChatOptions::default();
        assert_eq!(options.temperature_or_default(), 0.7);
        assert_eq!(options.max_tokens_or_default(), 2000);

        let options = ChatOptions {
            temperature: Some(5.0),
            max_tokens: Some(0),
            model: None,
        };
        assert_eq!(options.temperature_or_default(), 2.0);
        assert_eq!(options.max_tokens_or_default(), 2000);
    }
}
