//! Core message and request types.
//!
//! The serde representation of these types is the chat-completions wire
//! format: `{"role": "user", "content": "..."}` or, for multimodal messages,
//! `{"role": "user", "content": [{"type": "text", ...}, {"type": "image_url", ...}]}`.

use serde::{Deserialize, Serialize};

/// The role of a message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the conversation.
    System,
    /// A human user.
    User,
    /// The model.
    Assistant,
}

/// How much detail the model should spend on an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    /// Let the upstream decide.
    Auto,
    /// Low-resolution pass.
    Low,
    /// High-resolution pass.
    High,
}

/// An image reference inside a content part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    /// An `https:` URL or a `data:` URI carrying base64 image bytes.
    pub url: String,
    /// Optional detail hint.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<ImageDetail>,
}

/// A single typed part of a multimodal message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },
    /// An image reference.
    ImageUrl {
        /// The image location and detail hint.
        image_url: ImageUrl,
    },
}

impl ContentPart {
    /// Build a text part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Build an image part with the given detail hint.
    #[must_use]
    pub fn image(url: impl Into<String>, detail: Option<ImageDetail>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl {
                url: url.into(),
                detail,
            },
        }
    }
}

/// Message content: a bare string or a list of typed parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content.
    Text(String),
    /// Multimodal content parts.
    Parts(Vec<ContentPart>),
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<ContentPart>> for MessageContent {
    fn from(parts: Vec<ContentPart>) -> Self {
        Self::Parts(parts)
    }
}

/// A message in a conversation.
///
/// Messages are immutable once built. The assistant reply that is still
/// streaming is not a `ChatMessage` yet; it only becomes one when the
/// session finalizes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message author.
    pub role: Role,
    /// The message content.
    pub content: MessageContent,
}

impl ChatMessage {
    /// Create a system message.
    ///
    /// # Example
    ///
    /// ```
    /// use chatstream_types::ChatMessage;
    /// let msg = ChatMessage::system("You are a helpful assistant.");
    /// ```
    #[must_use]
    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// The text of this message, with text parts concatenated and images
    /// skipped.
    #[must_use]
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect(),
        }
    }

    /// Whether the message carries at least one image part.
    #[must_use]
    pub fn has_images(&self) -> bool {
        matches!(&self.content, MessageContent::Parts(parts)
            if parts.iter().any(|p| matches!(p, ContentPart::ImageUrl { .. })))
    }
}

/// A file the user attached to a send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attachment {
    /// A text file, inlined into the prompt.
    Text {
        /// File name shown to the model.
        name: String,
        /// File contents.
        content: String,
    },
    /// An image, sent as an `image_url` part.
    Image {
        /// File name shown to the model.
        name: String,
        /// A `data:` URI (or any URL the upstream can fetch).
        data_url: String,
    },
}

impl Attachment {
    /// The attachment's file name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::Image { name, .. } => name,
        }
    }

    /// Whether this attachment is an image.
    #[must_use]
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }
}

/// Sampling parameters forwarded with every attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub temperature: Option<f64>,
}

/// Everything one attempt sends upstream.
///
/// A context is never mutated while its attempt runs. A retry builds a new
/// context through [`RequestContext::with_model`], keeping the history.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    /// Model identifier for this attempt.
    pub model: String,
    /// Ordered message history, system prompt first.
    pub messages: Vec<ChatMessage>,
    /// Generation parameters.
    pub params: GenerationParams,
}

impl RequestContext {
    /// Create a context with default generation parameters.
    #[must_use]
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            params: GenerationParams::default(),
        }
    }

    /// Set the generation parameters.
    #[must_use]
    pub fn params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// A copy of this context targeting a different model.
    #[must_use]
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: self.messages.clone(),
            params: self.params.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::System).unwrap(), json!("system"));
        assert_eq!(serde_json::to_value(Role::User).unwrap(), json!("user"));
        assert_eq!(
            serde_json::to_value(Role::Assistant).unwrap(),
            json!("assistant")
        );
    }

    #[test]
    fn text_message_serializes_as_string_content() {
        let msg = ChatMessage::user("hi");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"role": "user", "content": "hi"})
        );
    }

    #[test]
    fn multimodal_message_serializes_as_parts() {
        let msg = ChatMessage::user(vec![
            ContentPart::text("look"),
            ContentPart::image("data:image/png;base64,AAA", Some(ImageDetail::High)),
        ]);
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "role": "user",
                "content": [
                    {"type": "text", "text": "look"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAA", "detail": "high"}}
                ]
            })
        );
    }

    #[test]
    fn image_without_detail_omits_field() {
        let part = ContentPart::image("https://example.com/a.png", None);
        assert_eq!(
            serde_json::to_value(&part).unwrap(),
            json!({"type": "image_url", "image_url": {"url": "https://example.com/a.png"}})
        );
    }

    #[test]
    fn content_deserializes_from_either_shape() {
        let text: ChatMessage =
            serde_json::from_value(json!({"role": "assistant", "content": "ok"})).unwrap();
        assert_eq!(text.content, MessageContent::Text("ok".into()));

        let parts: ChatMessage = serde_json::from_value(
            json!({"role": "user", "content": [{"type": "text", "text": "a"}]}),
        )
        .unwrap();
        assert_eq!(
            parts.content,
            MessageContent::Parts(vec![ContentPart::text("a")])
        );
    }

    #[test]
    fn text_concatenates_parts_and_skips_images() {
        let msg = ChatMessage::user(vec![
            ContentPart::text("one "),
            ContentPart::image("https://example.com/x.png", None),
            ContentPart::text("two"),
        ]);
        assert_eq!(msg.text(), "one two");
        assert!(msg.has_images());
        assert!(!ChatMessage::user("plain").has_images());
    }

    #[test]
    fn with_model_keeps_history() {
        let ctx = RequestContext::new("m1", vec![ChatMessage::user("hi")]).params(
            GenerationParams {
                max_tokens: Some(10),
                temperature: None,
            },
        );
        let retry = ctx.with_model("m2");
        assert_eq!(retry.model, "m2");
        assert_eq!(retry.messages, ctx.messages);
        assert_eq!(retry.params, ctx.params);
        assert_eq!(ctx.model, "m1");
    }

    #[test]
    fn attachment_accessors() {
        let text = Attachment::Text {
            name: "notes.txt".into(),
            content: "hello".into(),
        };
        let image = Attachment::Image {
            name: "cat.png".into(),
            data_url: "data:image/png;base64,AAA".into(),
        };
        assert_eq!(text.name(), "notes.txt");
        assert!(!text.is_image());
        assert!(image.is_image());
    }
}
