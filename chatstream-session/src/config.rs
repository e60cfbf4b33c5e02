//! Configuration types for chat sessions and sends.

use chatstream_types::ChatError;
use serde::Deserialize;

/// Model used when the settings name none.
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.1-405b-instruct:free";

/// Model substituted on the first attempt when images are attached.
pub const DEFAULT_VISION_MODEL: &str = "meta-llama/llama-3.2-90b-vision-instruct:free";

/// System prompt used when the settings name none.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Longest line accepted from the event stream, in bytes.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Free-tier models tried, in order, after a rate limit or unavailable model.
pub const DEFAULT_FALLBACK_MODELS: [&str; 6] = [
    "meta-llama/llama-3.2-3b-instruct:free",
    "meta-llama/llama-3.2-1b-instruct:free",
    "microsoft/phi-3-mini-128k-instruct:free",
    "google/gemma-2-9b-it:free",
    "huggingface/zephyr-7b-beta:free",
    "openchat/openchat-7b:free",
];

/// Configuration for [`Orchestrator`](crate::Orchestrator) and
/// [`StreamSession`](crate::StreamSession).
///
/// Deserializes from a JSON settings document; missing fields take their
/// defaults and unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Primary model identifier.
    pub model: String,
    /// Models tried after the primary, in list order.
    pub fallback_models: Vec<String>,
    /// Cap on attempts per send, primary included. `None` means one attempt
    /// per model. Never raised past the model list.
    pub max_attempts: Option<usize>,
    /// Model used for the first attempt when images are attached.
    pub vision_model: Option<String>,
    /// Prepended to every request as a system message.
    pub system_prompt: String,
    /// How many recent conversation messages are sent with each request.
    pub memory_length: usize,
    /// `max_tokens` for text-only sends.
    pub max_tokens: u32,
    /// `max_tokens` when images are attached.
    pub max_tokens_with_images: u32,
    /// Sampling temperature, if any.
    pub temperature: Option<f64>,
    /// Consecutive malformed frames tolerated before the stream is treated
    /// as corrupted. `0` disables the cap.
    pub max_consecutive_malformed: usize,
    /// Bytes buffered without a newline before the stream is treated as
    /// corrupted. `0` disables the cap.
    pub max_line_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            fallback_models: DEFAULT_FALLBACK_MODELS.iter().map(|m| (*m).to_string()).collect(),
            max_attempts: None,
            vision_model: Some(DEFAULT_VISION_MODEL.into()),
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            memory_length: 20,
            max_tokens: 2000,
            max_tokens_with_images: 4000,
            temperature: None,
            max_consecutive_malformed: 32,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

impl SessionConfig {
    /// Set the primary model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Replace the fallback list.
    #[must_use]
    pub fn with_fallback_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_models = models.into_iter().map(Into::into).collect();
        self
    }

    /// Cap the number of attempts per send.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Set or clear the vision model.
    #[must_use]
    pub fn with_vision_model(mut self, model: Option<String>) -> Self {
        self.vision_model = model;
        self
    }

    /// Set the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the memory window.
    #[must_use]
    pub fn with_memory_length(mut self, memory_length: usize) -> Self {
        self.memory_length = memory_length;
        self
    }

    /// Set the malformed-frame cap.
    #[must_use]
    pub fn with_max_consecutive_malformed(mut self, cap: usize) -> Self {
        self.max_consecutive_malformed = cap;
        self
    }

    /// Set the line-length cap.
    #[must_use]
    pub fn with_max_line_bytes(mut self, cap: usize) -> Self {
        self.max_line_bytes = cap;
        self
    }

    /// Check the settings before any request is made.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] if the primary model, the vision model,
    /// or a fallback entry is blank, or `max_attempts` is zero.
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.model.trim().is_empty() {
            return Err(ChatError::Config("no model configured".into()));
        }
        if self.vision_model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(ChatError::Config("vision model is blank; remove it or name a model".into()));
        }
        if self.fallback_models.iter().any(|m| m.trim().is_empty()) {
            return Err(ChatError::Config("fallback model list has a blank entry".into()));
        }
        if self.max_attempts == Some(0) {
            return Err(ChatError::Config("max_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_free_tier_setup() {
        let config = SessionConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.fallback_models.len(), 6);
        assert_eq!(config.fallback_models[0], "meta-llama/llama-3.2-3b-instruct:free");
        assert_eq!(config.memory_length, 20);
        assert_eq!(config.max_tokens, 2000);
        assert_eq!(config.max_tokens_with_images, 4000);
        assert_eq!(config.max_consecutive_malformed, 32);
        assert_eq!(config.max_line_bytes, DEFAULT_MAX_LINE_BYTES);
        assert_eq!(config.vision_model.as_deref(), Some(DEFAULT_VISION_MODEL));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn settings_document_with_defaults() {
        let config: SessionConfig = serde_json::from_str(
            r#"{"model":"m1","fallback_models":["m2","m3"],"memory_length":4,"api_key":"ignored"}"#,
        )
        .unwrap();
        assert_eq!(config.model, "m1");
        assert_eq!(config.fallback_models, vec!["m2", "m3"]);
        assert_eq!(config.memory_length, 4);
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.max_tokens, 2000);
    }

    #[test]
    fn null_vision_model_disables_override() {
        let config: SessionConfig = serde_json::from_str(r#"{"vision_model":null}"#).unwrap();
        assert!(config.vision_model.is_none());
    }

    #[test]
    fn blank_model_is_rejected() {
        let err = SessionConfig::default().with_model("  ").validate().unwrap_err();
        assert!(matches!(err, ChatError::Config(_)));
    }

    #[test]
    fn blank_vision_model_is_rejected() {
        let err = SessionConfig::default()
            .with_vision_model(Some(" ".into()))
            .validate()
            .unwrap_err();
        assert!(matches!(err, ChatError::Config(ref m) if m.contains("vision")));

        let from_settings: SessionConfig =
            serde_json::from_str(r#"{"vision_model":""}"#).unwrap();
        assert!(from_settings.validate().is_err());
        assert!(
            SessionConfig::default()
                .with_vision_model(None)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn blank_fallback_is_rejected() {
        let err = SessionConfig::default()
            .with_fallback_models(["m2", ""])
            .validate()
            .unwrap_err();
        assert!(matches!(err, ChatError::Config(_)));
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let err = SessionConfig::default()
            .with_max_attempts(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ChatError::Config(_)));
    }
}
