//! Connection settings for [`OpenRouter`](crate::OpenRouter).

use chatstream_types::ChatError;
use serde::Deserialize;

/// Default OpenRouter API base URL. The client appends `/v1/chat/completions`.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api";

/// Prefix every accepted key carries. OpenRouter keys start `sk-or-v1-`.
pub const API_KEY_PREFIX: &str = "sk-";

/// Check an API key's shape without contacting the server.
///
/// # Errors
///
/// Returns [`ChatError::Config`] if the key is blank or does not start with
/// `sk-`.
pub fn validate_api_key(api_key: &str) -> Result<(), ChatError> {
    let key = api_key.trim();
    if key.is_empty() {
        return Err(ChatError::Config("no API key configured".into()));
    }
    if !key.starts_with(API_KEY_PREFIX) {
        return Err(ChatError::Config(
            "API key is not in the expected format (sk-or-v1-...)".into(),
        ));
    }
    Ok(())
}

/// Connection settings, loadable from a JSON settings document.
///
/// Every field has a default, so `{}` is a valid document; unknown fields are
/// ignored so one settings file can carry both client and session settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Bearer token sent in the `Authorization` header.
    pub api_key: String,
    /// API base URL.
    pub base_url: String,
    /// Sent as `HTTP-Referer` when set.
    pub referer: Option<String>,
    /// Sent as `X-Title` when set.
    pub title: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.into(),
            referer: None,
            title: None,
        }
    }
}

impl ClientConfig {
    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Check the settings before any request is made.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] if the API key is ill-formed or the base
    /// URL is blank.
    pub fn validate(&self) -> Result<(), ChatError> {
        validate_api_key(&self.api_key)?;
        if self.base_url.trim().is_empty() {
            return Err(ChatError::Config("no base URL configured".into()));
        }
        Ok(())
    }
}
