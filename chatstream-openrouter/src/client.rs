//! OpenRouter client struct, builder, and [`Provider`] implementation.

use std::future::Future;

use chatstream_types::{ByteStream, ChatError, Provider, RequestContext, WasmCompatSend};
use futures::TryStreamExt;

use crate::config::{ClientConfig, DEFAULT_BASE_URL, validate_api_key};
use crate::error::{map_http_status, map_reqwest_error};
use crate::mapping::to_api_request;

/// Client for OpenRouter's chat-completions endpoint (or any
/// OpenAI-compatible server).
///
/// Implements [`Provider`] for use anywhere a provider is accepted.
///
/// # Example
///
/// ```no_run
/// use chatstream_openrouter::OpenRouter;
///
/// let client = OpenRouter::new("sk-or-v1-...")
///     .base_url("https://openrouter.ai/api")
///     .referer("https://example.com")
///     .title("My Chat App");
/// ```
#[derive(Debug, Clone)]
pub struct OpenRouter {
    pub(crate) api_key: String,
    /// API base URL (override for testing or proxies).
    pub(crate) base_url: String,
    pub(crate) referer: Option<String>,
    pub(crate) title: Option<String>,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
}

impl OpenRouter {
    /// Create a new client with the given API key.
    ///
    /// Surrounding whitespace is stripped from the key, so the key that is
    /// validated is the key that is sent. Default base URL:
    /// `https://openrouter.ai/api`.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: trim_key(api_key.into()),
            base_url: DEFAULT_BASE_URL.into(),
            referer: None,
            title: None,
            client: reqwest::Client::new(),
        }
    }

    /// Build a client from a [`ClientConfig`].
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            api_key: trim_key(config.api_key.clone()),
            base_url: config.base_url.clone(),
            referer: config.referer.clone(),
            title: config.title.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the API base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the `HTTP-Referer` attribution header.
    #[must_use]
    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Set the `X-Title` attribution header.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Build the chat completions endpoint URL.
    pub(crate) fn completions_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        )
    }
}

fn trim_key(key: String) -> String {
    let trimmed = key.trim();
    if trimmed.len() == key.len() {
        key
    } else {
        trimmed.to_string()
    }
}

impl Provider for OpenRouter {
    /// Send a streaming chat-completions request.
    ///
    /// An ill-formed API key or a blank model fails with
    /// [`ChatError::Config`] before anything is sent. A non-success status is
    /// classified here, with the body in hand. On success the response body
    /// is handed back undecoded; dropping the stream releases the connection.
    fn open_stream(
        &self,
        request: &RequestContext,
    ) -> impl Future<Output = Result<ByteStream, ChatError>> + WasmCompatSend {
        let url = self.completions_url();
        let model = request.model.clone();
        let preflight = validate_api_key(&self.api_key).and_then(|()| {
            if model.trim().is_empty() {
                Err(ChatError::Config("no model given for the request".into()))
            } else {
                Ok(())
            }
        });

        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&to_api_request(request));
        if let Some(referer) = &self.referer {
            builder = builder.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.title {
            builder = builder.header("X-Title", title);
        }

        async move {
            preflight?;
            tracing::debug!(url = %url, model = %model, "sending streaming completion request to OpenRouter");

            let response = builder.send().await.map_err(map_reqwest_error)?;

            let status = response.status();
            if !status.is_success() {
                // The status alone still classifies the failure.
                let body_text = response.text().await.unwrap_or_else(|e| {
                    tracing::debug!(status = %status, error = %e, "failed to read error response body");
                    String::new()
                });
                return Err(map_http_status(status, &body_text));
            }

            let stream: ByteStream = Box::pin(response.bytes_stream().map_err(map_reqwest_error));
            Ok(stream)
        }
    }
}
