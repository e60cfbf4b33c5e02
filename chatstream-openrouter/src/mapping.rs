//! Request mapping from [`RequestContext`] to the chat-completions JSON body.
//!
//! Reference: <https://openrouter.ai/docs/api-reference/chat-completion>

use chatstream_types::{ChatMessage, RequestContext};
use serde::Serialize;

/// The streaming request body.
#[derive(Debug, Serialize)]
pub(crate) struct ApiRequest<'a> {
    /// Model identifier.
    pub model: &'a str,
    /// Conversation messages, already in wire shape.
    pub messages: &'a [ChatMessage],
    /// Always `true`; this client only streams.
    pub stream: bool,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Build the request body for one attempt.
#[must_use]
pub(crate) fn to_api_request(ctx: &RequestContext) -> ApiRequest<'_> {
    ApiRequest {
        model: &ctx.model,
        messages: &ctx.messages,
        stream: true,
        max_tokens: ctx.params.max_tokens,
        temperature: ctx.params.temperature,
    }
}
