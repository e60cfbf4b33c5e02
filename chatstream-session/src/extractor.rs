//! Delta extractor: one event payload in, one [`StreamEvent`] out.
//!
//! Reference: <https://openrouter.ai/docs/api-reference/streaming>

use chatstream_types::StreamEvent;
use serde::Deserialize;

/// The subset of a streamed chat-completion chunk this crate reads.
#[derive(Debug, Deserialize)]
struct Chunk {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ErrorObject>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Extract the text fragment from one payload.
///
/// - `choices[0].delta.content` as a string becomes [`StreamEvent::Delta`],
///   possibly empty.
/// - An `error` object becomes [`StreamEvent::UpstreamError`].
/// - Invalid JSON, or a chunk without a content string, becomes
///   [`StreamEvent::Malformed`]. Never fails.
#[must_use]
pub fn extract_delta(payload: &str) -> StreamEvent {
    let chunk: Chunk = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::warn!(error = %e, payload = %payload, "skipping unparseable stream frame");
            return StreamEvent::Malformed(payload.to_string());
        }
    };

    if let Some(error) = chunk.error {
        let code = error.code.as_ref().and_then(|c| match c {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        return StreamEvent::UpstreamError {
            code,
            message: error
                .message
                .unwrap_or_else(|| "upstream reported an error".into()),
            raw: payload.to_string(),
        };
    }

    match chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta)
        .and_then(|d| d.content)
    {
        Some(content) => StreamEvent::Delta(content),
        None => {
            tracing::debug!(payload = %payload, "stream frame carries no content");
            StreamEvent::Malformed(payload.to_string())
        }
    }
}
