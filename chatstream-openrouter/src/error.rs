//! Mapping of HTTP/reqwest failures to [`ChatError`].
//!
//! The classification happens here, once, while the status and body are at
//! hand. Callers match on [`HttpErrorClass`] instead of scanning messages.

use chatstream_types::{ChatError, HttpErrorClass};
use serde::Deserialize;

/// Error body shapes seen in the wild: `{"error": {...}}`, or a bare
/// `{"message": ...}` / `{"detail": ...}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<ErrorObject>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorObject {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Stringify an error code that may arrive as a number or a string.
pub(crate) fn code_to_string(code: &serde_json::Value) -> Option<String> {
    match code {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Map a non-success status and its body to a classified [`ChatError::Http`].
///
/// A recognized `error.code` in the body wins over the status code; the
/// status decides otherwise.
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> ChatError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let code = parsed
        .error
        .as_ref()
        .and_then(|e| e.code.as_ref())
        .and_then(code_to_string);
    let class = code
        .as_deref()
        .and_then(HttpErrorClass::from_code)
        .unwrap_or_else(|| HttpErrorClass::from_status(status.as_u16()));

    let message = parsed
        .error
        .and_then(|e| e.message)
        .or(parsed.message)
        .or(parsed.detail)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("no response body")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });

    ChatError::Http {
        status: status.as_u16(),
        class,
        message,
        raw: body.to_string(),
    }
}

/// Map a [`reqwest::Error`] to a [`ChatError::Network`].
///
/// Timeouts and connect failures are transient; body and decode failures are
/// not.
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ChatError {
    #[cfg(not(target_arch = "wasm32"))]
    let transient = err.is_timeout() || err.is_connect();
    #[cfg(target_arch = "wasm32")]
    let transient = err.is_timeout();

    ChatError::network(err.to_string(), transient)
}
