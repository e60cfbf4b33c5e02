//! Error taxonomy shared by the provider and session crates.
//!
//! HTTP failures are classified once, where the response is inspected, into an
//! [`HttpErrorClass`]. Everything downstream matches on the class; nothing
//! re-derives it from message text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sub-classification of a non-success upstream response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HttpErrorClass {
    /// The API key is missing, invalid, or expired.
    Auth,
    /// The account has no credit left.
    QuotaExceeded,
    /// Too many requests for this model or key.
    RateLimited,
    /// The model does not exist or is temporarily offline.
    ModelUnavailable,
    /// Anything else.
    Unknown,
}

impl HttpErrorClass {
    /// Classify by HTTP status code alone.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Auth,
            402 => Self::QuotaExceeded,
            429 => Self::RateLimited,
            404 | 502 | 503 => Self::ModelUnavailable,
            _ => Self::Unknown,
        }
    }

    /// Classify by the upstream's error code (`error.code` in the JSON body
    /// or in an in-stream error object). Returns `None` for codes that say
    /// nothing about the class.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "invalid_api_key" | "401" | "403" => Some(Self::Auth),
            "insufficient_quota" | "402" => Some(Self::QuotaExceeded),
            "rate_limit_exceeded" | "429" => Some(Self::RateLimited),
            "model_not_found" | "404" | "502" | "503" => Some(Self::ModelUnavailable),
            _ => None,
        }
    }

    /// Whether switching to another model may help.
    #[must_use]
    pub fn is_fallback_eligible(self) -> bool {
        matches!(self, Self::RateLimited | Self::ModelUnavailable)
    }
}

impl fmt::Display for HttpErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Auth => "authentication error",
            Self::QuotaExceeded => "quota exceeded",
            Self::RateLimited => "rate limited",
            Self::ModelUnavailable => "model unavailable",
            Self::Unknown => "unknown upstream error",
        };
        f.write_str(label)
    }
}

/// Errors that end a single attempt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChatError {
    /// The request could not be sent or the body could not be read.
    #[error("network error: {message}")]
    Network {
        /// What went wrong.
        message: String,
        /// Connect failures and timeouts; another attempt may succeed.
        transient: bool,
    },

    /// The upstream answered with a non-success status.
    #[error("HTTP {status} ({class}): {message}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// Classification decided from the status and body.
        class: HttpErrorClass,
        /// The upstream's human-readable message, if it sent one.
        message: String,
        /// The raw response body.
        raw: String,
    },

    /// The upstream sent an error object inside the event stream.
    #[error("upstream error ({class}): {message}")]
    Upstream {
        /// Classification decided from the error code.
        class: HttpErrorClass,
        /// The upstream's message.
        message: String,
        /// The raw event payload.
        raw: String,
    },

    /// Too many consecutive frames failed to parse.
    #[error("stream corrupted: {consecutive} consecutive malformed frames")]
    StreamCorrupted {
        /// How many malformed frames arrived in a row.
        consecutive: usize,
    },

    /// A line grew past the limit without a newline.
    #[error("stream corrupted: line exceeds {limit} bytes without a newline")]
    LineTooLong {
        /// The line-length limit in bytes.
        limit: usize,
    },

    /// The request was rejected before any network activity.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ChatError {
    /// Build a [`ChatError::Network`].
    #[must_use]
    pub fn network(message: impl Into<String>, transient: bool) -> Self {
        Self::Network {
            message: message.into(),
            transient,
        }
    }

    /// The upstream classification, for HTTP and in-stream errors.
    #[must_use]
    pub fn http_class(&self) -> Option<HttpErrorClass> {
        match self {
            Self::Http { class, .. } | Self::Upstream { class, .. } => Some(*class),
            _ => None,
        }
    }

    /// Whether the orchestrator may retry this failure with the next model.
    ///
    /// Rate limits and unavailable models qualify, as do transient network
    /// failures. The orchestrator additionally refuses to retry once any
    /// delta has been rendered.
    #[must_use]
    pub fn is_fallback_eligible(&self) -> bool {
        match self {
            Self::Http { class, .. } | Self::Upstream { class, .. } => {
                class.is_fallback_eligible()
            }
            Self::Network { transient, .. } => *transient,
            Self::StreamCorrupted { .. } | Self::LineTooLong { .. } | Self::Config(_) => false,
        }
    }

    /// The raw diagnostic text for this error: the response body or event
    /// payload when there is one, the message otherwise.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Http { raw, .. } | Self::Upstream { raw, .. } if !raw.is_empty() => raw.clone(),
            other => other.to_string(),
        }
    }
}
