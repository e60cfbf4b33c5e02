//! The error surfaced to the caller when a send gives up.

use std::fmt;

use chatstream_types::{ChatError, HttpErrorClass};

/// Diagnostic text longer than this many characters is cut.
pub const DIAGNOSTIC_LIMIT: usize = 300;

/// A send that failed for good.
///
/// `Display` renders the classified error, the remediation hint, and the
/// truncated diagnostic on separate lines.
#[derive(Debug, Clone, PartialEq)]
pub struct SendError {
    /// The error of the last attempt.
    pub error: ChatError,
    /// The model the last attempt used. Empty if no attempt was made.
    pub model: String,
    /// Attempts made, `0` when validation failed.
    pub attempts: usize,
    /// Text rendered before a mid-stream failure.
    pub partial: String,
    diagnostic: String,
}

impl SendError {
    pub(crate) fn new(error: ChatError, model: impl Into<String>, attempts: usize) -> Self {
        let diagnostic = truncate_diagnostic(&error.diagnostic());
        Self {
            error,
            model: model.into(),
            attempts,
            partial: String::new(),
            diagnostic,
        }
    }

    pub(crate) fn with_partial(mut self, partial: String) -> Self {
        self.partial = partial;
        self
    }

    /// The upstream classification, if the failure came from the upstream.
    #[must_use]
    pub fn class(&self) -> Option<HttpErrorClass> {
        self.error.http_class()
    }

    /// What the user can do about it.
    #[must_use]
    pub fn hint(&self) -> &'static str {
        match &self.error {
            ChatError::Http { class, .. } | ChatError::Upstream { class, .. } => match class {
                HttpErrorClass::Auth => {
                    "Check your API key at openrouter.ai; it should start with \"sk-or-v1-\". Generate a new one if needed."
                }
                HttpErrorClass::QuotaExceeded => {
                    "Add credits to your OpenRouter account or switch to a free model."
                }
                HttpErrorClass::RateLimited => {
                    "Wait a minute or two before retrying, or pick a less busy model."
                }
                HttpErrorClass::ModelUnavailable => {
                    "Pick another model; this one may not exist or may be temporarily offline."
                }
                HttpErrorClass::Unknown => {
                    "Try again in a few seconds; if it persists, switch models and check your API key."
                }
            },
            ChatError::Network { .. } => {
                "Check your internet connection and any VPN or proxy, then try again."
            }
            ChatError::StreamCorrupted { .. } | ChatError::LineTooLong { .. } => {
                "The reply stream was garbled; try again or switch models."
            }
            ChatError::Config(_) => "Fix the settings (API key and model) and try again.",
        }
    }

    /// The raw diagnostic text, cut to [`DIAGNOSTIC_LIMIT`] characters.
    #[must_use]
    pub fn diagnostic(&self) -> &str {
        &self.diagnostic
    }
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if !self.model.is_empty() {
            write!(f, " (model {}, attempt {})", self.model, self.attempts)?;
        }
        write!(f, "\nhint: {}\ndiagnostic: {}", self.hint(), self.diagnostic)
    }
}

impl std::error::Error for SendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Cut `text` to [`DIAGNOSTIC_LIMIT`] characters, appending `...` when cut.
pub(crate) fn truncate_diagnostic(text: &str) -> String {
    match text.char_indices().nth(DIAGNOSTIC_LIMIT) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
