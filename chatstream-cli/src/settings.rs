use std::path::{Path, PathBuf};

use chatstream_openrouter::ClientConfig;
use chatstream_session::SessionConfig;

use crate::CliError;
use crate::args::CliArgs;

/// Settings file read from the working directory when `--settings` is not
/// given.
pub const DEFAULT_SETTINGS_FILE: &str = "chatstream.json";

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
/// Environment variable overriding the primary model.
pub const ENV_MODEL: &str = "CHATSTREAM_MODEL";
/// Environment variable overriding the API base URL.
pub const ENV_BASE_URL: &str = "CHATSTREAM_BASE_URL";

/// Client and session settings.
///
/// Both halves read the same flat JSON document, each ignoring the other's
/// fields. Later layers win: file, then environment, then flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// Connection settings.
    pub client: ClientConfig,
    /// Model and prompt settings.
    pub session: SessionConfig,
}

impl Settings {
    /// Parse a settings document.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Settings`] if the document is not valid JSON or a
    /// field has the wrong type.
    pub fn from_json(text: &str) -> Result<Self, CliError> {
        Ok(Self {
            client: serde_json::from_str(text)?,
            session: serde_json::from_str(text)?,
        })
    }

    /// Read a settings file.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Io`] if the file cannot be read, or
    /// [`CliError::Settings`] if it does not parse.
    pub fn from_path(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Read `path`, or [`DEFAULT_SETTINGS_FILE`] if it exists, or fall back
    /// to defaults.
    ///
    /// # Errors
    ///
    /// Same as [`from_path`](Self::from_path).
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        if let Some(path) = path {
            return Self::from_path(path);
        }
        let default_path = PathBuf::from(DEFAULT_SETTINGS_FILE);
        if default_path.exists() {
            tracing::debug!(path = %default_path.display(), "loading settings");
            Self::from_path(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment overrides. Blank values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = var(ENV_API_KEY) {
            self.client.api_key = key;
        }
        if let Some(model) = var(ENV_MODEL) {
            self.session.model = model;
        }
        if let Some(url) = var(ENV_BASE_URL) {
            self.client.base_url = url;
        }
    }

    /// Apply command-line overrides.
    pub fn apply_args(&mut self, args: &CliArgs) {
        if let Some(model) = &args.model {
            self.session.model.clone_from(model);
        }
        if !args.fallback_models.is_empty() {
            self.session.fallback_models.clone_from(&args.fallback_models);
        }
        if args.no_fallback {
            self.session.fallback_models.clear();
        }
        if let Some(url) = &args.base_url {
            self.client.base_url.clone_from(url);
        }
    }
}
