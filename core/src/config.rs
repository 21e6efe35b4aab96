//! Client configuration.
//!
//! The API key comes from the caller or, failing that, from `MOCHI_API_KEY`.
//! An empty string counts as absent. Resolution happens once, when the client
//! is built, so a missing key fails before any request is made.

use crate::error::{MochiError, Result};

/// Default deployment of the Mochi API.
pub const DEFAULT_BASE_URL: &str = "https://api.mochi.cards/api";

/// Environment variable consulted when no key is passed explicitly.
pub const API_KEY_ENV: &str = "MOCHI_API_KEY";

/// Settings used to build a `MochiClient`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Explicit API key; takes precedence over the environment.
    pub api_key: Option<String>,

    /// Base address, e.g. a mock server in tests.
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Resolve the API key from this config or the process environment.
    pub fn resolve_api_key(&self) -> Result<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    /// Resolve the API key using `lookup` in place of the process environment.
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Result<String>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let key = match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => Some(key.to_string()),
            _ => lookup(API_KEY_ENV).filter(|key| !key.is_empty()),
        };
        key.ok_or_else(|| {
            MochiError::Configuration(format!(
                "API key must be provided either explicitly or via the {API_KEY_ENV} environment variable"
            ))
        })
    }
}
