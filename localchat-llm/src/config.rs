use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Base URL of the local OpenAI-compatible inference server.
pub const LOCAL_BASE_URL: &str = "http://localhost:8001/v1";

/// The local server does not authenticate; any bearer token is accepted.
pub const LOCAL_API_KEY: &str = "not-needed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
    pub api_key: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: LOCAL_BASE_URL.to_string(),
            api_key: LOCAL_API_KEY.to_string(),
        }
    }
}

impl EndpointConfig {
    pub fn new<S: Into<String>, K: Into<String>>(base_url: S, api_key: K) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Check that the base URL is an absolute http(s) URL
    pub fn validate(&self) -> Result<(), LlmError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| LlmError::Config(format!("invalid base url '{}': {}", self.base_url, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(LlmError::Config(format!("unsupported scheme '{}' in base url", scheme))),
        }
    }

    /// Base URL without a trailing slash, ready for path concatenation
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
