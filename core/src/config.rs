//! Client configuration.
//!
//! The API key, the optional user token and the service endpoints travel
//! together in one `ClientConfig` that is handed to `ApiClient::new`. Nothing
//! is read from process-wide state.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Host used when no endpoint is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.flickr.com";

const REST_PATH: &str = "/services/rest/";
const UPLOAD_PATH: &str = "/services/upload/";
const REPLACE_PATH: &str = "/services/replace/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_key: String,

    /// Token of an authenticated user. Writes and uploads require it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    #[serde(default = "default_rest_endpoint")]
    pub rest_endpoint: String,

    #[serde(default = "default_upload_endpoint")]
    pub upload_endpoint: String,

    #[serde(default = "default_replace_endpoint")]
    pub replace_endpoint: String,
}

fn default_rest_endpoint() -> String {
    format!("{DEFAULT_BASE_URL}{REST_PATH}")
}

fn default_upload_endpoint() -> String {
    format!("{DEFAULT_BASE_URL}{UPLOAD_PATH}")
}

fn default_replace_endpoint() -> String {
    format!("{DEFAULT_BASE_URL}{REPLACE_PATH}")
}

impl ClientConfig {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            auth_token: None,
            rest_endpoint: default_rest_endpoint(),
            upload_endpoint: default_upload_endpoint(),
            replace_endpoint: default_replace_endpoint(),
        }
    }

    /// Load a configuration from JSON. Only `api_key` is required.
    pub fn from_json(raw: &str) -> Result<Self, ApiError> {
        let config: Self = serde_json::from_str(raw).map_err(|e| ApiError::Config(e.to_string()))?;
        if config.api_key.trim().is_empty() {
            return Err(ApiError::Config("api_key must not be empty".to_string()));
        }
        Ok(config)
    }

    pub fn with_auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    /// Point all three endpoints at `base_url`, keeping the standard paths.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.rest_endpoint = format!("{base}{REST_PATH}");
        self.upload_endpoint = format!("{base}{UPLOAD_PATH}");
        self.replace_endpoint = format!("{base}{REPLACE_PATH}");
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_token.as_deref().is_some_and(|token| !token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_default_endpoints() {
        let config = ClientConfig::new("key");
        assert_eq!(config.rest_endpoint, "https://api.flickr.com/services/rest/");
        assert_eq!(config.upload_endpoint, "https://api.flickr.com/services/upload/");
        assert_eq!(config.replace_endpoint, "https://api.flickr.com/services/replace/");
        assert!(!config.is_authenticated());
    }

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let config = ClientConfig::new("key").with_base_url("http://127.0.0.1:3000/");
        assert_eq!(config.rest_endpoint, "http://127.0.0.1:3000/services/rest/");
        assert_eq!(config.replace_endpoint, "http://127.0.0.1:3000/services/replace/");
    }

    #[test]
    fn from_json_fills_defaults() {
        let config = ClientConfig::from_json(r#"{"api_key":"abc","auth_token":"tok"}"#).unwrap();
        assert_eq!(config.api_key, "abc");
        assert!(config.is_authenticated());
        assert_eq!(config.upload_endpoint, "https://api.flickr.com/services/upload/");
    }

    #[test]
    fn from_json_rejects_missing_key() {
        let err = ClientConfig::from_json(r#"{"auth_token":"tok"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));

        let err = ClientConfig::from_json(r#"{"api_key":"  "}"#).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn empty_token_is_not_authenticated() {
        let config = ClientConfig::new("key").with_auth_token("");
        assert!(!config.is_authenticated());
    }
}
