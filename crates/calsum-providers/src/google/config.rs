//! Google Calendar provider configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// OAuth 2.0 client identity from the Google Cloud Console.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID.
    pub client_id: String,
    /// The OAuth 2.0 client secret.
    pub client_secret: String,
}

/// Structure of Google's client-secret JSON document.
///
/// Supports the Cloud Console format with an "installed" or "web" section,
/// as well as a flat format with the fields at the root level.
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<NestedCredentials>,
    web: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    /// Creates new OAuth credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Loads credentials from a client-secret JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            format!(
                "failed to read client secret file {:?}: {}",
                path.as_ref(),
                e
            )
        })?;
        Self::from_json(&content)
    }

    /// Parses credentials from a client-secret JSON string.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let file: ClientSecretFile = serde_json::from_str(json)
            .map_err(|e| format!("failed to parse client secret JSON: {}", e))?;

        if let Some(creds) = file.installed.or(file.web) {
            return Ok(Self::new(creds.client_id, creds.client_secret));
        }

        if let (Some(client_id), Some(client_secret)) = (file.client_id, file.client_secret) {
            return Ok(Self::new(client_id, client_secret));
        }

        Err("client secret JSON must contain an 'installed'/'web' section \
             or 'client_id'/'client_secret' at the root level"
            .to_string())
    }

    /// Validates that the credentials look usable.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// Configuration for the Google Calendar provider.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// OAuth client identity.
    pub credentials: OAuthCredentials,

    /// Path of the token cache file.
    pub token_path: PathBuf,

    /// Request timeout for token-endpoint and API calls.
    pub timeout: Duration,

    /// OAuth scopes to request.
    pub scopes: Vec<String>,
}

impl GoogleConfig {
    /// Default request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default token cache path, relative to the working directory.
    pub const DEFAULT_TOKEN_PATH: &'static str = "token.json";

    /// OAuth scope for read-only calendar access.
    pub const READONLY_SCOPE: &'static str = "https://www.googleapis.com/auth/calendar.readonly";

    /// Creates a configuration with read-only calendar scope and defaults.
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            token_path: PathBuf::from(Self::DEFAULT_TOKEN_PATH),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            scopes: vec![Self::READONLY_SCOPE.to_string()],
        }
    }

    /// Sets the token cache path.
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.credentials
            .validate()
            .map_err(|e| format!("invalid credentials: {}", e))?;

        if self.scopes.is_empty() {
            return Err("at least one OAuth scope is required".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_credentials() -> OAuthCredentials {
        OAuthCredentials::new("test-client.apps.googleusercontent.com", "test-secret")
    }

    #[test]
    fn credentials_validation() {
        assert!(test_credentials().validate().is_ok());
        assert!(OAuthCredentials::new("", "secret").validate().is_err());
        assert!(OAuthCredentials::new("id", "").validate().is_err());
    }

    #[test]
    fn credentials_from_json_installed() {
        let json = r#"{
            "installed": {
                "client_id": "test-id.apps.googleusercontent.com",
                "client_secret": "test-secret",
                "project_id": "my-project"
            }
        }"#;

        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "test-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "test-secret");
    }

    #[test]
    fn credentials_from_json_web() {
        let json = r#"{
            "web": {
                "client_id": "web-id.apps.googleusercontent.com",
                "client_secret": "web-secret"
            }
        }"#;

        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "web-id.apps.googleusercontent.com");
    }

    #[test]
    fn credentials_from_json_flat() {
        let json = r#"{
            "client_id": "flat-id.apps.googleusercontent.com",
            "client_secret": "flat-secret"
        }"#;

        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "flat-id.apps.googleusercontent.com");
    }

    #[test]
    fn credentials_from_json_invalid() {
        assert!(OAuthCredentials::from_json(r#"{ "other": {} }"#).is_err());
        assert!(OAuthCredentials::from_json("not json").is_err());
    }

    #[test]
    fn credentials_from_missing_file() {
        let result = OAuthCredentials::from_file("/nonexistent/credentials.json");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("failed to read"));
    }

    #[test]
    fn config_defaults() {
        let config = GoogleConfig::new(test_credentials());
        assert_eq!(config.token_path, PathBuf::from("token.json"));
        assert_eq!(config.scopes, vec![GoogleConfig::READONLY_SCOPE.to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_empty_scopes() {
        let mut config = GoogleConfig::new(test_credentials());
        config.scopes.clear();
        assert!(config.validate().is_err());
    }
}
