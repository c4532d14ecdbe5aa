//! OAuth 2.0 client for Google's authorization and token endpoints.
//!
//! Implements the pieces the authorization flows need:
//!
//! - authorization URL construction with a PKCE challenge (RFC 7636)
//! - authorization-code exchange
//! - access-token refresh
//! - the device authorization grant (RFC 8628)
//!
//! The interactive flow here is terminal-based: the authorization code is
//! pasted into stdin, so the auth URL uses the out-of-band redirect URI
//! instead of a loopback listener.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

use super::config::OAuthCredentials;
use super::tokens::TokenInfo;

/// Google OAuth endpoints.
const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEVICE_CODE_URL: &str = "https://oauth2.googleapis.com/device/code";

/// Redirect URI for the copy/paste terminal flow.
const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// The PKCE code verifier length in bytes, before base64 encoding.
const CODE_VERIFIER_LENGTH: usize = 32;

/// OAuth client for Google APIs.
#[derive(Debug)]
pub struct OAuthClient {
    credentials: OAuthCredentials,
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Creates a new OAuth client with the given credentials.
    pub fn new(credentials: OAuthCredentials, timeout: Duration) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            credentials,
            http_client,
        })
    }

    /// Builds the authorization URL for the terminal flow.
    pub fn auth_url(&self, pkce: &PkceChallenge, scopes: &[String]) -> String {
        let scope = scopes.join(" ");
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            code_challenge={}&code_challenge_method=S256&\
            access_type=offline&prompt=consent",
            AUTH_URL,
            urlencoding::encode(&self.credentials.client_id),
            urlencoding::encode(OOB_REDIRECT_URI),
            urlencoding::encode(&scope),
            urlencoding::encode(&pkce.challenge),
        )
    }

    /// Exchanges an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        pkce: &PkceChallenge,
        scopes: &[String],
    ) -> ProviderResult<TokenInfo> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", code),
            ("code_verifier", pkce.verifier.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", OOB_REDIRECT_URI),
        ];

        let response = self.post_token_endpoint(TOKEN_URL, &params, "token exchange").await?;
        let token_response = Self::decode_token_response(response, "token exchange")?;

        info!("authorization code exchanged for tokens");
        Ok(TokenInfo::new(
            token_response.access_token,
            token_response.refresh_token,
            token_response.expires_in,
            scopes.to_vec(),
        ))
    }

    /// Refreshes an expired access token.
    ///
    /// Returns the new access token and its expiry in seconds.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> ProviderResult<(String, Option<i64>)> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self.post_token_endpoint(TOKEN_URL, &params, "token refresh").await?;
        let token_response = Self::decode_token_response(response, "token refresh")?;

        info!("access token refreshed");
        Ok((token_response.access_token, token_response.expires_in))
    }

    /// Starts a device authorization grant.
    pub async fn start_device_flow(&self, scopes: &[String]) -> ProviderResult<DeviceAuthorization> {
        let scope = scopes.join(" ");
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("scope", scope.as_str()),
        ];

        let body = self
            .post_token_endpoint(DEVICE_CODE_URL, &params, "device authorization")
            .await?;

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!(
                "invalid device authorization response: {}",
                e
            ))
        })
    }

    /// Polls the token endpoint until the device grant is approved.
    ///
    /// Blocks (asynchronously) for up to `expires_in` seconds. Respects the
    /// server-provided polling interval and `slow_down` responses.
    pub async fn poll_device_token(
        &self,
        device: &DeviceAuthorization,
        scopes: &[String],
    ) -> ProviderResult<TokenInfo> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("device_code", device.device_code.as_str()),
            ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
        ];

        let deadline = std::time::Instant::now() + Duration::from_secs(device.expires_in);
        let mut interval = Duration::from_secs(device.interval.max(1));

        while std::time::Instant::now() < deadline {
            tokio::time::sleep(interval).await;

            let response = self
                .http_client
                .post(TOKEN_URL)
                .form(&params)
                .send()
                .await
                .map_err(|e| {
                    ProviderError::network(format!("device token poll failed: {}", e))
                })?;

            let status = response.status();
            let body = response.text().await.map_err(|e| {
                ProviderError::network(format!("failed to read response: {}", e))
            })?;

            if status.is_success() {
                let token_response: TokenResponse =
                    serde_json::from_str(&body).map_err(|e| {
                        ProviderError::invalid_response(format!("invalid token response: {}", e))
                    })?;
                info!("device grant approved");
                return Ok(TokenInfo::new(
                    token_response.access_token,
                    token_response.refresh_token,
                    token_response.expires_in,
                    scopes.to_vec(),
                ));
            }

            let error: DeviceTokenError = serde_json::from_str(&body).unwrap_or_default();
            match error.error.as_str() {
                "authorization_pending" => {
                    debug!("device grant pending");
                }
                "slow_down" => {
                    interval += Duration::from_secs(5);
                    debug!(interval_secs = interval.as_secs(), "device poll slow down");
                }
                "access_denied" => {
                    return Err(ProviderError::authentication("device grant denied by user"));
                }
                _ => {
                    return Err(ProviderError::authentication(format!(
                        "device token poll failed ({}): {}",
                        status, body
                    )));
                }
            }
        }

        Err(ProviderError::authentication("device grant expired"))
    }

    async fn post_token_endpoint(
        &self,
        url: &str,
        params: &[(&str, &str)],
        operation: &str,
    ) -> ProviderResult<String> {
        let response = self
            .http_client
            .post(url)
            .form(params)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("{} request failed: {}", operation, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(ProviderError::authentication(format!(
                "{} failed ({}): {}",
                operation, status, body
            )));
        }

        Ok(body)
    }

    fn decode_token_response(body: String, operation: &str) -> ProviderResult<TokenResponse> {
        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("invalid {} response: {}", operation, e))
        })
    }
}

/// A PKCE verifier/challenge pair (RFC 7636).
#[derive(Debug)]
pub struct PkceChallenge {
    /// The code verifier (high-entropy random string).
    pub verifier: String,
    /// The code challenge (SHA-256 of the verifier, base64url encoded).
    pub challenge: String,
}

impl PkceChallenge {
    /// Creates a new challenge with a random verifier.
    pub fn new() -> Self {
        let verifier = Self::generate_verifier();
        let challenge = Self::compute_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }

    fn generate_verifier() -> String {
        let mut rng = rand::rng();
        let bytes: Vec<u8> = (0..CODE_VERIFIER_LENGTH).map(|_| rng.random()).collect();
        URL_SAFE_NO_PAD.encode(&bytes)
    }

    fn compute_challenge(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }
}

impl Default for PkceChallenge {
    fn default() -> Self {
        Self::new()
    }
}

/// Response from the device authorization endpoint.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DeviceAuthorization {
    /// Opaque code polled against the token endpoint.
    pub device_code: String,
    /// Short code the user types at the verification URL.
    pub user_code: String,
    /// Where the user goes to approve the grant.
    #[serde(alias = "verification_uri")]
    pub verification_url: String,
    /// Lifetime of the device code in seconds.
    pub expires_in: u64,
    /// Minimum polling interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub interval: u64,
}

fn default_poll_interval() -> u64 {
    5
}

/// Response from the token endpoint.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Error payload from the token endpoint during device polling.
#[derive(Debug, Default, serde::Deserialize)]
struct DeviceTokenError {
    #[serde(default)]
    error: String,
}
