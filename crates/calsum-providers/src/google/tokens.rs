//! OAuth token storage.
//!
//! The token cache is an explicitly owned, lock-guarded in-memory holder
//! backed by a single JSON file. It is lazily populated once at startup,
//! refreshed under the provider's expiry rules, and persisted on change.
//!
//! Single-writer discipline: only the startup bootstrap and the token
//! refresh path write; both go through [`TokenStorage::set`] or
//! [`TokenStorage::update_access_token`], which hold the write lock while
//! replacing the file atomically.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

/// An OAuth token set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    /// The access token for API requests.
    pub access_token: String,

    /// The refresh token for obtaining new access tokens.
    pub refresh_token: Option<String>,

    /// When the access token expires.
    pub expires_at: Option<DateTime<Utc>>,

    /// The OAuth scopes that were granted.
    pub scopes: Vec<String>,
}

impl TokenInfo {
    /// Refresh-before-expiry safety margin in seconds.
    const EXPIRY_BUFFER_SECS: i64 = 60;

    /// Creates token info from token-endpoint response data.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expires_in_secs.map(Self::expiry_from_now),
            scopes,
        }
    }

    fn expiry_from_now(secs: i64) -> DateTime<Utc> {
        Utc::now() + Duration::seconds(secs) - Duration::seconds(Self::EXPIRY_BUFFER_SECS)
    }

    /// Returns true if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            // No expiry recorded: assume still valid.
            None => false,
        }
    }

    /// Replaces the access token after a refresh.
    pub fn update_access_token(
        &mut self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) {
        self.access_token = access_token.into();
        self.expires_at = expires_in_secs.map(Self::expiry_from_now);
    }
}

/// File-backed token storage.
#[derive(Debug)]
pub struct TokenStorage {
    path: PathBuf,
    tokens: RwLock<Option<TokenInfo>>,
}

impl TokenStorage {
    /// Creates token storage backed by the given path. Does not touch disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tokens: RwLock::new(None),
        }
    }

    /// Loads tokens from disk into memory.
    ///
    /// Returns Ok(true) if tokens were loaded, Ok(false) if no file exists.
    /// An unreadable or undecodable file is an error; callers treat it the
    /// same as a miss and re-run the authorization flow.
    pub fn load(&self) -> ProviderResult<bool> {
        if !self.path.exists() {
            debug!("no token file at {:?}", self.path);
            return Ok(false);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to read token file: {}", e))
        })?;

        let tokens: TokenInfo = serde_json::from_str(&content).map_err(|e| {
            ProviderError::configuration(format!("failed to parse token file: {}", e))
        })?;

        info!("loaded tokens from {:?}", self.path);
        *self.tokens.write().unwrap() = Some(tokens);
        Ok(true)
    }

    /// Returns a clone of the current tokens, if any.
    pub fn get(&self) -> Option<TokenInfo> {
        self.tokens.read().unwrap().clone()
    }

    /// Sets new tokens and persists them, overwriting any existing file.
    pub fn set(&self, tokens: TokenInfo) -> ProviderResult<()> {
        *self.tokens.write().unwrap() = Some(tokens);
        self.save()
    }

    /// Updates the access token after a refresh and persists.
    pub fn update_access_token(
        &self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) -> ProviderResult<()> {
        let mut tokens = self.tokens.write().unwrap();
        if let Some(ref mut t) = *tokens {
            t.update_access_token(access_token, expires_in_secs);
            drop(tokens);
            self.save()
        } else {
            Err(ProviderError::internal("no tokens to update"))
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> ProviderResult<()> {
        let tokens = self.tokens.read().unwrap();
        let tokens = tokens
            .as_ref()
            .ok_or_else(|| ProviderError::internal("no tokens to save"))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                ProviderError::configuration(format!("failed to create token directory: {}", e))
            })?;
        }

        // Write a temp file then rename, so readers never see a torn file.
        let temp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(tokens)
            .map_err(|e| ProviderError::internal(format!("failed to serialize tokens: {}", e)))?;

        fs::write(&temp_path, &content).map_err(|e| {
            ProviderError::configuration(format!("failed to write token file: {}", e))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&temp_path, perms).map_err(|e| {
                ProviderError::configuration(format!(
                    "failed to restrict token file permissions: {}",
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            ProviderError::configuration(format!("failed to rename token file: {}", e))
        })?;

        debug!("saved tokens to {:?}", self.path);
        Ok(())
    }
}
