//! Google Calendar summary provider.
//!
//! Wires the token storage, OAuth client and API client together behind
//! the [`SummaryProvider`] trait. Authorization happens once at startup
//! through [`GoogleProvider::bootstrap`]; request-time calls only ever
//! refresh an expired access token, never prompt.

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, SummaryProvider};
use crate::summary::{SummaryEvent, SummaryWindow, summarize};

use super::auth::Authorizer;
use super::client::GoogleCalendarClient;
use super::config::GoogleConfig;
use super::oauth::OAuthClient;
use super::tokens::TokenStorage;

/// Google Calendar provider.
pub struct GoogleProvider {
    config: GoogleConfig,
    token_storage: TokenStorage,
    oauth_client: OAuthClient,
    api_client: RwLock<Option<GoogleCalendarClient>>,
}

impl GoogleProvider {
    /// Creates a provider from the given configuration. Does not touch the
    /// network; call [`bootstrap`](Self::bootstrap) before serving.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate().map_err(ProviderError::configuration)?;

        let token_storage = TokenStorage::new(&config.token_path);
        let oauth_client = OAuthClient::new(config.credentials.clone(), config.timeout)?;

        Ok(Self {
            config,
            token_storage,
            oauth_client,
            api_client: RwLock::new(None),
        })
    }

    /// Loads the cached token or runs the authorization flow exactly once.
    ///
    /// A cached token that is still valid, or expired but refreshable, is
    /// reused without invoking the flow. Called at startup, before the
    /// listener binds; a failure here is a startup failure.
    pub async fn bootstrap(&self, authorizer: &dyn Authorizer) -> ProviderResult<()> {
        let loaded = match self.token_storage.load() {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(error = %e, "token cache unusable, re-running authorization");
                false
            }
        };

        let reusable = loaded
            && self
                .token_storage
                .get()
                .is_some_and(|t| !t.is_expired() || t.refresh_token.is_some());

        if reusable {
            debug!("reusing cached tokens from {:?}", self.token_storage.path());
        } else {
            info!(flow = authorizer.name(), "starting authorization flow");
            let tokens = authorizer
                .authorize(&self.oauth_client, &self.config.scopes)
                .await?;
            self.token_storage.set(tokens)?;
            info!("authorization complete, tokens cached");
        }

        self.ensure_authenticated().await
    }

    /// Ensures a usable API client exists, refreshing the access token if
    /// the stored one reports expiry.
    async fn ensure_authenticated(&self) -> ProviderResult<()> {
        let tokens = self
            .token_storage
            .get()
            .ok_or_else(|| ProviderError::authentication("not authorized"))?;

        if tokens.is_expired() {
            let refresh_token = tokens.refresh_token.as_ref().ok_or_else(|| {
                ProviderError::authentication(
                    "access token expired and no refresh token is available",
                )
            })?;

            debug!("refreshing expired access token");
            let (access_token, expires_in) =
                self.oauth_client.refresh_token(refresh_token).await?;
            self.token_storage
                .update_access_token(&access_token, expires_in)?;

            let mut client = self.api_client.write().await;
            match client.as_mut() {
                Some(c) => c.set_access_token(&access_token),
                None => {
                    *client = Some(GoogleCalendarClient::new(
                        &access_token,
                        self.config.timeout,
                    )?);
                }
            }
        } else {
            let mut client = self.api_client.write().await;
            if client.is_none() {
                *client = Some(GoogleCalendarClient::new(
                    &tokens.access_token,
                    self.config.timeout,
                )?);
            }
        }

        Ok(())
    }

    async fn build_summary(&self) -> ProviderResult<Vec<SummaryEvent>> {
        self.ensure_authenticated().await?;

        let window = SummaryWindow::trailing_month(Utc::now());
        let client = self.api_client.read().await;
        let client = client
            .as_ref()
            .ok_or_else(|| ProviderError::internal("API client not available"))?;

        summarize(client, &window).await
    }
}

impl SummaryProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn fetch_summary(&self) -> BoxFuture<'_, ProviderResult<Vec<SummaryEvent>>> {
        Box::pin(self.build_summary())
    }
}
