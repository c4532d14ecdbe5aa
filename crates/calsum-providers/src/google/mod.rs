//! Google Calendar backend.
//!
//! - [`config`] - client-secret parsing and provider configuration
//! - [`tokens`] - token cache (in-memory holder backed by a file)
//! - [`oauth`] - token-endpoint client and PKCE helpers
//! - [`auth`] - startup authorization flows (terminal, token, device)
//! - [`client`] - Calendar API v3 listing client
//! - [`provider`] - the [`GoogleProvider`] tying it all together

pub mod auth;
pub mod client;
pub mod config;
pub mod oauth;
pub mod provider;
pub mod tokens;

pub use auth::{Authorizer, DeviceCodeAuthorizer, ProvisionedTokenAuthorizer, TerminalAuthorizer};
pub use client::GoogleCalendarClient;
pub use config::{GoogleConfig, OAuthCredentials};
pub use oauth::OAuthClient;
pub use provider::GoogleProvider;
pub use tokens::{TokenInfo, TokenStorage};
