//! Calendar provider layer for calsum.
//!
//! This crate turns an OAuth2-authenticated Google Calendar account into a
//! flat event summary:
//!
//! - [`SummaryProvider`] - the trait the HTTP layer consumes
//! - [`summary`] - domain types and the aggregation loop
//! - [`google`] - the Google backend (config, tokens, OAuth, API client)
//! - [`ProviderError`] - error taxonomy; every failure is request-scoped

pub mod error;
pub mod google;
pub mod provider;
pub mod summary;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use provider::{BoxFuture, SummaryProvider};
pub use summary::{
    CalendarEntry, CalendarSource, EventRecord, SummaryEvent, SummaryWindow, summarize,
};
