//! HTTP service exposing a summary of recent calendar events.
//!
//! The server authorizes its calendar provider once at startup, then
//! serves two routes: `GET /` (liveness greeting) and `GET /calendar`
//! (JSON array of events from the trailing calendar month). SIGINT
//! triggers a graceful drain bounded by a configurable timeout.

pub mod cli;
pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod signals;

pub use cli::{AuthFlow, Cli};
pub use config::{ServerConfig, parse_duration};
pub use error::{ServerError, ServerResult};
pub use routes::{AppState, router};
pub use server::{serve, serve_on};
pub use signals::{ShutdownHandle, SignalHandler};
