//! Command-line interface definitions.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::parse_duration;

/// Calendar summary HTTP service.
#[derive(Parser, Debug)]
#[command(name = "calsum", version, about = "Serve a JSON summary of recent Google Calendar events")]
pub struct Cli {
    /// Port to listen on (all interfaces)
    #[arg(long, short = 'p', default_value_t = 8080, env = "CALSUM_PORT")]
    pub port: u16,

    /// How long in-flight connections may drain after SIGINT
    /// (e.g. 15s, 1m, 500ms)
    #[arg(long, default_value = "15s", value_parser = parse_duration)]
    pub graceful_timeout: Duration,

    /// Per-request timeout (e.g. 15s, 1m)
    #[arg(long, default_value = "15s", value_parser = parse_duration)]
    pub request_timeout: Duration,

    /// Path to the OAuth client credentials JSON
    #[arg(long, default_value = "resources/credentials.json", env = "CALSUM_CREDENTIALS")]
    pub credentials: PathBuf,

    /// Path to the cached OAuth token
    #[arg(long, default_value = "token.json", env = "CALSUM_TOKEN_FILE")]
    pub token_file: PathBuf,

    /// How to obtain authorization when no usable token is cached
    #[arg(long, value_enum, default_value_t = AuthFlow::Terminal)]
    pub auth_flow: AuthFlow,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub debug: bool,
}

/// Interactive authorization flavors for first-run consent.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    /// Print a consent URL and read the code from stdin
    Terminal,
    /// Require a pre-provisioned token file, never prompt
    Token,
    /// OAuth device authorization grant (code typed on another machine)
    Device,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["calsum"]);
        assert_eq!(cli.port, 8080);
        assert_eq!(cli.graceful_timeout, Duration::from_secs(15));
        assert_eq!(cli.credentials, PathBuf::from("resources/credentials.json"));
        assert_eq!(cli.token_file, PathBuf::from("token.json"));
        assert_eq!(cli.auth_flow, AuthFlow::Terminal);
        assert!(!cli.debug);
    }

    #[test]
    fn graceful_timeout_accepts_suffixed_values() {
        let cli = Cli::parse_from(["calsum", "--graceful-timeout", "2m"]);
        assert_eq!(cli.graceful_timeout, Duration::from_secs(120));

        let cli = Cli::parse_from(["calsum", "--graceful-timeout", "500ms"]);
        assert_eq!(cli.graceful_timeout, Duration::from_millis(500));
    }

    #[test]
    fn bare_number_is_seconds() {
        let cli = Cli::parse_from(["calsum", "--graceful-timeout", "30"]);
        assert_eq!(cli.graceful_timeout, Duration::from_secs(30));
    }

    #[test]
    fn rejects_garbage_duration() {
        assert!(Cli::try_parse_from(["calsum", "--graceful-timeout", "soon"]).is_err());
    }

    #[test]
    fn auth_flow_values() {
        let cli = Cli::parse_from(["calsum", "--auth-flow", "device"]);
        assert_eq!(cli.auth_flow, AuthFlow::Device);

        let cli = Cli::parse_from(["calsum", "--auth-flow", "token"]);
        assert_eq!(cli.auth_flow, AuthFlow::Token);
    }
}
