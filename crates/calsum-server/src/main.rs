//! calsum entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use calsum_providers::google::{
    Authorizer, DeviceCodeAuthorizer, GoogleConfig, GoogleProvider, OAuthCredentials,
    ProvisionedTokenAuthorizer, TerminalAuthorizer,
};

use calsum_server::cli::{AuthFlow, Cli};
use calsum_server::config::ServerConfig;
use calsum_server::error::{ServerError, ServerResult};
use calsum_server::routes::AppState;
use calsum_server::signals::SignalHandler;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.debug {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ServerResult<()> {
    let credentials = OAuthCredentials::from_file(&cli.credentials).map_err(ServerError::config)?;
    let google_config = GoogleConfig::new(credentials).with_token_path(&cli.token_file);
    let provider = GoogleProvider::new(google_config)?;

    // Authorization happens exactly once, before the listener binds.
    // Requests only ever reuse or refresh the token obtained here.
    let authorizer: Box<dyn Authorizer> = match cli.auth_flow {
        AuthFlow::Terminal => Box::new(TerminalAuthorizer),
        AuthFlow::Token => Box::new(ProvisionedTokenAuthorizer::new(&cli.token_file)),
        AuthFlow::Device => Box::new(DeviceCodeAuthorizer),
    };
    provider.bootstrap(authorizer.as_ref()).await?;
    info!("calendar provider authorized");

    let config = ServerConfig::default()
        .with_port(cli.port)
        .with_request_timeout(cli.request_timeout)
        .with_graceful_timeout(cli.graceful_timeout);

    let signals = SignalHandler::new();
    signals.spawn_listener();

    let state = AppState::new(Arc::new(provider));
    calsum_server::server::serve(&config, state, signals.shutdown_handle()).await
}
