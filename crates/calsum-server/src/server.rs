//! HTTP server lifecycle: bind, serve, drain on shutdown.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::routes::{AppState, router};
use crate::signals::ShutdownHandle;

/// Binds the configured port and serves until shutdown is signalled.
///
/// Once the shutdown handle fires, in-flight requests get
/// `graceful_timeout` to drain; past that the server is aborted and a
/// [`ServerError::ShutdownTimeout`] is returned.
pub async fn serve(
    config: &ServerConfig,
    state: AppState,
    shutdown: ShutdownHandle,
) -> ServerResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    serve_on(listener, config, state, shutdown).await
}

/// Serves on an already-bound listener. Split out so tests can bind an
/// ephemeral port themselves.
pub async fn serve_on(
    listener: TcpListener,
    config: &ServerConfig,
    state: AppState,
    shutdown: ShutdownHandle,
) -> ServerResult<()> {
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "listening");

    let app = apply_layers(router(state), config);

    let drain = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { drain.wait().await })
            .await
    });

    tokio::select! {
        result = &mut server => {
            // The accept loop ended on its own, without a signal.
            return result?.map_err(ServerError::from);
        }
        _ = shutdown.wait() => {
            info!(grace = ?config.graceful_timeout, "shutdown requested, draining connections");
        }
    }

    match tokio::time::timeout(config.graceful_timeout, &mut server).await {
        Ok(result) => {
            result??;
            info!("server drained cleanly");
            Ok(())
        }
        Err(_) => {
            warn!(grace = ?config.graceful_timeout, "grace period elapsed, aborting server");
            server.abort();
            Err(ServerError::ShutdownTimeout(config.graceful_timeout))
        }
    }
}

/// Wraps the router with the per-request timeout.
fn apply_layers(router: Router, config: &ServerConfig) -> Router {
    router.layer(TimeoutLayer::new(config.request_timeout))
}
