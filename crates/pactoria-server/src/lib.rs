//! # pactoria-server
//!
//! The Pactoria HTTP API: axum routes under `/api/v1`, the notification
//! WebSocket, notification fan-out, and the contract expiry job. The
//! `pactoria` binary wraps [`serve`] with a clap CLI.

pub mod error;
pub mod extract;
pub mod fanout;
pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::build_router;
pub use state::AppState;

use std::future::Future;

use tokio::net::TcpListener;
use tokio::sync::watch;

/// Serve the API on `listener` and run the expiry job until `shutdown`
/// resolves, then drain in-flight requests.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn serve<F>(state: AppState, listener: TcpListener, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (stop_tx, stop_rx) = watch::channel(false);
    let expiry = tokio::spawn(jobs::expiry_loop(state.clone(), stop_rx));

    let app = build_router(state);
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("shutdown requested");
        })
        .await;

    let _ = stop_tx.send(true);
    if let Err(error) = expiry.await {
        tracing::warn!(%error, "expiry job ended abnormally");
    }
    result
}
