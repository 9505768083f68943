// Server loop module
// Accepts connections until a shutdown signal arrives, then drains them

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use super::connection::{accept_connection, ConnectionTracker};
use super::signal::shutdown_signal;
use crate::config::AppState;
use crate::logger;

/// Accept connections until SIGINT/SIGTERM, then drain them
pub async fn start_server_loop(listener: TcpListener, state: Arc<AppState>) {
    serve_until(listener, state, shutdown_signal()).await;
}

/// Accept connections until `shutdown` resolves.
///
/// The listener is closed first. Open connections are then asked to shut
/// down gracefully: idle keep-alive connections close right away, and a
/// response in progress is written out in full. Waiting is bounded by
/// `performance.connection_timeout` (0 waits for every connection).
pub async fn serve_until<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: Future<Output = ()>,
{
    let (shutdown_tx, tracker) = ConnectionTracker::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state, &tracker),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = &mut shutdown => {
                logger::log_info("[SHUTDOWN] Listener closed, no longer accepting connections");
                break;
            }
        }
    }
    drop(listener);

    let active = tracker.active();
    // Only connection tasks hold receivers from here on
    drop(tracker);
    shutdown_tx.send_replace(true);

    if active > 0 {
        logger::log_info(&format!("[SHUTDOWN] Waiting for {active} connection(s) to finish"));
    }

    let timeout_secs = state.config.performance.connection_timeout;
    if timeout_secs == 0 {
        shutdown_tx.closed().await;
    } else if tokio::time::timeout(Duration::from_secs(timeout_secs), shutdown_tx.closed())
        .await
        .is_err()
    {
        logger::log_warning(&format!(
            "[SHUTDOWN] Connections still open after {timeout_secs}s, exiting anyway"
        ));
        return;
    }
    logger::log_info("[SHUTDOWN] All connections closed");
}
