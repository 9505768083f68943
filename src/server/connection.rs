// Connection module
// Serves a single accepted TCP connection over HTTP/1.1

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Connections served by the accept loop.
///
/// Every connection task holds a clone, which keeps `active` accurate and
/// keeps the shutdown sender open until the last connection is gone.
#[derive(Clone)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
    shutdown: watch::Receiver<bool>,
}

impl ConnectionTracker {
    /// Create a tracker plus the sender that asks its connections to wind down
    pub fn new() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        let tracker = Self {
            active: Arc::new(AtomicUsize::new(0)),
            shutdown: rx,
        };
        (tx, tracker)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Resolves once shutdown has been requested or the sender is gone
    async fn stopping(&mut self) {
        loop {
            if *self.shutdown.borrow_and_update() {
                return;
            }
            if self.shutdown.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Accept a connection and hand it to its own task
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    tracker: &ConnectionTracker,
) {
    if let Err(e) = stream.set_nodelay(true) {
        logger::log_debug(&format!("Failed to set TCP_NODELAY for {peer_addr}: {e}"));
    }
    logger::log_debug(&format!("[Connection] Accepted from: {peer_addr}"));

    tracker.active.fetch_add(1, Ordering::SeqCst);
    handle_connection(stream, peer_addr, Arc::clone(state), tracker.clone());
}

/// Handle a single connection in a spawned task.
///
/// This function:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures HTTP/1.1 keep-alive
/// 3. Serves every request on the connection through the handler
/// 4. On shutdown, lets the current response finish and then closes
/// 5. Bounds the connection by `performance.connection_timeout` (0 disables it)
/// 6. Decrements the active connection counter when done
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    mut tracker: ConnectionTracker,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let timeout_secs = state.config.performance.connection_timeout;

        let mut builder = http1::Builder::new();
        builder.keep_alive(state.config.performance.keep_alive);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handler::handle_request(req, Arc::clone(&service_state), peer_addr)),
        );
        tokio::pin!(conn);

        let serve = async {
            tokio::select! {
                res = conn.as_mut() => res,
                () = tracker.stopping() => {
                    conn.as_mut().graceful_shutdown();
                    conn.as_mut().await
                }
            }
        };

        let result = if timeout_secs == 0 {
            Ok(serve.await)
        } else {
            tokio::time::timeout(Duration::from_secs(timeout_secs), serve).await
        };

        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_debug(&format!(
                    "Connection from {peer_addr} closed after {timeout_secs}s timeout"
                ));
            }
        }

        tracker.active.fetch_sub(1, Ordering::SeqCst);
    });
}
