// Signal handling module
//
// - SIGTERM: graceful shutdown
// - SIGINT:  graceful shutdown (Ctrl+C)

use crate::logger;

/// Resolve once the process is asked to stop
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                logger::log_warning(&format!("Failed to register SIGTERM handler: {e}"));
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = interrupt() => logger::log_info("[SIGNAL] SIGINT received, shutting down"),
        () = terminate => logger::log_info("[SIGNAL] SIGTERM received, shutting down"),
    }
}

/// Non-unix platforms only get Ctrl+C
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    interrupt().await;
    logger::log_info("[SIGNAL] Ctrl+C received, shutting down");
}

async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        logger::log_warning(&format!("Failed to listen for Ctrl+C: {e}"));
        std::future::pending::<()>().await;
    }
}
