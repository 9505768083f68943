//! Error types
//!
//! Startup failures abort the process; request-time filesystem errors never
//! reach this module and are absorbed by the loaders instead.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while bringing the server up
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid listen address {0}")]
    InvalidAddress(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to open log file: {0}")]
    Logger(#[source] io::Error),

    #[error("failed to build runtime: {0}")]
    Runtime(#[source] io::Error),
}

/// Reasons the pre-rendered site cannot be used
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("site output directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("site output has no index page: {}", .0.display())]
    MissingIndex(PathBuf),

    #[error("failed to scan site output {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
