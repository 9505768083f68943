// Configuration module entry point
// Loads layered configuration and builds the immutable runtime state

mod state;
mod types;

use std::net::SocketAddr;

use crate::error::ServerError;

// Re-export public types
pub use state::AppState;
pub use types::{AssetsConfig, Config, LoggingConfig, SiteConfig};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Port used when neither `PORT` nor the config file provides one
pub const DEFAULT_PORT: u16 = 3000;

impl Config {
    /// Load configuration from the specified file path (without extension).
    ///
    /// Sources, lowest priority first: built-in defaults, the optional file,
    /// `COOP__SECTION__KEY` environment variables, and finally `PORT`.
    pub fn load_from(config_path: &str) -> Result<Self, ServerError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("COOP").separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("assets.public_dir", "public")?
            .set_default("assets.bundle_dir", ".next/static")?
            .set_default("assets.bundle_prefix", "/_next/static/")?
            .set_default("site.output_dir", "out")?
            .set_default("site.base_url", "https://accoop.com")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.connection_timeout", 30)?
            .build()?;

        let mut cfg: Self = settings.try_deserialize()?;
        cfg.server.port = resolve_port(std::env::var("PORT").ok().as_deref(), cfg.server.port);
        Ok(cfg)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let raw = format!("{}:{}", self.server.host, self.server.port);
        raw.parse()
            .map_err(|e| ServerError::InvalidAddress(format!("{raw}: {e}")))
    }
}

/// Pick the listen port from a raw `PORT` value.
///
/// Non-numeric, out-of-range and zero values fall back to `configured`.
pub fn resolve_port(env_value: Option<&str>, configured: u16) -> u16 {
    env_value
        .and_then(|v| v.trim().parse::<u16>().ok())
        .filter(|port| *port != 0)
        .unwrap_or(configured)
}
