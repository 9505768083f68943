// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub assets: AssetsConfig,
    pub site: SiteConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Asset directories served ahead of (and by) the delegate
#[derive(Debug, Deserialize, Clone)]
pub struct AssetsConfig {
    /// Directory whose files are served verbatim at the URL root
    pub public_dir: String,
    /// Pre-built bundle directory
    pub bundle_dir: String,
    /// URL prefix the bundle directory is mounted under
    pub bundle_prefix: String,
}

/// Pre-rendered site output
#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    /// Directory holding the exported HTML pages
    pub output_dir: String,
    /// Absolute origin used for sitemap `<loc>` entries
    pub base_url: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common or json)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// Connection handling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Upper bound on a single connection's lifetime, in seconds
    pub connection_timeout: u64,
}
