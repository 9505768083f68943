// Application state module
// Immutable runtime state shared by every connection

use crate::handler::{AssetRoot, Delegate};

use super::types::Config;

/// Application state, built once before the listener starts accepting.
///
/// Nothing in here changes after startup, so connections share it through a
/// plain `Arc` without any locking.
pub struct AppState {
    pub config: Config,
    /// Root of the public asset directory, consulted before the delegate
    pub public_root: AssetRoot,
    /// Handler for everything the public directory does not answer
    pub delegate: Delegate,
}

impl AppState {
    /// Resolve directories and select the delegate for the process lifetime
    pub async fn initialize(config: Config) -> Self {
        let public_root = AssetRoot::new(&config.assets.public_dir);
        let delegate = Delegate::initialize(&config).await;

        Self {
            config,
            public_root,
            delegate,
        }
    }

    #[inline]
    pub const fn access_log(&self) -> bool {
        self.config.logging.access_log
    }
}
