//! Request handler module
//!
//! Public asset serving plus the delegate that owns every other response.

pub mod delegate;
pub mod fallback;
pub mod router;
pub mod site;
pub mod static_files;

// Re-export main entry points
pub use delegate::Delegate;
pub use router::handle_request;
pub use static_files::AssetRoot;
