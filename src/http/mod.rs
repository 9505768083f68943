//! HTTP protocol layer module
//!
//! Content types, cache directives and response builders, independent of how
//! a request was routed.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_304_response, build_404_response, build_405_response, build_asset_response,
    build_page_response, build_xml_response,
};
