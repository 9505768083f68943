//! Bundle-only delegate
//!
//! Serves the pre-built bundle under its URL prefix and answers everything
//! else with a plain 404.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::config::AssetsConfig;
use crate::handler::router::RequestContext;
use crate::handler::static_files::{self, AssetRoot};
use crate::http;

#[derive(Debug, Clone)]
pub struct BundleFallback {
    root: AssetRoot,
    /// Always starts and ends with `/`
    prefix: String,
}

impl BundleFallback {
    pub fn new(assets: &AssetsConfig) -> Self {
        Self {
            root: AssetRoot::new(&assets.bundle_dir),
            prefix: normalize_prefix(&assets.bundle_prefix),
        }
    }

    /// Serve a bundle file if the path is under the bundle prefix
    pub async fn serve_bundle(&self, ctx: &RequestContext<'_>) -> Option<Response<Full<Bytes>>> {
        if !ctx.is_read() {
            return None;
        }
        let relative = ctx.path.strip_prefix(&self.prefix)?;
        static_files::serve_asset(&self.root, ctx, relative).await
    }

    pub async fn handle(&self, ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
        match self.serve_bundle(ctx).await {
            Some(resp) => resp,
            None => http::build_404_response(),
        }
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}
