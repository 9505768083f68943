//! Delegate selection
//!
//! Whatever the public directory does not answer goes to exactly one delegate,
//! chosen before the listener starts and kept for the process lifetime.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::config::Config;
use crate::handler::fallback::BundleFallback;
use crate::handler::router::RequestContext;
use crate::handler::site::SiteRenderer;
use crate::logger;

pub enum Delegate {
    /// Full site: exported pages, bundle, sitemap
    Site(SiteRenderer),
    /// Degraded mode: bundle files only, 404 for everything else
    Fallback(BundleFallback),
}

impl Delegate {
    /// Try the full site first; any failure selects bundle-only mode for good
    pub async fn initialize(config: &Config) -> Self {
        let bundle = BundleFallback::new(&config.assets);
        match SiteRenderer::prepare(&config.site, bundle.clone()).await {
            Ok(site) => Self::Site(site),
            Err(e) => {
                logger::log_warning(&format!("{e}; serving pre-built bundle only"));
                Self::Fallback(bundle)
            }
        }
    }

    pub const fn mode(&self) -> &'static str {
        match self {
            Self::Site(_) => "site",
            Self::Fallback(_) => "fallback",
        }
    }

    pub async fn handle(&self, ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
        match self {
            Self::Site(site) => site.handle(ctx).await,
            Self::Fallback(fallback) => fallback.handle(ctx).await,
        }
    }
}
