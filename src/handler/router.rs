//! Request dispatch module
//!
//! Entry point for HTTP request processing: public assets first, then the
//! delegate selected at startup.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::IF_NONE_MATCH;
use hyper::{Method, Request, Response};

use crate::config::AppState;
use crate::handler::static_files;
use crate::logger::{self, AccessLogEntry};

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub method: &'a Method,
    /// URL path without the query string
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
}

impl<'a> RequestContext<'a> {
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        let method = req.method();
        Self {
            method,
            path: req.uri().path(),
            is_head: *method == Method::HEAD,
            if_none_match: req
                .headers()
                .get(IF_NONE_MATCH)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string),
        }
    }

    /// Only safe methods are answered from disk
    pub fn is_read(&self) -> bool {
        matches!(*self.method, Method::GET | Method::HEAD)
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let mut access_entry = state
        .access_log()
        .then(|| AccessLogEntry::from_request(&req, peer_addr));

    let ctx = RequestContext::from_request(&req);
    let response = route_request(&ctx, &state).await;

    if let Some(entry) = access_entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Public directory first; anything it does not answer goes to the delegate
async fn route_request(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    if ctx.is_read() {
        if let Some(resp) = static_files::serve_asset(&state.public_root, ctx, ctx.path).await {
            return resp;
        }
    }

    logger::log_debug(&format!(
        "{} {} -> {} delegate",
        ctx.method,
        ctx.path,
        state.delegate.mode()
    ));
    state.delegate.handle(ctx).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::http::cache;
    use http_body_util::BodyExt;
    use hyper::header::{CACHE_CONTROL, CONTENT_TYPE};
    use hyper::StatusCode;
    use std::path::Path;

    const PEER: &str = "127.0.0.1:40000";

    fn write(path: &Path, content: &[u8]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// Public dir + bundle; the site output exists only when `with_site` is set
    async fn state(dir: &Path, with_site: bool) -> Arc<AppState> {
        write(&dir.join("public/images/logo.png"), b"png-bytes");
        write(&dir.join("public/app.js"), b"console.log(1)");
        write(&dir.join("public/data.xyz"), b"opaque");
        write(&dir.join("secret.txt"), b"do not serve");
        write(&dir.join("bundle/chunks/app.js"), b"chunk-bytes");
        if with_site {
            write(&dir.join("out/index.html"), b"<h1>Home</h1>");
            write(&dir.join("out/about.html"), b"<h1>About</h1>");
            write(&dir.join("out/404.html"), b"<h1>Missing</h1>");
        }

        let mut cfg = Config::load_from("definitely-missing-config-file").unwrap();
        cfg.assets.public_dir = dir.join("public").to_string_lossy().into_owned();
        cfg.assets.bundle_dir = dir.join("bundle").to_string_lossy().into_owned();
        cfg.site.output_dir = dir.join("out").to_string_lossy().into_owned();
        cfg.logging.access_log = false;
        Arc::new(AppState::initialize(cfg).await)
    }

    async fn send(
        state: &Arc<AppState>,
        method: Method,
        uri: &str,
    ) -> (StatusCode, hyper::HeaderMap, Bytes) {
        let req = Request::builder().method(method).uri(uri).body(()).unwrap();
        let resp = handle_request(req, Arc::clone(state), PEER.parse().unwrap())
            .await
            .unwrap();
        let (parts, body) = resp.into_parts();
        (parts.status, parts.headers, body.collect().await.unwrap().to_bytes())
    }

    #[tokio::test]
    async fn test_public_file_served_with_type_and_cache() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path(), false).await;

        let (status, headers, body) = send(&state, Method::GET, "/images/logo.png?v=3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_ref(), b"png-bytes");
        assert_eq!(headers[CONTENT_TYPE], "image/png");
        assert_eq!(headers[CACHE_CONTROL], cache::IMMUTABLE);

        let (_, headers, _) = send(&state, Method::GET, "/app.js").await;
        assert_eq!(headers[CONTENT_TYPE], "application/javascript");

        let (_, headers, _) = send(&state, Method::GET, "/data.xyz").await;
        assert_eq!(headers[CONTENT_TYPE], "application/octet-stream");
    }

    #[tokio::test]
    async fn test_repeated_get_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path(), false).await;

        let first = send(&state, Method::GET, "/app.js").await;
        let second = send(&state, Method::GET, "/app.js").await;
        assert_eq!(first.2, second.2);
        assert_eq!(first.1[CONTENT_TYPE], second.1[CONTENT_TYPE]);
    }

    #[tokio::test]
    async fn test_traversal_never_leaks() {
        let dir = tempfile::tempdir().unwrap();
        for with_site in [false, true] {
            let state = state(dir.path(), with_site).await;
            for uri in ["/../secret.txt", "/%2e%2e/secret.txt", "/images/../../secret.txt"] {
                let (status, _, body) = send(&state, Method::GET, uri).await;
                assert_ne!(status, StatusCode::OK, "{uri}");
                assert_ne!(body.as_ref(), b"do not serve", "{uri}");
            }
        }
    }

    #[tokio::test]
    async fn test_fallback_mode() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path(), false).await;
        assert_eq!(state.delegate.mode(), "fallback");

        let (status, _, body) = send(&state, Method::GET, "/_next/static/chunks/app.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_ref(), b"chunk-bytes");

        let (status, headers, body) = send(&state, Method::GET, "/random/unknown/path").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(headers[CONTENT_TYPE].to_str().unwrap().starts_with("text/plain"));
        assert!(!body.is_empty());
    }

    #[tokio::test]
    async fn test_site_mode_pages() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path(), true).await;
        assert_eq!(state.delegate.mode(), "site");

        let (status, _, body) = send(&state, Method::GET, "/about").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_ref(), b"<h1>About</h1>");

        let (status, _, body) = send(&state, Method::GET, "/nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.as_ref(), b"<h1>Missing</h1>");

        // public directory still wins over the delegate
        let (status, _, body) = send(&state, Method::GET, "/app.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_ref(), b"console.log(1)");
    }

    #[tokio::test]
    async fn test_non_read_methods_skip_public_dir() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path(), true).await;

        let (status, _, _) = send(&state, Method::POST, "/app.js").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, headers, body) = send(&state, Method::HEAD, "/app.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CACHE_CONTROL], cache::IMMUTABLE);
        assert!(body.is_empty());
    }
}
