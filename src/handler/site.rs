//! Pre-rendered site delegate
//!
//! Serves the HTML pages exported by the site build. The page table and the
//! sitemap are built once in [`SiteRenderer::prepare`]; requests only read
//! files the table already knows about.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use tokio::fs;

use crate::config::SiteConfig;
use crate::error::SiteError;
use crate::handler::fallback::BundleFallback;
use crate::handler::router::RequestContext;
use crate::handler::static_files::absolutize;
use crate::http;
use crate::logger;

pub const SITEMAP_PATH: &str = "/sitemap.xml";
const NOT_FOUND_ROUTE: &str = "/404";
/// Build output that holds bundles rather than pages
const SKIPPED_DIRS: &[&str] = &["_next"];

pub struct SiteRenderer {
    /// Route (`/`, `/about`, ...) to the exported HTML file
    pages: BTreeMap<String, PathBuf>,
    not_found_page: Option<PathBuf>,
    sitemap: Bytes,
    bundle: BundleFallback,
}

impl SiteRenderer {
    /// Scan the site output directory and precompute the sitemap.
    ///
    /// Fails when the directory is missing or has no home page, which makes
    /// the server fall back to bundle-only mode.
    pub async fn prepare(site: &SiteConfig, bundle: BundleFallback) -> Result<Self, SiteError> {
        let dir = absolutize(Path::new(&site.output_dir));
        match fs::metadata(&dir).await {
            Ok(m) if m.is_dir() => {}
            _ => return Err(SiteError::MissingDirectory(dir)),
        }

        let mut pages = scan_pages(&dir).await?;
        if !pages.contains_key("/") {
            return Err(SiteError::MissingIndex(dir.join("index.html")));
        }
        let not_found_page = pages.remove(NOT_FOUND_ROUTE);
        let sitemap = build_sitemap(&site.base_url, pages.keys(), Utc::now().date_naive());

        logger::log_info(&format!(
            "[SITE] {} pages loaded from {}",
            pages.len(),
            dir.display()
        ));

        Ok(Self {
            pages,
            not_found_page,
            sitemap: Bytes::from(sitemap),
            bundle,
        })
    }

    pub async fn handle(&self, ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
        if !ctx.is_read() {
            return http::build_405_response();
        }

        if let Some(resp) = self.bundle.serve_bundle(ctx).await {
            return resp;
        }

        if ctx.path == SITEMAP_PATH {
            return http::build_xml_response(self.sitemap.clone(), ctx.is_head);
        }

        if let Some(page) = self.pages.get(route_key(ctx.path)) {
            if let Some(resp) = serve_page(page, StatusCode::OK, ctx.is_head).await {
                return resp;
            }
        }

        self.not_found(ctx).await
    }

    async fn not_found(&self, ctx: &RequestContext<'_>) -> Response<Full<Bytes>> {
        if let Some(page) = &self.not_found_page {
            if let Some(resp) = serve_page(page, StatusCode::NOT_FOUND, ctx.is_head).await {
                return resp;
            }
        }
        http::build_404_response()
    }
}

async fn serve_page(path: &Path, status: StatusCode, is_head: bool) -> Option<Response<Full<Bytes>>> {
    match fs::read(path).await {
        Ok(content) => Some(http::build_page_response(status, Bytes::from(content), is_head)),
        Err(e) => {
            logger::log_warning(&format!("Failed to read page '{}': {e}", path.display()));
            None
        }
    }
}

/// `/about/` and `/about` are the same page
fn route_key(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Route for an exported file, relative to the output directory.
///
/// `index.html` -> `/`, `about.html` -> `/about`, `news/index.html` -> `/news`.
fn route_for(relative: &Path) -> Option<String> {
    let is_html = relative
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html"));
    if !is_html {
        return None;
    }

    let mut segments: Vec<&str> = relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    let stem = relative.file_stem()?.to_str()?;
    if stem != "index" {
        segments.push(stem);
    }

    Some(format!("/{}", segments.join("/")))
}

async fn scan_pages(root: &Path) -> Result<BTreeMap<String, PathBuf>, SiteError> {
    let scan_error = |path: &Path, source| SiteError::Scan {
        path: path.to_path_buf(),
        source,
    };

    let mut pages = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await.map_err(|e| scan_error(&dir, e))?;
        while let Some(entry) = entries.next_entry().await.map_err(|e| scan_error(&dir, e))? {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(|e| scan_error(&path, e))?;

            if file_type.is_dir() {
                let skipped = entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| SKIPPED_DIRS.contains(&name));
                if !skipped {
                    pending.push(path);
                }
                continue;
            }

            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            if let Some(route) = route_for(relative) {
                pages.entry(route).or_insert(path);
            }
        }
    }

    Ok(pages)
}

/// Render the XML sitemap for every public route.
///
/// Home gets priority 1.0 and the news page is refreshed weekly; internal
/// routes (`/_...`) are left out.
pub fn build_sitemap<'a>(
    base_url: &str,
    routes: impl IntoIterator<Item = &'a String>,
    last_modified: NaiveDate,
) -> String {
    let base = base_url.trim_end_matches('/');
    let lastmod = last_modified.format("%Y-%m-%d");

    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    for route in routes {
        if route.starts_with("/_") || route == NOT_FOUND_ROUTE {
            continue;
        }
        let (path, priority) = if route == "/" { ("", "1.0") } else { (route.as_str(), "0.8") };
        let changefreq = if route == "/news" { "weekly" } else { "monthly" };

        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&format!("{base}{path}"))));
        xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
        xml.push_str(&format!("    <changefreq>{changefreq}</changefreq>\n"));
        xml.push_str(&format!("    <priority>{priority}</priority>\n"));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetsConfig;
    use http_body_util::BodyExt;
    use hyper::header::CONTENT_TYPE;
    use hyper::{Method, Request};

    const PAGES: &[&str] = &[
        "index.html",
        "about.html",
        "membership.html",
        "news/index.html",
        "contact/index.html",
        "_not-found.html",
        "404.html",
    ];

    fn site_config(dir: &Path) -> SiteConfig {
        SiteConfig {
            output_dir: dir.join("out").to_string_lossy().into_owned(),
            base_url: "https://accoop.com/".to_string(),
        }
    }

    fn bundle(dir: &Path) -> BundleFallback {
        BundleFallback::new(&AssetsConfig {
            public_dir: "public".to_string(),
            bundle_dir: dir.join("out/_next/static").to_string_lossy().into_owned(),
            bundle_prefix: "/_next/static/".to_string(),
        })
    }

    fn build_output(dir: &Path) {
        for page in PAGES {
            let path = dir.join("out").join(page);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, format!("<p>{page}</p>")).unwrap();
        }
        let chunk = dir.join("out/_next/static/chunks/main.js");
        std::fs::create_dir_all(chunk.parent().unwrap()).unwrap();
        std::fs::write(chunk, b"main()").unwrap();
        std::fs::write(dir.join("out/_next/static/stray.html"), b"not a page").unwrap();
    }

    async fn get(site: &SiteRenderer, method: Method, uri: &str) -> (StatusCode, String) {
        let req = Request::builder().method(method).uri(uri).body(()).unwrap();
        let resp = site.handle(&RequestContext::from_request(&req)).await;
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[test]
    fn test_route_for() {
        assert_eq!(route_for(Path::new("index.html")).as_deref(), Some("/"));
        assert_eq!(route_for(Path::new("about.html")).as_deref(), Some("/about"));
        assert_eq!(route_for(Path::new("news/index.html")).as_deref(), Some("/news"));
        assert_eq!(
            route_for(Path::new("social-impact/index.HTML")).as_deref(),
            Some("/social-impact")
        );
        assert_eq!(route_for(Path::new("robots.txt")), None);
    }

    #[test]
    fn test_route_key() {
        assert_eq!(route_key("/"), "/");
        assert_eq!(route_key("/about/"), "/about");
        assert_eq!(route_key("/about"), "/about");
    }

    #[tokio::test]
    async fn test_prepare_requires_output() {
        let dir = tempfile::tempdir().unwrap();
        let err = SiteRenderer::prepare(&site_config(dir.path()), bundle(dir.path()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SiteError::MissingDirectory(_)));

        std::fs::create_dir_all(dir.path().join("out")).unwrap();
        std::fs::write(dir.path().join("out/about.html"), b"about").unwrap();
        let err = SiteRenderer::prepare(&site_config(dir.path()), bundle(dir.path()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SiteError::MissingIndex(_)));
    }

    #[tokio::test]
    async fn test_pages_and_not_found() {
        let dir = tempfile::tempdir().unwrap();
        build_output(dir.path());
        let site = SiteRenderer::prepare(&site_config(dir.path()), bundle(dir.path()))
            .await
            .unwrap();

        assert_eq!(get(&site, Method::GET, "/").await, (StatusCode::OK, "<p>index.html</p>".into()));
        assert_eq!(
            get(&site, Method::GET, "/about/").await,
            (StatusCode::OK, "<p>about.html</p>".into())
        );
        assert_eq!(
            get(&site, Method::GET, "/news").await,
            (StatusCode::OK, "<p>news/index.html</p>".into())
        );
        assert_eq!(
            get(&site, Method::GET, "/missing").await,
            (StatusCode::NOT_FOUND, "<p>404.html</p>".into())
        );
        // the 404 page is not reachable as a regular page
        assert_eq!(get(&site, Method::GET, "/404").await.0, StatusCode::NOT_FOUND);
        // bundle directories are not scanned for pages
        assert_eq!(get(&site, Method::GET, "/_next/static/stray").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bundle_and_methods() {
        let dir = tempfile::tempdir().unwrap();
        build_output(dir.path());
        let site = SiteRenderer::prepare(&site_config(dir.path()), bundle(dir.path()))
            .await
            .unwrap();

        let (status, body) = get(&site, Method::GET, "/_next/static/chunks/main.js").await;
        assert_eq!((status, body.as_str()), (StatusCode::OK, "main()"));

        let (status, body) = get(&site, Method::HEAD, "/about").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());

        assert_eq!(
            get(&site, Method::DELETE, "/about").await.0,
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[tokio::test]
    async fn test_sitemap_served() {
        let dir = tempfile::tempdir().unwrap();
        build_output(dir.path());
        let site = SiteRenderer::prepare(&site_config(dir.path()), bundle(dir.path()))
            .await
            .unwrap();

        let req = Request::builder().uri(SITEMAP_PATH).body(()).unwrap();
        let resp = site.handle(&RequestContext::from_request(&req)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/xml"));
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let xml = String::from_utf8_lossy(&body);
        assert!(xml.contains("<loc>https://accoop.com</loc>"));
        assert!(xml.contains("<loc>https://accoop.com/about</loc>"));
        assert!(!xml.contains("_not-found"));
        assert!(!xml.contains("/404"));
    }

    #[test]
    fn test_build_sitemap_rules() {
        let routes: Vec<String> = ["/", "/news", "/vendors"].iter().map(ToString::to_string).collect();
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let xml = build_sitemap("https://accoop.com", &routes, date);

        let home = "<loc>https://accoop.com</loc>\n    <lastmod>2026-10-16</lastmod>\n    \
                    <changefreq>monthly</changefreq>\n    <priority>1.0</priority>";
        let news = "<loc>https://accoop.com/news</loc>\n    <lastmod>2026-10-16</lastmod>\n    \
                    <changefreq>weekly</changefreq>\n    <priority>0.8</priority>";
        let vendors = "<loc>https://accoop.com/vendors</loc>\n    <lastmod>2026-10-16</lastmod>\n    \
                       <changefreq>monthly</changefreq>\n    <priority>0.8</priority>";
        assert!(xml.contains(home), "{xml}");
        assert!(xml.contains(news), "{xml}");
        assert!(xml.contains(vendors), "{xml}");
        assert_eq!(xml.matches("<url>").count(), 3);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a&b<c>"), "a&amp;b&lt;c&gt;");
    }
}
