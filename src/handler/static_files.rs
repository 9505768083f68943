//! Static file serving module
//!
//! Resolves request paths inside a base directory, loads the file and builds
//! the cached asset response. Every failure here means "not served": the
//! caller falls through to whatever handles the request next.

use std::io;
use std::path::{Component, Path, PathBuf};

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use tokio::fs;

use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime};
use crate::logger;

/// A directory that files are served from.
///
/// Both paths are fixed at construction; resolved files must stay under
/// `canonical` after symlinks are followed.
#[derive(Debug, Clone)]
pub struct AssetRoot {
    base: PathBuf,
    canonical: PathBuf,
}

/// Why a URL path could not be mapped under an [`AssetRoot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRejection {
    /// Percent-decoding did not produce UTF-8
    Undecodable,
    /// Climbs above the root or carries a NUL, backslash or non-plain segment
    Unsafe,
}

/// A file loaded from an [`AssetRoot`]
#[derive(Debug)]
pub struct Asset {
    pub content: Bytes,
    pub content_type: &'static str,
}

impl AssetRoot {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let base = absolutize(dir.as_ref());
        let canonical = std::fs::canonicalize(&base).unwrap_or_else(|_| base.clone());
        Self { base, canonical }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Map a URL path onto a path under the base directory.
    ///
    /// The path is percent-decoded and normalized segment by segment. Decoded
    /// `%2F` acts as a separator like a literal `/`.
    pub fn resolve(&self, url_path: &str) -> Result<PathBuf, PathRejection> {
        let decoded = urlencoding::decode(url_path).map_err(|_| PathRejection::Undecodable)?;
        if decoded.contains('\0') {
            return Err(PathRejection::Unsafe);
        }

        let mut relative = PathBuf::new();
        for segment in decoded.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if !relative.pop() {
                        return Err(PathRejection::Unsafe);
                    }
                }
                name => {
                    if name.contains('\\') {
                        return Err(PathRejection::Unsafe);
                    }
                    let mut components = Path::new(name).components();
                    match (components.next(), components.next()) {
                        (Some(Component::Normal(_)), None) => relative.push(name),
                        _ => return Err(PathRejection::Unsafe),
                    }
                }
            }
        }

        Ok(self.base.join(relative))
    }

    /// Load the regular file a URL path points at, if any
    pub async fn load(&self, url_path: &str) -> Option<Asset> {
        let candidate = match self.resolve(url_path) {
            Ok(path) => path,
            Err(PathRejection::Undecodable) => {
                logger::log_debug(&format!("Request path is not valid UTF-8: {url_path}"));
                return None;
            }
            Err(PathRejection::Unsafe) => {
                logger::log_warning(&format!(
                    "Path traversal attempt blocked: {url_path} (root {})",
                    self.base.display()
                ));
                return None;
            }
        };

        let metadata = match fs::metadata(&candidate).await {
            Ok(m) => m,
            Err(e) => {
                log_absorbed(&candidate, &e);
                return None;
            }
        };
        if !metadata.is_file() {
            return None;
        }

        // Symlinks may point anywhere; check where the file really lives
        let real_path = match fs::canonicalize(&candidate).await {
            Ok(p) => p,
            Err(e) => {
                log_absorbed(&candidate, &e);
                return None;
            }
        };
        if !real_path.starts_with(&self.canonical) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {url_path} -> {}",
                real_path.display()
            ));
            return None;
        }

        let content = match fs::read(&real_path).await {
            Ok(c) => c,
            Err(e) => {
                log_absorbed(&real_path, &e);
                return None;
            }
        };

        Some(Asset {
            content: Bytes::from(content),
            content_type: mime::content_type_for(&candidate),
        })
    }
}

/// Serve a file from `root` as an immutable asset, or `None` to fall through
pub async fn serve_asset(
    root: &AssetRoot,
    ctx: &RequestContext<'_>,
    url_path: &str,
) -> Option<Response<Full<Bytes>>> {
    let asset = root.load(url_path).await?;
    let etag = cache::generate_etag(&asset.content);

    if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
        return Some(http::build_304_response(&etag, cache::IMMUTABLE));
    }

    Some(http::build_asset_response(
        asset.content,
        asset.content_type,
        &etag,
        ctx.is_head,
    ))
}

/// Resolve a configured directory against the working directory
pub fn absolutize(dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        return dir.to_path_buf();
    }
    std::env::current_dir().map_or_else(|_| dir.to_path_buf(), |cwd| cwd.join(dir))
}

/// Missing files are routine; anything else is worth a warning even though
/// the request still falls through
fn log_absorbed(path: &Path, err: &io::Error) {
    if err.kind() == io::ErrorKind::NotFound {
        return;
    }
    logger::log_warning(&format!("Skipping '{}': {err}", path.display()));
}
