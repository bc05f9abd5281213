//! Request routing for intercepted asset paths.
//!
//! Two URL families are answered from the store:
//!
//! - `/internal/extensions/{id}/{relative path}`
//! - `/internal/themes/{category}/{filename}`
//!
//! Anything else resolves to `None` and is passed through untouched.

use std::sync::Arc;

use crate::config::DEFAULT_CACHE_CONTROL;
use crate::extensions::EXTENSIONS_ROOT;
use crate::store::path::{is_single_segment, is_under, join_path, normalize_path};
use crate::store::VirtualStore;
use crate::themes::Category;

const EXTENSIONS_PREFIX: &str = "/internal/extensions/";
const THEMES_PREFIX: &str = "/internal/themes/";

/// Body of every not-found response.
pub const NOT_FOUND_BODY: &str = "File not found";

/// An intercepted request, mapped onto the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Extension { id: String, path: String },
    Theme { category: Category, filename: String },
}

impl Route {
    /// Absolute store path the route reads from, or `None` if the request
    /// tries to climb out of its namespace. Theme files live directly in
    /// their category directory, so a nested theme filename has no path.
    pub fn store_path(&self) -> Option<String> {
        let (base, rest) = match self {
            Route::Extension { id, path } => (join_path(EXTENSIONS_ROOT, id), path.as_str()),
            Route::Theme { category, filename } => {
                if !is_single_segment(filename) {
                    return None;
                }
                (category.dir().to_string(), filename.as_str())
            }
        };
        let full = normalize_path(&join_path(&base, rest)).ok()?;
        (is_under(&full, &base) && full != base).then_some(full)
    }
}

/// A response produced for an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub cache_control: Option<String>,
    pub body: Vec<u8>,
}

impl AssetResponse {
    pub fn not_found() -> Self {
        Self {
            status: 404,
            content_type: "text/plain",
            cache_control: None,
            body: NOT_FOUND_BODY.as_bytes().to_vec(),
        }
    }
}

/// Maps request paths to store reads.
#[derive(Clone)]
pub struct AssetRouter {
    store: Arc<dyn VirtualStore>,
    cache_control: String,
}

impl AssetRouter {
    pub fn new(store: Arc<dyn VirtualStore>) -> Self {
        Self::with_cache_control(store, DEFAULT_CACHE_CONTROL)
    }

    pub fn with_cache_control(store: Arc<dyn VirtualStore>, cache_control: impl Into<String>) -> Self {
        Self {
            store,
            cache_control: cache_control.into(),
        }
    }

    /// Match a request path against the intercepted URL families.
    ///
    /// The path is percent-decoded first; escapes that do not decode to
    /// UTF-8 are replaced rather than dropping the request. Theme paths with
    /// an unknown category are not intercepted.
    pub fn resolve(request_path: &str) -> Option<Route> {
        let decoded = match urlencoding::decode(request_path) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => {
                let bytes = urlencoding::decode_binary(request_path.as_bytes());
                String::from_utf8_lossy(&bytes).into_owned()
            }
        };

        if let Some(rest) = decoded.strip_prefix(EXTENSIONS_PREFIX) {
            let (id, path) = rest.split_once('/')?;
            if id.is_empty() {
                return None;
            }
            return Some(Route::Extension {
                id: id.to_string(),
                path: path.to_string(),
            });
        }

        if let Some(rest) = decoded.strip_prefix(THEMES_PREFIX) {
            let (category, filename) = rest.split_once('/')?;
            let category = category.parse::<Category>().ok()?;
            return Some(Route::Theme {
                category,
                filename: filename.to_string(),
            });
        }

        None
    }

    /// Answer an intercepted request from the store.
    ///
    /// `None` means the request is not ours. Read failures become a 404 and
    /// are not retried.
    pub async fn serve(&self, request_path: &str) -> Option<AssetResponse> {
        let route = Self::resolve(request_path)?;

        let Some(path) = route.store_path() else {
            tracing::warn!("Refusing to serve {}: not a file in its namespace", request_path);
            return Some(AssetResponse::not_found());
        };

        match self.store.read(&path).await {
            Ok(body) => Some(AssetResponse {
                status: 200,
                content_type: mime_type(&path),
                cache_control: Some(self.cache_control.clone()),
                body,
            }),
            Err(e) => {
                tracing::debug!("Not serving {}: {}", path, e);
                Some(AssetResponse::not_found())
            }
        }
    }
}

/// Content type for a path, by its lower-cased extension.
pub fn mime_type(path: &str) -> &'static str {
    let name = path.rsplit('/').next().unwrap_or(path);
    let ext = match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return "application/octet-stream",
    };

    match ext.as_str() {
        "html" => "text/html",
        "js" => "application/javascript",
        "css" => "text/css",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}
