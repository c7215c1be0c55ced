//! Server side of the offline client's caching contract.
//!
//! The browser service worker serves the app shell cache-first, other GETs
//! network-first with a cache fallback, and never caches POSTs. Responses are
//! tagged with a matching `Cache-Control` so HTTP caches agree with it.

use axum::{
    extract::{Request, State},
    http::{header::CACHE_CONTROL, HeaderValue, Method},
    middleware::Next,
    response::Response,
};

/// App shell the service worker pre-caches
pub const STATIC_ASSETS: &[&str] = &["/", "/index.html", "/manifest.json", "/service-worker.js"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStrategy {
    CacheFirst,
    NetworkFirst,
    NetworkOnly,
}

impl CacheStrategy {
    pub fn classify(method: &Method, path: &str) -> Self {
        if method != Method::GET && method != Method::HEAD {
            return CacheStrategy::NetworkOnly;
        }

        if path == "/" || STATIC_ASSETS.iter().skip(1).any(|asset| path.ends_with(asset)) {
            CacheStrategy::CacheFirst
        } else {
            CacheStrategy::NetworkFirst
        }
    }

    pub fn cache_control(&self, static_max_age_secs: u64) -> HeaderValue {
        match self {
            CacheStrategy::CacheFirst => HeaderValue::from_str(&format!("public, max-age={}", static_max_age_secs))
                .unwrap_or_else(|_| HeaderValue::from_static("no-cache")),
            CacheStrategy::NetworkFirst => HeaderValue::from_static("no-cache"),
            CacheStrategy::NetworkOnly => HeaderValue::from_static("no-store"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub static_max_age_secs: u64,
}

/// Adds `Cache-Control` unless the handler already chose one
pub async fn apply_cache_policy(
    State(policy): State<CachePolicy>,
    request: Request,
    next: Next,
) -> Response {
    let strategy = CacheStrategy::classify(request.method(), request.uri().path());
    let mut response = next.run(request).await;

    response
        .headers_mut()
        .entry(CACHE_CONTROL)
        .or_insert_with(|| strategy.cache_control(policy.static_max_age_secs));

    response
}
