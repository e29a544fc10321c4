//! `Cache-Control` for cacheable public endpoints.
//!
//! ```ignore
//! use schoolboard_core::cache_control::{cache_control, CacheControlConfig};
//!
//! let app = Router::new()
//!     .route("/api/public/info", get(handler))
//!     .route_layer(cache_control(
//!         CacheControlConfig::public(0)
//!             .with_s_maxage(3600)
//!             .with_stale_while_revalidate(86400),
//!     ));
//! ```

use axum::{
    body::Body,
    http::{HeaderValue, Response, header::CACHE_CONTROL},
};
use tower_http::set_header::SetResponseHeaderLayer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheControlConfig {
    /// Cacheable by shared caches (public) or only the browser (private).
    pub public: bool,
    pub max_age: u64,
    pub must_revalidate: bool,
    pub no_cache: bool,
    pub no_store: bool,
    /// Shared cache max age (CDNs and proxies).
    pub s_maxage: Option<u64>,
    pub stale_while_revalidate: Option<u64>,
}

impl CacheControlConfig {
    pub fn public(max_age: u64) -> Self {
        Self {
            public: true,
            max_age,
            must_revalidate: false,
            no_cache: false,
            no_store: false,
            s_maxage: None,
            stale_while_revalidate: None,
        }
    }

    pub fn private(max_age: u64) -> Self {
        Self {
            public: false,
            ..Self::public(max_age)
        }
    }

    pub fn no_store() -> Self {
        Self {
            public: false,
            no_store: true,
            ..Self::public(0)
        }
    }

    #[must_use]
    pub fn with_s_maxage(mut self, seconds: u64) -> Self {
        self.s_maxage = Some(seconds);
        self
    }

    #[must_use]
    pub fn with_stale_while_revalidate(mut self, seconds: u64) -> Self {
        self.stale_while_revalidate = Some(seconds);
        self
    }

    #[must_use]
    pub fn must_revalidate(mut self) -> Self {
        self.must_revalidate = true;
        self
    }

    pub fn to_header_value(&self) -> String {
        if self.no_store {
            return "no-store".to_string();
        }

        let mut directives = Vec::new();

        directives.push(if self.public { "public" } else { "private" }.to_string());

        if self.no_cache {
            directives.push("no-cache".to_string());
        }

        directives.push(format!("max-age={}", self.max_age));

        if let Some(s_maxage) = self.s_maxage {
            directives.push(format!("s-maxage={s_maxage}"));
        }

        if let Some(swr) = self.stale_while_revalidate {
            directives.push(format!("stale-while-revalidate={swr}"));
        }

        if self.must_revalidate {
            directives.push("must-revalidate".to_string());
        }

        directives.join(", ")
    }
}

/// Layer that stamps `Cache-Control` on successful responses.
///
/// Error responses are left alone so a CDN never caches a 500.
pub fn cache_control(
    config: CacheControlConfig,
) -> SetResponseHeaderLayer<impl Fn(&Response<Body>) -> Option<HeaderValue> + Clone + Send + Sync + 'static>
{
    let value = HeaderValue::from_str(&config.to_header_value())
        .unwrap_or_else(|_| HeaderValue::from_static("no-store"));

    SetResponseHeaderLayer::overriding(CACHE_CONTROL, move |response: &Response<Body>| {
        response.status().is_success().then(|| value.clone())
    })
}
