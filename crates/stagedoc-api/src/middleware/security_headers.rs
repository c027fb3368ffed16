//! Security headers middleware.
//!
//! Reasserts clickjacking and content-security policy on every response,
//! replacing whatever an upstream layer may have set. The CSP keeps the
//! document and its viewer assets loadable from the hosting origin plus an
//! explicit allow-list of external asset origins, and restricts framing to
//! the same origin.

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SecurityHeadersConfig {
    asset_origins: Vec<String>,
}

impl SecurityHeadersConfig {
    pub fn new(asset_origins: Vec<String>) -> Self {
        Self { asset_origins }
    }

    /// Build the Content-Security-Policy value. `object-src 'self'` is what
    /// lets browsers render the PDF bytes inline.
    pub fn build_csp(&self) -> String {
        let with_origins = |base: &str| {
            let mut directive = base.to_string();
            for origin in &self.asset_origins {
                directive.push(' ');
                directive.push_str(origin);
            }
            directive
        };

        [
            "default-src 'self'".to_string(),
            with_origins("script-src 'self'"),
            with_origins("style-src 'self' 'unsafe-inline'"),
            with_origins("img-src 'self' data:"),
            with_origins("font-src 'self' data:"),
            "object-src 'self'".to_string(),
            "frame-ancestors 'self'".to_string(),
        ]
        .join("; ")
    }
}

pub async fn security_headers_middleware(
    State(config): State<Arc<SecurityHeadersConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Frame-Options", HeaderValue::from_static("SAMEORIGIN"));
    if let Ok(value) = HeaderValue::from_str(&config.build_csp()) {
        headers.insert("Content-Security-Policy", value);
    }

    response
}
