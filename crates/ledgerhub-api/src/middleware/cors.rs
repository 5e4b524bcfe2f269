//! CORS layer configuration.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{Any, CorsLayer};

use ledgerhub_core::config::ServerConfig;

use super::subscription::SUBSCRIPTION_WARNING_HEADER;

/// Build the CORS layer for `server.cors_allowed_origins`.
///
/// An empty list allows no cross-origin callers; `"*"` allows any. Browser
/// clients need to read the lockout and grace-period headers, so both are
/// exposed.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-device-name"),
        ])
        .expose_headers([
            header::RETRY_AFTER,
            HeaderName::from_static(SUBSCRIPTION_WARNING_HEADER),
        ])
        .max_age(Duration::from_secs(3600));

    if config.cors_allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    layer.allow_origin(origins)
}
