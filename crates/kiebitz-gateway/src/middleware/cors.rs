//! CORS layer, wrapping `tower_http`'s.

use axum::http::HeaderName;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::domain::CorsConfig;

/// Build a `tower_http` CORS layer from gateway configuration.
pub fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::very_permissive();
    }

    let mut cors = CorsLayer::new();

    if config.allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config.allowed_origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors = cors.allow_origin(origins);
    }

    if config.allowed_headers.iter().any(|h| h == "*") {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<HeaderName> = config
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    cors.max_age(Duration::from_secs(config.max_age_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_cors_is_very_permissive() {
        let config = CorsConfig { enabled: false, ..CorsConfig::default() };
        let _layer = create_cors_layer(&config);
    }

    #[test]
    fn wildcard_origin_builds_without_panicking() {
        let _layer = create_cors_layer(&CorsConfig::default());
    }

    #[test]
    fn specific_origin_builds_without_panicking() {
        let config = CorsConfig {
            enabled: true,
            allowed_origins: vec!["https://example.com".into()],
            allowed_headers: vec!["content-type".into()],
            max_age_secs: 600,
        };
        let _layer = create_cors_layer(&config);
    }
}
