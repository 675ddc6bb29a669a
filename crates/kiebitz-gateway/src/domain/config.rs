//! Gateway-level configuration: listen address and CORS policy. Signing
//! keys, database connection strings and the rest of the deployment's
//! settings are assembled one layer up, in `kiebitz-server::config`.

/// CORS policy for the HTTP surface.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Whether CORS is enforced at all. When `false`, every origin is
    /// allowed — suitable for local development only.
    pub enabled: bool,
    /// Allowed origins, or `["*"]` for any.
    pub allowed_origins: Vec<String>,
    /// Allowed request headers, or `["*"]` for any.
    pub allowed_headers: Vec<String>,
    /// Seconds a preflight response may be cached.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_headers: vec!["content-type".to_string()],
            max_age_secs: 3600,
        }
    }
}

/// Everything the gateway's transport layer needs beyond the services it
/// wraps.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address the HTTP listener binds to, e.g. `"0.0.0.0:9999"`.
    pub listen_address: String,
    /// CORS policy applied to every route.
    pub cors: CorsConfig,
    /// Per-request timeout before a `503` is returned.
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:9999".to_string(),
            cors: CorsConfig::default(),
            request_timeout_secs: 30,
        }
    }
}
