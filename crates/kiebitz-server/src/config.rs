//! Settings assembly: `KIEBITZ_SETTINGS` names one or more JSON files,
//! colon-separated, merged shallowly in listed order (later files
//! overriding earlier top-level keys), into one [`Settings`] struct.

use std::collections::HashMap;
use std::env;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Everything a running server needs beyond the storage connection itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    /// Postgres connection string.
    pub database_url: String,
    /// The server's root signing key, base64 SEC1-encoded.
    pub root_public_key: String,
    /// Private half of the token-signing keypair, base64 SEC1-encoded
    /// (the public half is derived from it at startup).
    pub token_private_key: String,
    /// Shared secret used to HMAC priority tokens into their stored,
    /// spendable identity.
    pub server_secret: String,
    /// `RUST_LOG`-style tracing filter, e.g. `"kiebitz_server=info,tower_http=info"`.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Per-request timeout before a `503` is returned.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_listen_address() -> String {
    "0.0.0.0:9999".to_string()
}

fn default_log_filter() -> String {
    "kiebitz_server=info,kiebitz_gateway=info,tower_http=info".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Everything that can go wrong assembling settings before the server can
/// even try to bind a socket.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// `KIEBITZ_SETTINGS` was unset.
    #[error("KIEBITZ_SETTINGS is not set")]
    MissingEnvVar,
    /// One of the listed files could not be read.
    #[error("reading settings file {path}: {source}")]
    Read { path: String, source: std::io::Error },
    /// One of the listed files was not valid JSON.
    #[error("parsing settings file {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
    /// The merged object did not satisfy `Settings`'s required fields.
    #[error("merged settings are incomplete: {0}")]
    Incomplete(serde_json::Error),
}

/// Load and merge every file named in `KIEBITZ_SETTINGS` (colon-separated,
/// applied in listed order).
pub fn load_from_env() -> Result<Settings, SettingsError> {
    let raw = env::var("KIEBITZ_SETTINGS").map_err(|_| SettingsError::MissingEnvVar)?;
    load_from_paths(raw.split(':').filter(|p| !p.is_empty()))
}

/// Load and merge an explicit list of settings file paths, for tests and
/// tools that don't want to touch the environment.
pub fn load_from_paths<I, P>(paths: I) -> Result<Settings, SettingsError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut merged = serde_json::Map::new();
    for path in paths {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let layer: HashMap<String, serde_json::Value> =
            serde_json::from_str(&text).map_err(|e| SettingsError::Parse {
                path: path.display().to_string(),
                source: e,
            })?;
        merged.extend(layer);
    }
    serde_json::from_value(serde_json::Value::Object(merged)).map_err(SettingsError::Incomplete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn later_files_override_earlier_top_level_keys() {
        let base = write_temp(
            r#"{"databaseUrl":"postgres://base","rootPublicKey":"r","tokenPrivateKey":"t","serverSecret":"s"}"#,
        );
        let override_file = write_temp(r#"{"databaseUrl":"postgres://override"}"#);

        let settings = load_from_paths([base.path(), override_file.path()]).unwrap();
        assert_eq!(settings.database_url, "postgres://override");
    }

    #[test]
    fn missing_required_field_is_incomplete() {
        let base = write_temp(r#"{"rootPublicKey":"r"}"#);
        let err = load_from_paths([base.path()]).unwrap_err();
        assert!(matches!(err, SettingsError::Incomplete(_)));
    }

    #[test]
    fn defaults_fill_in_when_omitted() {
        let base = write_temp(
            r#"{"databaseUrl":"postgres://base","rootPublicKey":"r","tokenPrivateKey":"t","serverSecret":"s"}"#,
        );
        let settings = load_from_paths([base.path()]).unwrap();
        assert_eq!(settings.listen_address, "0.0.0.0:9999");
        assert_eq!(settings.request_timeout_secs, 30);
    }
}
