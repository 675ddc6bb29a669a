//! Binary entry point: loads settings from `KIEBITZ_SETTINGS`, connects to
//! Postgres, assembles the service set, and serves the gateway until a
//! shutdown signal arrives.
//!
//! Exit code `0` on graceful shutdown; any startup failure (missing
//! settings, unreachable database, malformed keys) exits non-zero after
//! logging the cause.

mod config;

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use kiebitz_core::ports::TracingMetricsSink;
use kiebitz_crypto::{KeyPair, PublicKey};
use kiebitz_gateway::{AppState, ApiGatewayService, GatewayConfig};
use kiebitz_storage::adapters::PostgresStore;
use tracing_subscriber::EnvFilter;

use config::Settings;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("kiebitz-server: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let settings = config::load_from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("starting kiebitz-server");

    let state = Arc::new(build_state(&settings).await?);

    let gateway_config = GatewayConfig {
        listen_address: settings.listen_address.clone(),
        request_timeout_secs: settings.request_timeout_secs,
        ..GatewayConfig::default()
    };

    let mut service = ApiGatewayService::new(gateway_config, state);

    tokio::select! {
        result = service.start() => {
            result.map_err(|e| anyhow::anyhow!("gateway error: {e}"))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received shutdown signal");
            service.shutdown();
        }
    }

    tracing::info!("kiebitz-server stopped");
    Ok(())
}

async fn build_state(settings: &Settings) -> anyhow::Result<AppState<PostgresStore, PostgresStore>> {
    let database = Arc::new(PostgresStore::connect(&settings.database_url).await?);

    let root_key = decode_public_key(&settings.root_public_key)?;
    let token_signing_key = decode_private_key(&settings.token_private_key)?;
    let token_key = token_signing_key.public_key();
    let server_secret = BASE64
        .decode(&settings.server_secret)
        .map_err(|e| anyhow::anyhow!("serverSecret is not valid base64: {e}"))?;

    Ok(AppState::new(
        database.clone(),
        database,
        root_key,
        token_key,
        token_signing_key,
        server_secret,
        Arc::new(TracingMetricsSink),
    ))
}

fn decode_public_key(encoded: &str) -> anyhow::Result<PublicKey> {
    let bytes = BASE64.decode(encoded).map_err(|e| anyhow::anyhow!("invalid base64 public key: {e}"))?;
    PublicKey::from_sec1_bytes(&bytes).map_err(|e| anyhow::anyhow!("invalid public key: {e}"))
}

fn decode_private_key(encoded: &str) -> anyhow::Result<KeyPair> {
    let bytes = BASE64.decode(encoded).map_err(|e| anyhow::anyhow!("invalid base64 private key: {e}"))?;
    let array: [u8; 32] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("private key must be exactly 32 bytes"))?;
    KeyPair::from_bytes(&array).map_err(|e| anyhow::anyhow!("invalid private key: {e}"))
}
