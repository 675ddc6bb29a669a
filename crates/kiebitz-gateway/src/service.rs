//! Top-level HTTP service: binds the JSON-RPC and REST routers over one
//! [`AppState`], layers CORS, request timeout and request tracing, and
//! serves until asked to stop.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use kiebitz_storage::{BookingGateway, Database, LockManager};
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::domain::{GatewayConfig, GatewayError};
use crate::middleware::create_cors_layer;
use crate::rest::rest_router;
use crate::rpc::handle_json_rpc;
use crate::state::AppState;

/// Owns the listener lifecycle for one gateway instance.
pub struct ApiGatewayService<D, G> {
    config: GatewayConfig,
    state: Arc<AppState<D, G>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl<D, G> ApiGatewayService<D, G>
where
    D: Database + LockManager + Send + Sync + 'static,
    G: BookingGateway + Send + Sync + 'static,
{
    pub fn new(config: GatewayConfig, state: Arc<AppState<D, G>>) -> Self {
        Self { config, state, shutdown_tx: None }
    }

    fn build_router(&self) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(create_cors_layer(&self.config.cors))
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(std::time::Duration::from_secs(self.config.request_timeout_secs)));

        Router::new()
            .route("/rpc", post(json_rpc_handler::<D, G>))
            .route("/health", get(health_check))
            .merge(rest_router::<D, G>())
            .layer(middleware)
            .with_state(self.state.clone())
    }

    /// Bind the listen address and serve until `shutdown` is called or the
    /// listener itself fails.
    pub async fn start(&mut self) -> Result<(), GatewayError> {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let router = self.build_router();
        let listener = tokio::net::TcpListener::bind(&self.config.listen_address)
            .await
            .map_err(|e| GatewayError::InvalidParams(format!("cannot bind {}: {e}", self.config.listen_address)))?;

        info!(addr = %self.config.listen_address, "gateway listening");

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;

        if let Err(e) = result {
            error!(error = %e, "gateway server error");
        }
        info!("gateway stopped");
        Ok(())
    }

    /// Signal the running server to shut down gracefully.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn json_rpc_handler<D, G>(State(state): State<Arc<AppState<D, G>>>, body: String) -> impl IntoResponse
where
    D: Database + LockManager,
    G: BookingGateway,
{
    Json(handle_json_rpc(&state, &body).await)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "kiebitz-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
