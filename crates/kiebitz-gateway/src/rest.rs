//! REST transport: one route per named call, each assembling the same
//! positional `params` array the JSON-RPC transport builds from
//! `{jsonrpc, method, params}`, then calling into the one [`dispatch`]
//! table. Mutating and signature-gated calls take the envelope (and,
//! where relevant, the spent-token pair) as a JSON body; purely anonymous
//! lookups take path segments.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use axum::Router;
use kiebitz_storage::{BookingGateway, Database, LockManager};
use serde_json::Value;

use crate::dispatch::dispatch;
use crate::domain::GatewayError;
use crate::state::AppState;

fn error_response(err: GatewayError) -> Response {
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

async fn run<D, G>(state: &AppState<D, G>, method: &str, params: Vec<Value>) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    match dispatch(state, method, &params).await {
        Ok(value) => Json(value).into_response(),
        Err(e) => error_response(e),
    }
}

/// Build the REST router over a shared `AppState`.
pub fn rest_router<D, G>() -> Router<Arc<AppState<D, G>>>
where
    D: Database + LockManager + Send + Sync + 'static,
    G: BookingGateway + Send + Sync + 'static,
{
    Router::new()
        .route("/keys", get(get_keys::<D, G>))
        .route("/stats", get(get_stats::<D, G>))
        .route("/providers/zip/:zip_from/:zip_to", get(get_providers_by_zip_code::<D, G>))
        .route(
            "/appointments/aggregated/:date/:zip_from/:zip_to",
            get(get_appointments_aggregated::<D, G>),
        )
        .route("/appointment/:appointment_id/:provider_id", get(get_appointment::<D, G>))
        .route("/token", post(get_token::<D, G>))
        .route("/appointments/book", put(book_appointment::<D, G>))
        .route("/appointments/cancel", put(cancel_appointment::<D, G>))
        .route("/providers/check", post(check_provider_data::<D, G>))
        .route("/providers/data", post(store_provider_data::<D, G>))
        .route("/appointments/publish", put(publish_appointments::<D, G>))
        .route("/providers/appointments", post(get_provider_appointments::<D, G>))
        .route(
            "/providers/appointments/property",
            post(get_provider_appointments_by_property::<D, G>),
        )
        .route("/validate/user", post(is_valid_user::<D, G>))
        .route("/validate/provider", post(is_valid_provider::<D, G>))
        .route("/providers/confirm", put(confirm_provider::<D, G>))
        .route("/providers/pending", post(get_pending_provider_data::<D, G>))
        .route("/providers/list", post(get_providers::<D, G>))
        .route("/providers/:id", post(get_provider_data::<D, G>))
}

async fn get_keys<D, G>(State(state): State<Arc<AppState<D, G>>>) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    run(&state, "getKeys", vec![]).await
}

async fn get_stats<D, G>(State(state): State<Arc<AppState<D, G>>>) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    run(&state, "getStats", vec![]).await
}

async fn get_providers_by_zip_code<D, G>(
    State(state): State<Arc<AppState<D, G>>>,
    Path((zip_from, zip_to)): Path<(String, String)>,
) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    run(&state, "getProvidersByZipCode", vec![zip_from.into(), zip_to.into()]).await
}

async fn get_appointments_aggregated<D, G>(
    State(state): State<Arc<AppState<D, G>>>,
    Path((date, zip_from, zip_to)): Path<(String, String, String)>,
) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    run(&state, "getAppointmentsAggregated", vec![date.into(), zip_from.into(), zip_to.into()]).await
}

async fn get_appointment<D, G>(
    State(state): State<Arc<AppState<D, G>>>,
    Path((appointment_id, provider_id)): Path<(String, String)>,
) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    run(&state, "getAppointment", vec![appointment_id.into(), provider_id.into()]).await
}

async fn get_token<D, G>(State(state): State<Arc<AppState<D, G>>>, Json(envelope): Json<Value>) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    run(&state, "getToken", vec![envelope]).await
}

#[derive(serde::Deserialize)]
struct EnvelopeAndToken {
    envelope: Value,
    token: Value,
}

async fn book_appointment<D, G>(
    State(state): State<Arc<AppState<D, G>>>,
    Json(body): Json<EnvelopeAndToken>,
) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    run(&state, "bookAppointment", vec![body.envelope, body.token]).await
}

async fn cancel_appointment<D, G>(
    State(state): State<Arc<AppState<D, G>>>,
    Json(body): Json<EnvelopeAndToken>,
) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    run(&state, "cancelAppointment", vec![body.envelope, body.token]).await
}

async fn check_provider_data<D, G>(
    State(state): State<Arc<AppState<D, G>>>,
    Json(envelope): Json<Value>,
) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    run(&state, "checkProviderData", vec![envelope]).await
}

async fn store_provider_data<D, G>(
    State(state): State<Arc<AppState<D, G>>>,
    Json(envelope): Json<Value>,
) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    run(&state, "storeProviderData", vec![envelope]).await
}

async fn publish_appointments<D, G>(
    State(state): State<Arc<AppState<D, G>>>,
    Json(envelope): Json<Value>,
) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    run(&state, "publishAppointments", vec![envelope]).await
}

#[derive(serde::Deserialize)]
struct ProviderAppointmentsQuery {
    envelope: Value,
    #[serde(default)]
    updated_since: Option<Value>,
}

async fn get_provider_appointments<D, G>(
    State(state): State<Arc<AppState<D, G>>>,
    Json(body): Json<ProviderAppointmentsQuery>,
) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let updated_since = body.updated_since.unwrap_or(Value::Null);
    run(&state, "getProviderAppointments", vec![body.envelope, updated_since]).await
}

#[derive(serde::Deserialize)]
struct ProviderAppointmentsByPropertyQuery {
    envelope: Value,
    key: String,
    value: String,
}

async fn get_provider_appointments_by_property<D, G>(
    State(state): State<Arc<AppState<D, G>>>,
    Json(body): Json<ProviderAppointmentsByPropertyQuery>,
) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    run(
        &state,
        "getProviderAppointmentsByProperty",
        vec![body.envelope, body.key.into(), body.value.into()],
    )
    .await
}

async fn is_valid_user<D, G>(
    State(state): State<Arc<AppState<D, G>>>,
    Json(body): Json<EnvelopeAndToken>,
) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    run(&state, "isValidUser", vec![body.envelope, body.token]).await
}

async fn is_valid_provider<D, G>(
    State(state): State<Arc<AppState<D, G>>>,
    Json(public_key): Json<Value>,
) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    run(&state, "isValidProvider", vec![public_key]).await
}

async fn confirm_provider<D, G>(
    State(state): State<Arc<AppState<D, G>>>,
    Json(envelope): Json<Value>,
) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    run(&state, "confirmProvider", vec![envelope]).await
}

async fn get_pending_provider_data<D, G>(
    State(state): State<Arc<AppState<D, G>>>,
    Json(envelope): Json<Value>,
) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    run(&state, "getPendingProviderData", vec![envelope]).await
}

async fn get_providers<D, G>(State(state): State<Arc<AppState<D, G>>>, Json(envelope): Json<Value>) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    run(&state, "getProviders", vec![envelope]).await
}

async fn get_provider_data<D, G>(
    State(state): State<Arc<AppState<D, G>>>,
    Path(id): Path<String>,
    Json(envelope): Json<Value>,
) -> Response
where
    D: Database + LockManager,
    G: BookingGateway,
{
    run(&state, "getProviderData", vec![envelope, id.into()]).await
}
