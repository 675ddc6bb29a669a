//! The single method table both transports route through.
//!
//! Each named call resolves to exactly one handler function; that handler
//! owns whichever auth gate the call requires (ungated, self-signed,
//! mediator, provider, or user) and calls straight into the `kiebitz-core`
//! service that implements it. JSON-RPC passes `params` positionally;
//! REST routes assemble the same `params` array from path segments and
//! query parameters before calling [`dispatch`].

pub mod appointments;
pub mod booking;
pub mod keys;
pub mod providers;
pub mod stats;
pub mod tokens;

use kiebitz_storage::{BookingGateway, Database, LockManager};
use serde_json::Value;

use crate::domain::GatewayError;
use crate::state::AppState;

/// Every method name this gateway answers to.
pub const METHOD_NAMES: &[&str] = &[
    "getKeys",
    "getStats",
    "getProvidersByZipCode",
    "getAppointmentsAggregated",
    "getAppointment",
    "getToken",
    "bookAppointment",
    "cancelAppointment",
    "checkProviderData",
    "storeProviderData",
    "publishAppointments",
    "getProviderAppointments",
    "getProviderAppointmentsByProperty",
    "isValidUser",
    "isValidProvider",
    "confirmProvider",
    "getPendingProviderData",
    "getProviders",
    "getProviderData",
];

/// Resolve `method` against the table above and run it with `params`.
pub async fn dispatch<D, G>(
    state: &AppState<D, G>,
    method: &str,
    params: &[Value],
) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    match method {
        "getKeys" => keys::get_keys(state),
        "getStats" => stats::get_stats(state).await,
        "getProvidersByZipCode" => providers::get_providers_by_zip_code(state, params).await,
        "getAppointmentsAggregated" => appointments::get_appointments_aggregated(state, params).await,
        "getAppointment" => appointments::get_appointment(state, params).await,
        "getToken" => tokens::get_token(state, params).await,
        "bookAppointment" => booking::book_appointment(state, params).await,
        "cancelAppointment" => booking::cancel_appointment(state, params).await,
        "checkProviderData" => providers::check_provider_data(state, params).await,
        "storeProviderData" => providers::store_provider_data(state, params).await,
        "publishAppointments" => appointments::publish_appointments(state, params).await,
        "getProviderAppointments" => appointments::get_provider_appointments(state, params).await,
        "getProviderAppointmentsByProperty" => {
            appointments::get_provider_appointments_by_property(state, params).await
        }
        "isValidUser" => tokens::is_valid_user(state, params).await,
        "isValidProvider" => providers::is_valid_provider(state, params).await,
        "confirmProvider" => providers::confirm_provider(state, params).await,
        "getPendingProviderData" => providers::get_pending_provider_data(state, params).await,
        "getProviders" => providers::get_providers(state, params).await,
        "getProviderData" => providers::get_provider_data(state, params).await,
        other => Err(GatewayError::MethodNotFound(other.to_string())),
    }
}
