//! Appointment publishing, provider/anonymous views, and the zip-scoped
//! aggregated discovery feed.

use chrono::{DateTime, NaiveDate, Utc};
use kiebitz_core::domain::KeyChain;
use kiebitz_core::PublishAppointmentsData;
use kiebitz_storage::{BookingGateway, Database, LockManager};
use kiebitz_types::{ServiceError, SignedEnvelope};
use serde_json::Value;

use crate::dispatch::providers::providers_in_zip_range;
use crate::domain::GatewayError;
use crate::forms::{parse_id, parse_param, parse_param_optional};
use crate::state::AppState;

/// A provider replaces its published appointment set.
pub async fn publish_appointments<D, G>(
    state: &AppState<D, G>,
    params: &[Value],
) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let envelope: SignedEnvelope<PublishAppointmentsData> = parse_param(params, 0)?;
    let (provider, data) = state.gates.is_provider(&envelope).await.map_err(ServiceError::from)?;
    state
        .appointments
        .publish_appointments(provider.id, envelope.public_key.as_slice(), &data.appointments)
        .await?;
    Ok(serde_json::json!({ "ok": true }))
}

/// All of a provider's published appointments, optionally narrowed by
/// update time.
pub async fn get_provider_appointments<D, G>(
    state: &AppState<D, G>,
    params: &[Value],
) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let envelope: SignedEnvelope<crate::dispatch::providers::MediatorQuery> = parse_param(params, 0)?;
    let (provider, _data) = state.gates.is_provider(&envelope).await.map_err(ServiceError::from)?;
    let updated_since: Option<DateTime<Utc>> = parse_param_optional(params, 1)?;

    let mut views = state.appointments.get_provider_appointments(provider.id).await?;
    if let Some(since) = updated_since {
        views.retain(|v| v.updated_at >= since);
    }
    Ok(serde_json::to_value(views).expect("provider appointment views always serialise"))
}

/// A provider's appointments carrying a given property key/value.
pub async fn get_provider_appointments_by_property<D, G>(
    state: &AppState<D, G>,
    params: &[Value],
) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let envelope: SignedEnvelope<crate::dispatch::providers::MediatorQuery> = parse_param(params, 0)?;
    let (provider, _data) = state.gates.is_provider(&envelope).await.map_err(ServiceError::from)?;
    let key: String = parse_param(params, 1)?;
    let value: String = parse_param(params, 2)?;
    let views = state
        .appointments
        .get_provider_appointments_by_property(provider.id, &key, &value)
        .await?;
    Ok(serde_json::to_value(views).expect("provider appointment views always serialise"))
}

/// A single appointment, redacted for an anonymous caller. The key chain
/// names the provider's installed signing key alongside itself as the
/// nominal "mediator" entry: the current schema does not persist which
/// mediator vouched for a given provider (`confirmProvider` never checks
/// the inbound `ActorKey.signature` against a specific installed mediator
/// key either), so there is nothing else to attribute it to.
pub async fn get_appointment<D, G>(
    state: &AppState<D, G>,
    params: &[Value],
) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let appointment_id_hex: String = parse_param(params, 0)?;
    let provider_id_hex: String = parse_param(params, 1)?;
    let appointment_id = parse_id(&appointment_id_hex)?;
    let provider_id = parse_id(&provider_id_hex)?;

    let provider_key = state.providers.get_provider_key(provider_id).await?;
    let key_chain = KeyChain {
        provider: provider_key.clone(),
        mediator: provider_key,
    };

    let view = state.appointments.get_appointment(appointment_id, key_chain).await?;
    Ok(serde_json::to_value(view).expect("anonymous appointment view always serialises"))
}

/// A privacy-preserving feed of upcoming appointments across providers in
/// a zip range.
pub async fn get_appointments_aggregated<D, G>(
    state: &AppState<D, G>,
    params: &[Value],
) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let date_str: String = parse_param(params, 0)?;
    let zip_from: String = parse_param(params, 1)?;
    let zip_to: String = parse_param(params, 2)?;

    let date: NaiveDate = kiebitz_types::parse_date(&date_str)
        .ok_or_else(|| GatewayError::InvalidParams(format!("malformed date: {date_str}")))?;
    let now = date.and_hms_opt(0, 0, 0).unwrap().and_utc();

    let providers = providers_in_zip_range(state, &zip_from, &zip_to).await?;
    let provider_ids: Vec<_> = providers.into_iter().map(|(id, _)| id).collect();

    let aggregated = state.appointments.get_appointments_aggregated(&provider_ids, now).await?;
    Ok(serde_json::to_value(aggregated).expect("aggregated appointments always serialise"))
}
