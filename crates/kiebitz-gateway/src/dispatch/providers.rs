//! Provider onboarding, mediator confirmation, and discovery.

use chrono::{DateTime, Utc};
use kiebitz_core::domain::ProviderProfileData;
use kiebitz_core::{ConfirmProviderData, StoreProviderData};
use kiebitz_storage::{BookingGateway, Database, LockManager};
use kiebitz_types::{id_to_hex, Id, ServiceError, SignedEnvelope, Timestamped};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::GatewayError;
use crate::forms::{parse_id, parse_param};
use crate::state::AppState;

/// The minimal signed payload a mediator presents for a read-only
/// provider-directory query — just enough for the mediator gate's
/// signature and expiry checks, nothing else to validate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediatorQuery {
    /// When the mediator issued this query.
    pub timestamp: DateTime<Utc>,
}

impl Timestamped for MediatorQuery {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Providers whose zip code falls in `[zip_from, zip_to]`, inclusive,
/// ordered lexicographically (zip codes are compared as strings, the same
/// representation they are stored and transmitted in).
pub(crate) async fn providers_in_zip_range<D, G>(
    state: &AppState<D, G>,
    zip_from: &str,
    zip_to: &str,
) -> Result<Vec<(Id, ProviderProfileData)>, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let all = state.providers.get_providers_by_zip_code("").await?;
    Ok(all
        .into_iter()
        .filter(|(_, profile)| {
            profile.zip_code.as_str() >= zip_from && profile.zip_code.as_str() <= zip_to
        })
        .collect())
}

/// A provider self-publishes (or updates) its encrypted profile.
pub async fn store_provider_data<D, G>(
    state: &AppState<D, G>,
    params: &[Value],
) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let envelope: SignedEnvelope<StoreProviderData> = parse_param(params, 0)?;
    let status = state.providers.store_provider_data(&envelope).await?;
    Ok(serde_json::json!({ "status": status }))
}

/// A provider polls whether its submission has been confirmed.
pub async fn check_provider_data<D, G>(
    state: &AppState<D, G>,
    params: &[Value],
) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let envelope: SignedEnvelope<MediatorQuery> = parse_param(params, 0)?;
    let (provider, _data) = state.gates.is_provider(&envelope).await.map_err(ServiceError::from)?;
    let status = state.providers.check_provider_data(provider.id).await?;
    Ok(serde_json::json!({ "status": status }))
}

/// A mediator confirms a pending provider.
pub async fn confirm_provider<D, G>(
    state: &AppState<D, G>,
    params: &[Value],
) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let envelope: SignedEnvelope<ConfirmProviderData> = parse_param(params, 0)?;
    let (_mediator, data) = state.gates.is_mediator(&envelope).await.map_err(ServiceError::from)?;
    let status = state.providers.confirm_provider(&data).await?;
    Ok(serde_json::json!({ "status": status }))
}

/// All providers awaiting confirmation.
pub async fn get_pending_provider_data<D, G>(
    state: &AppState<D, G>,
    params: &[Value],
) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let envelope: SignedEnvelope<MediatorQuery> = parse_param(params, 0)?;
    state.gates.is_mediator(&envelope).await.map_err(ServiceError::from)?;
    let pending = state.providers.get_pending_provider_data().await?;
    Ok(serde_json::to_value(pending).expect("provider rows always serialise"))
}

/// Every provider record known to the server.
pub async fn get_providers<D, G>(
    state: &AppState<D, G>,
    params: &[Value],
) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let envelope: SignedEnvelope<MediatorQuery> = parse_param(params, 0)?;
    state.gates.is_mediator(&envelope).await.map_err(ServiceError::from)?;
    let providers = state.providers.get_providers().await?;
    Ok(serde_json::to_value(providers).expect("provider rows always serialise"))
}

/// A single provider's raw record.
pub async fn get_provider_data<D, G>(
    state: &AppState<D, G>,
    params: &[Value],
) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let envelope: SignedEnvelope<MediatorQuery> = parse_param(params, 0)?;
    state.gates.is_mediator(&envelope).await.map_err(ServiceError::from)?;
    let id_hex: String = parse_param(params, 1)?;
    let id = parse_id(&id_hex)?;
    let row = state.providers.get_provider_data(id).await?;
    Ok(serde_json::to_value(row).expect("provider row always serialises"))
}

/// Public provider profiles within a zip range, for anonymous discovery.
pub async fn get_providers_by_zip_code<D, G>(
    state: &AppState<D, G>,
    params: &[Value],
) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let zip_from: String = parse_param(params, 0)?;
    let zip_to: String = parse_param(params, 1)?;
    let matches = providers_in_zip_range(state, &zip_from, &zip_to).await?;
    let profiles: Vec<_> = matches
        .into_iter()
        .map(|(id, profile)| serde_json::json!({ "id": id_to_hex(&id), "provider": profile }))
        .collect();
    Ok(Value::Array(profiles))
}

/// Whether a public key belongs to an installed, verified provider.
pub async fn is_valid_provider<D, G>(
    state: &AppState<D, G>,
    params: &[Value],
) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let public_key: kiebitz_types::Base64Bytes = parse_param(params, 0)?;
    let valid = state.providers.is_known_provider(public_key.as_slice()).await?;
    Ok(serde_json::json!({ "valid": valid }))
}
