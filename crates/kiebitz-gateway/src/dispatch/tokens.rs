//! Priority-token issuance, and the read-only `isValidUser` check a client
//! can use to tell whether a held token is still spendable.

use kiebitz_core::GetTokenData;
use kiebitz_storage::{BookingGateway, Database, LockManager};
use kiebitz_types::{ServiceError, SignedEnvelope, SignedToken};
use serde_json::Value;

use crate::domain::GatewayError;
use crate::forms::parse_param;
use crate::state::AppState;

/// Mint a priority token bound to the caller's keypair.
pub async fn get_token<D, G>(
    state: &AppState<D, G>,
    params: &[Value],
) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let envelope: SignedEnvelope<GetTokenData> = parse_param(params, 0)?;
    let token = state.tokens.get_token(&envelope).await?;
    Ok(serde_json::to_value(token).expect("signed token always serialises"))
}

/// Whether a token is well-formed, issued by this server, bound to the
/// presented envelope's keypair, and not yet spent. Read-only: unlike
/// `bookAppointment`, this never consumes the token.
pub async fn is_valid_user<D, G>(
    state: &AppState<D, G>,
    params: &[Value],
) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let envelope: SignedEnvelope<crate::dispatch::providers::MediatorQuery> = parse_param(params, 0)?;
    let token: SignedToken = parse_param(params, 1)?;

    let valid = match state.gates.is_user(&envelope, &token) {
        Ok((token_data, _data)) => {
            !state
                .database
                .is_token_used(token_data.token.as_slice())
                .await
                .map_err(ServiceError::from)?
        }
        Err(_) => false,
    };
    Ok(serde_json::json!({ "valid": valid }))
}
