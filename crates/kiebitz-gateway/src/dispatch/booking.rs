//! Booking and cancellation. Both calls are gated by `is_user`: the caller
//! presents a priority token alongside a freshly signed envelope bound to
//! the same keypair the token was minted for. The token bytes that
//! identify a booking (and that `UsedToken` is keyed by) are `TokenData`'s
//! own `token` field, not the signed wrapper around it.

use kiebitz_core::BookAppointmentData;
use kiebitz_storage::{BookingGateway, Database, LockManager};
use kiebitz_types::{ServiceError, SignedEnvelope, SignedToken};
use serde_json::Value;

use crate::domain::GatewayError;
use crate::forms::parse_param;
use crate::state::AppState;

/// Spend a token to book one open slot of an appointment.
pub async fn book_appointment<D, G>(
    state: &AppState<D, G>,
    params: &[Value],
) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let envelope: SignedEnvelope<BookAppointmentData> = parse_param(params, 0)?;
    let token: SignedToken = parse_param(params, 1)?;
    let (token_data, data) = state.gates.is_user(&envelope, &token).map_err(ServiceError::from)?;

    let booked = state
        .booking
        .book_appointment(
            data.id,
            token_data.token.as_slice(),
            envelope.public_key.as_slice(),
            data.encrypted_data.as_slice(),
        )
        .await?;
    Ok(serde_json::to_value(booked).expect("booked slot always serialises"))
}

/// Release whichever slot a token had booked.
pub async fn cancel_appointment<D, G>(
    state: &AppState<D, G>,
    params: &[Value],
) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let envelope: SignedEnvelope<kiebitz_core::CancelAppointmentData> = parse_param(params, 0)?;
    let token: SignedToken = parse_param(params, 1)?;
    let (token_data, _data) = state.gates.is_user(&envelope, &token).map_err(ServiceError::from)?;

    state.booking.cancel_appointment(token_data.token.as_slice()).await?;
    Ok(serde_json::json!({ "ok": true }))
}
