//! `getStats`: a coarse, unauthenticated operational snapshot. Every
//! counter is also reported to the configured `MetricsSink`, fire-and-forget
//! — a sink outage must never turn a successful `getStats` call into a
//! failure.

use kiebitz_storage::{BookingGateway, Database, LockManager};
use serde::Serialize;
use serde_json::Value;

use crate::domain::GatewayError;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    verified_providers: usize,
    pending_providers: usize,
}

/// Counts of verified and pending providers, for a deployment's basic
/// operational dashboard.
pub async fn get_stats<D, G>(state: &AppState<D, G>) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let all = state.providers.get_providers().await?;
    let pending = state.providers.get_pending_provider_data().await?;
    let verified = all.len().saturating_sub(pending.len());

    let _ = state.metrics.record("providers.verified", verified as f64).await;
    let _ = state.metrics.record("providers.pending", pending.len() as f64).await;

    let response = StatsResponse {
        verified_providers: verified,
        pending_providers: pending.len(),
    };
    serde_json::to_value(response)
        .map_err(|e| GatewayError::InvalidParams(format!("could not encode stats response: {e}")))
}
