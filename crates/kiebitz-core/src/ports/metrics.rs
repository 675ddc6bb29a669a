//! The `getStats` side-stream: an outbound sink services report counters
//! to, kept out of any handler's primary `Result`.
//!
//! A `MetricsSink` failing (or simply being a no-op) must never change
//! what a caller observes from the call it is attached to — callers
//! invoke it with `let _ = sink.record(..)`, matching how counters are
//! collected without being load-bearing anywhere else.

use async_trait::async_trait;

/// Records a named counter. Implementations must not block meaningfully
/// or propagate failure back into request handling.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Report that `name` increased by `value` (or, for gauges, now reads
    /// `value`). The distinction is left to the sink; this port only
    /// carries a label and a number.
    async fn record(&self, name: &str, value: f64);
}

/// Discards every counter. The default when no sink is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

#[async_trait]
impl MetricsSink for NoopMetricsSink {
    async fn record(&self, _name: &str, _value: f64) {}
}

/// Logs every counter at debug level via `tracing`, for deployments with no
/// dedicated metrics backend wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetricsSink;

#[async_trait]
impl MetricsSink for TracingMetricsSink {
    async fn record(&self, name: &str, value: f64) {
        tracing::debug!(counter = name, value, "recorded metric");
    }
}
