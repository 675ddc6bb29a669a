//! Storage-backed implementations of ports defined in other crates, plus
//! the one outbound port this crate defines itself.

pub mod actor_directory;
pub mod metrics;

pub use actor_directory::{StorageActorDirectory, MEDIATOR_KEYS, PROVIDER_KEYS};
pub use metrics::{MetricsSink, NoopMetricsSink, TracingMetricsSink};
