use thiserror::Error;

use crate::metric::{Metric, MetricKind};

/// Misconfiguration detected while building a service's monitoring tables.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid property value: {name:?} is not a known metric")]
    UnknownProperty { name: String },
    #[error("invalid property value: {metric} is a {kind} metric, expected a window property")]
    NotAWindowProperty { metric: Metric, kind: MetricKind },
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
