//! Window and document metrics as reactive properties.
//!
//! [`WindowMetricsService`] binds to a [`WindowHost`], caches the window
//! dimensions until a resize, reads scroll and client metrics live, and
//! derives scroll distances and ratios from them. Change notifications are
//! deferred onto a [`RunLoop`] so that a burst of related changes settles
//! before observers run.

pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod metric;
pub mod reactive;
pub mod runloop;
pub mod service;
pub mod snapshot;

pub use config::{MonitorTable, ServiceConfig};
pub use error::ConfigError;
pub use events::{EventEmitter, SubscriptionId};
pub use host::{NativeEvent, NullWindow, ResizeEvent, SimulatedWindow, WindowHost, select_host};
pub use metric::{Metric, MetricKind};
pub use runloop::RunLoop;
pub use service::WindowMetricsService;
pub use snapshot::MetricsSnapshot;
