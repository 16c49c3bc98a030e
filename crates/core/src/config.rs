use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::metric::{Metric, MetricKind};

const DEFAULT_WINDOW_PROPERTIES: [Metric; 6] = [
    Metric::InnerHeight,
    Metric::InnerWidth,
    Metric::OuterHeight,
    Metric::OuterWidth,
    Metric::ScreenX,
    Metric::ScreenY,
];

const DEFAULT_POLL_PROPERTIES: [Metric; 4] = [
    Metric::ScreenX,
    Metric::ScreenY,
    Metric::ScrollLeft,
    Metric::ScrollTop,
];

const DEFAULT_RESIZE_PROPERTIES: [Metric; 12] = [
    Metric::InnerWidth,
    Metric::InnerHeight,
    Metric::OuterWidth,
    Metric::OuterHeight,
    Metric::ScrollHeight,
    Metric::ScrollWidth,
    Metric::ScrollLeft,
    Metric::ScrollTop,
    Metric::ClientWidth,
    Metric::ClientHeight,
    Metric::ScreenY,
    Metric::ScreenX,
];

/// User-facing configuration, as read from JSON.
///
/// Properties are named by their camelCase metric names. Every field has a
/// default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceConfig {
    /// Window properties whose values are cached between change notifications.
    pub window_properties: Vec<String>,
    /// Properties notified on every animation frame.
    pub poll_properties: Vec<String>,
    /// Properties notified (each followed by a `resize` event) per resize.
    pub resize_properties: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let names = |metrics: &[Metric]| -> Vec<String> {
            metrics.iter().map(|m| m.name().to_owned()).collect()
        };
        Self {
            window_properties: names(&DEFAULT_WINDOW_PROPERTIES),
            poll_properties: names(&DEFAULT_POLL_PROPERTIES),
            resize_properties: names(&DEFAULT_RESIZE_PROPERTIES),
        }
    }
}

impl ServiceConfig {
    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(data)?)
    }

    /// Resolve every descriptor into a typed [`MonitorTable`].
    ///
    /// Fails on the first descriptor that is not a metric name, or when a
    /// cached window property names a metric of another kind.
    pub fn validate(&self) -> Result<MonitorTable, ConfigError> {
        let window = self
            .window_properties
            .iter()
            .map(|name| {
                let metric: Metric = name.parse()?;
                match metric.kind() {
                    MetricKind::Window => Ok(metric),
                    kind => Err(ConfigError::NotAWindowProperty { metric, kind }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        let poll = parse_all(&self.poll_properties)?;
        let resize = parse_all(&self.resize_properties)?;
        Ok(MonitorTable {
            window,
            poll,
            resize,
        })
    }
}

fn parse_all(names: &[String]) -> Result<Vec<Metric>, ConfigError> {
    names.iter().map(|name| name.parse()).collect()
}

/// Validated monitoring tables driving a service instance.
///
/// Lists keep their configured order and multiplicity: a metric listed twice
/// under `resize` is notified twice per resize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorTable {
    window: Vec<Metric>,
    poll: Vec<Metric>,
    resize: Vec<Metric>,
}

impl MonitorTable {
    /// Window properties cached between notifications.
    pub fn window(&self) -> &[Metric] {
        &self.window
    }

    pub fn poll(&self) -> &[Metric] {
        &self.poll
    }

    pub fn resize(&self) -> &[Metric] {
        &self.resize
    }

    pub fn is_cached_window_property(&self, metric: Metric) -> bool {
        self.window.contains(&metric)
    }
}

impl Default for MonitorTable {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW_PROPERTIES.to_vec(),
            poll: DEFAULT_POLL_PROPERTIES.to_vec(),
            resize: DEFAULT_RESIZE_PROPERTIES.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates_to_default_table() {
        let table = ServiceConfig::default().validate().unwrap();
        assert_eq!(table, MonitorTable::default());
    }

    #[test]
    fn default_table_sizes() {
        let table = MonitorTable::default();
        assert_eq!(table.window().len(), 6);
        assert_eq!(table.poll().len(), 4);
        assert_eq!(table.resize().len(), 12);
    }

    #[test]
    fn empty_json_uses_defaults() {
        let config = ServiceConfig::from_json("{}").unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn partial_json_overrides_one_list() {
        let config = ServiceConfig::from_json(r#"{"pollProperties": ["scrollTop"]}"#).unwrap();
        let table = config.validate().unwrap();
        assert_eq!(table.poll(), &[Metric::ScrollTop]);
        assert_eq!(table.resize().len(), 12);
    }

    #[test]
    fn unknown_window_property_fails() {
        let config = ServiceConfig {
            window_properties: vec!["innerHeight".into(), "devicePixelRatio".into()],
            ..ServiceConfig::default()
        };
        let err = config.validate();
        assert!(
            matches!(err, Err(ConfigError::UnknownProperty { ref name }) if name == "devicePixelRatio")
        );
    }

    #[test]
    fn document_metric_is_not_a_window_property() {
        let config = ServiceConfig {
            window_properties: vec!["scrollTop".into()],
            ..ServiceConfig::default()
        };
        match config.validate() {
            Err(ConfigError::NotAWindowProperty { metric, kind }) => {
                assert_eq!(metric, Metric::ScrollTop);
                assert_eq!(kind, MetricKind::Document);
            }
            other => panic!("expected NotAWindowProperty, got {other:?}"),
        }
    }

    #[test]
    fn non_string_descriptor_is_rejected() {
        let err = ServiceConfig::from_json(r#"{"windowProperties": ["innerHeight", 42]}"#);
        assert!(matches!(err, Err(ConfigError::Json(_))));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = ServiceConfig::from_json(r#"{"pollInterval": 16}"#);
        assert!(matches!(err, Err(ConfigError::Json(_))));
    }

    #[test]
    fn error_messages_name_the_descriptor() {
        let config = ServiceConfig {
            resize_properties: vec!["scrolTop".into()],
            ..ServiceConfig::default()
        };
        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("\"scrolTop\""), "{message}");
    }
}
