use serde::{Deserialize, Serialize};

use crate::metric::Metric;

/// Distance between the right edge of the viewport and the end of the
/// scrollable area.
pub fn scroll_right(scroll_width: f64, client_width: f64, scroll_left: f64) -> f64 {
    (scroll_width - client_width) - scroll_left
}

/// Distance between the bottom edge of the viewport and the end of the
/// scrollable area.
pub fn scroll_bottom(scroll_height: f64, client_height: f64, scroll_top: f64) -> f64 {
    (scroll_height - client_height) - scroll_top
}

/// Horizontal scroll position as a fraction of the scrollable range.
///
/// A page that cannot scroll horizontally reports 1.
pub fn scroll_h_ratio(scroll_left: f64, scroll_width: f64, client_width: f64) -> f64 {
    if scroll_width == client_width {
        1.0
    } else {
        scroll_left / (scroll_width - client_width)
    }
}

/// Vertical scroll position as a fraction of the scrollable range.
///
/// Unlike [`scroll_h_ratio`] there is no guard for a page that cannot
/// scroll: the result is NaN for `0 / 0` and infinite otherwise.
pub fn scroll_v_ratio(scroll_top: f64, scroll_height: f64, client_height: f64) -> f64 {
    scroll_top / (scroll_height - client_height)
}

/// Evaluate a derived metric, reading its inputs through `read`.
///
/// Returns `None` for metrics that are not derived.
pub fn derive(metric: Metric, mut read: impl FnMut(Metric) -> f64) -> Option<f64> {
    let value = match metric {
        Metric::ScrollRight => scroll_right(
            read(Metric::ScrollWidth),
            read(Metric::ClientWidth),
            read(Metric::ScrollLeft),
        ),
        Metric::ScrollBottom => scroll_bottom(
            read(Metric::ScrollHeight),
            read(Metric::ClientHeight),
            read(Metric::ScrollTop),
        ),
        Metric::ScrollHRatio => scroll_h_ratio(
            read(Metric::ScrollLeft),
            read(Metric::ScrollWidth),
            read(Metric::ClientWidth),
        ),
        Metric::ScrollVRatio => scroll_v_ratio(
            read(Metric::ScrollTop),
            read(Metric::ScrollHeight),
            read(Metric::ClientHeight),
        ),
        _ => return None,
    };
    Some(value)
}

/// All metrics read at one instant.
///
/// Serializes with camelCase keys. `scrollVRatio` may be NaN or infinite,
/// which `serde_json` writes as `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub inner_height: f64,
    pub inner_width: f64,
    pub outer_height: f64,
    pub outer_width: f64,
    pub screen_x: f64,
    pub screen_y: f64,
    pub client_height: f64,
    pub client_width: f64,
    pub scroll_top: f64,
    pub scroll_left: f64,
    pub scroll_height: f64,
    pub scroll_width: f64,
    pub scroll_right: f64,
    pub scroll_bottom: f64,
    #[serde(rename = "scrollHRatio")]
    pub scroll_h_ratio: f64,
    #[serde(rename = "scrollVRatio")]
    pub scroll_v_ratio: f64,
}

impl MetricsSnapshot {
    /// Build a snapshot by reading every metric through `read`.
    pub fn collect(mut read: impl FnMut(Metric) -> f64) -> Self {
        Self {
            inner_height: read(Metric::InnerHeight),
            inner_width: read(Metric::InnerWidth),
            outer_height: read(Metric::OuterHeight),
            outer_width: read(Metric::OuterWidth),
            screen_x: read(Metric::ScreenX),
            screen_y: read(Metric::ScreenY),
            client_height: read(Metric::ClientHeight),
            client_width: read(Metric::ClientWidth),
            scroll_top: read(Metric::ScrollTop),
            scroll_left: read(Metric::ScrollLeft),
            scroll_height: read(Metric::ScrollHeight),
            scroll_width: read(Metric::ScrollWidth),
            scroll_right: read(Metric::ScrollRight),
            scroll_bottom: read(Metric::ScrollBottom),
            scroll_h_ratio: read(Metric::ScrollHRatio),
            scroll_v_ratio: read(Metric::ScrollVRatio),
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::InnerHeight => self.inner_height,
            Metric::InnerWidth => self.inner_width,
            Metric::OuterHeight => self.outer_height,
            Metric::OuterWidth => self.outer_width,
            Metric::ScreenX => self.screen_x,
            Metric::ScreenY => self.screen_y,
            Metric::ClientHeight => self.client_height,
            Metric::ClientWidth => self.client_width,
            Metric::ScrollTop => self.scroll_top,
            Metric::ScrollLeft => self.scroll_left,
            Metric::ScrollHeight => self.scroll_height,
            Metric::ScrollWidth => self.scroll_width,
            Metric::ScrollRight => self.scroll_right,
            Metric::ScrollBottom => self.scroll_bottom,
            Metric::ScrollHRatio => self.scroll_h_ratio,
            Metric::ScrollVRatio => self.scroll_v_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_right_example() {
        assert_eq!(scroll_right(500.0, 300.0, 50.0), 150.0);
        assert_eq!(scroll_bottom(2000.0, 800.0, 1200.0), 0.0);
    }

    #[test]
    fn h_ratio_is_one_when_nothing_to_scroll() {
        assert_eq!(scroll_h_ratio(0.0, 0.0, 0.0), 1.0);
        assert_eq!(scroll_h_ratio(30.0, 640.0, 640.0), 1.0);
        assert_eq!(scroll_h_ratio(100.0, 600.0, 400.0), 0.5);
    }

    #[test]
    fn v_ratio_has_no_zero_guard() {
        assert!(scroll_v_ratio(0.0, 0.0, 0.0).is_nan());
        assert!(scroll_v_ratio(0.0, 768.0, 768.0).is_nan());
        assert_eq!(scroll_v_ratio(10.0, 768.0, 768.0), f64::INFINITY);
        assert_eq!(scroll_v_ratio(300.0, 1400.0, 800.0), 0.5);
    }

    #[test]
    fn derive_reads_declared_dependencies_only() {
        for metric in Metric::ALL {
            let mut reads = Vec::new();
            let value = derive(metric, |m| {
                reads.push(m);
                100.0
            });
            if metric.kind() == crate::metric::MetricKind::Derived {
                assert!(value.is_some());
                reads.sort();
                let mut deps = metric.dependencies().to_vec();
                deps.sort();
                assert_eq!(reads, deps, "{metric}");
            } else {
                assert_eq!(value, None);
                assert!(reads.is_empty());
            }
        }
    }

    #[test]
    fn collect_and_get_agree() {
        let snapshot = MetricsSnapshot::collect(|m| m.index() as f64);
        for metric in Metric::ALL {
            assert_eq!(snapshot.get(metric), metric.index() as f64);
        }
    }

    #[test]
    fn serializes_with_metric_names() {
        let snapshot = MetricsSnapshot::collect(|_| 1.0);
        let value = serde_json::to_value(snapshot).expect("snapshot serializes");
        for metric in Metric::ALL {
            assert_eq!(value.get(metric.name()).and_then(serde_json::Value::as_f64), Some(1.0));
        }
    }
}
