use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use windoc_core::host::WindowState;
use windoc_core::metric::{DocumentElement, ElementProperty, WindowProperty};
use windoc_core::{
    ConfigError, MetricsSnapshot, RunLoop, ServiceConfig, SimulatedWindow, WindowHost,
    WindowMetricsService, select_host,
};

const FRAME_MS: f64 = 1000.0 / 60.0;

fn frame_ms() -> f64 {
    FRAME_MS
}

/// A scripted session: the window's starting state and what happens to it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Scenario {
    pub config: Option<ServiceConfig>,
    /// Bind to the null window instead of the simulated one.
    pub server_rendered: bool,
    pub window: WindowState,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Step {
    /// Run one animation frame.
    Frame {
        #[serde(default = "frame_ms")]
        delta_ms: f64,
    },
    /// Resize the viewport and dispatch `resize`.
    Resize { width: f64, height: f64 },
    /// Scroll the root element.
    Scroll { left: f64, top: f64 },
    /// Flush the run loop once.
    Flush,
    SetWindow {
        property: WindowProperty,
        value: Option<f64>,
    },
    SetElement {
        element: DocumentElement,
        property: ElementProperty,
        value: Option<f64>,
    },
    Destroy,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Frame { .. } => "frame",
            Step::Resize { .. } => "resize",
            Step::Scroll { .. } => "scroll",
            Step::Flush => "flush",
            Step::SetWindow { .. } => "setWindow",
            Step::SetElement { .. } => "setElement",
            Step::Destroy => "destroy",
        }
    }
}

/// What the service looked like after one step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub index: usize,
    pub step: &'static str,
    /// `resize` deliveries observed so far.
    pub resize_events: usize,
    /// Change notifications observed so far.
    pub changes: usize,
    /// Tasks waiting on the run loop.
    pub pending: usize,
    pub destroyed: bool,
    pub metrics: MetricsSnapshot,
}

/// Play `scenario` against a fresh service.
pub fn run(scenario: &Scenario) -> Result<Vec<StepReport>, ConfigError> {
    let window = Rc::new(SimulatedWindow::with_state(scenario.window.clone()));
    let host = select_host(scenario.server_rendered, || -> Rc<dyn WindowHost> {
        window.clone()
    });
    let run_loop = RunLoop::new();
    let config = scenario.config.clone().unwrap_or_default();
    let service = WindowMetricsService::new(host, run_loop.clone(), &config)?;

    let resize_events = Rc::new(Cell::new(0usize));
    let counter = resize_events.clone();
    service.on_resize(move |_| counter.set(counter.get() + 1));
    let changes = Rc::new(Cell::new(0usize));
    let counter = changes.clone();
    service.observe(move |_| counter.set(counter.get() + 1));

    let mut reports = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        tracing::debug!(index, step = step.name(), "applying step");
        match step {
            Step::Frame { delta_ms } => {
                window.advance_frame(*delta_ms);
            }
            Step::Resize { width, height } => {
                window.resize(*width, *height);
            }
            Step::Scroll { left, top } => window.scroll_to(*left, *top),
            Step::Flush => {
                run_loop.flush();
            }
            Step::SetWindow { property, value } => window.set_window_property(*property, *value),
            Step::SetElement {
                element,
                property,
                value,
            } => window.set_element_property(*element, *property, *value),
            Step::Destroy => service.destroy(),
        }
        reports.push(StepReport {
            index,
            step: step.name(),
            resize_events: resize_events.get(),
            changes: changes.get(),
            pending: run_loop.pending(),
            destroyed: service.is_destroyed(),
            metrics: service.snapshot(),
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Scenario {
        serde_json::from_str(json).expect("scenario parses")
    }

    #[test]
    fn steps_parse_from_tagged_json() {
        let scenario = parse(
            r#"{
                "window": {"innerWidth": 800},
                "steps": [
                    {"step": "frame"},
                    {"step": "frame", "deltaMs": 33},
                    {"step": "resize", "width": 640, "height": 480},
                    {"step": "setWindow", "property": "screenX", "value": 12},
                    {"step": "setElement", "element": "body", "property": "scrollTop", "value": null},
                    {"step": "flush"},
                    {"step": "destroy"}
                ]
            }"#,
        );
        assert_eq!(scenario.steps.len(), 7);
        assert_eq!(scenario.steps[0], Step::Frame { delta_ms: FRAME_MS });
        assert_eq!(scenario.steps[1], Step::Frame { delta_ms: 33.0 });
        assert_eq!(
            scenario.steps[4],
            Step::SetElement {
                element: DocumentElement::Body,
                property: ElementProperty::ScrollTop,
                value: None,
            }
        );
    }

    #[test]
    fn resize_is_reported_after_flush() {
        let scenario = parse(
            r#"{
                "window": {"innerWidth": 1024, "innerHeight": 768, "root": {"clientWidth": 1024, "clientHeight": 768}},
                "steps": [
                    {"step": "flush"},
                    {"step": "resize", "width": 800, "height": 600},
                    {"step": "flush"}
                ]
            }"#,
        );
        let reports = run(&scenario).unwrap();
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[1].resize_events, 0);
        assert_eq!(reports[1].pending, 12);
        assert_eq!(reports[1].metrics.inner_width, 1024.0);
        assert_eq!(reports[2].resize_events, 12);
        assert_eq!(reports[2].metrics.inner_width, 800.0);
        assert_eq!(reports[2].metrics.client_height, 600.0);
    }

    #[test]
    fn destroy_freezes_notifications() {
        let scenario = parse(
            r#"{"steps": [{"step": "destroy"}, {"step": "frame"}, {"step": "flush"}]}"#,
        );
        let reports = run(&scenario).unwrap();
        assert!(reports.iter().all(|r| r.destroyed));
        assert_eq!(reports[2].changes, 0);
        assert_eq!(reports[2].pending, 0);
    }

    #[test]
    fn server_rendered_scenario_reads_zero() {
        let scenario = parse(
            r#"{"serverRendered": true, "window": {"innerWidth": 1920}, "steps": [{"step": "frame"}, {"step": "flush"}]}"#,
        );
        let reports = run(&scenario).unwrap();
        assert_eq!(reports[1].metrics.inner_width, 0.0);
        assert_eq!(reports[1].metrics.scroll_h_ratio, 1.0);
    }

    #[test]
    fn invalid_config_is_an_error() {
        let scenario = parse(r#"{"config": {"windowProperties": ["scrollBottom"]}}"#);
        assert!(matches!(run(&scenario), Err(ConfigError::NotAWindowProperty { .. })));
    }
}
