use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::config::{MonitorTable, ServiceConfig};
use crate::error::ConfigError;
use crate::events::{EventEmitter, SubscriptionId};
use crate::host::{FrameId, ListenerId, ResizeEvent, WindowHost};
use crate::metric::{DocumentElement, ElementProperty, Metric, MetricSource, WindowProperty};
use crate::reactive::ReactiveStore;
use crate::runloop::RunLoop;
use crate::snapshot::{self, MetricsSnapshot};

/// Live window and document metrics.
///
/// Binding happens in the constructor: a resize listener is registered on
/// the host and an animation-frame loop starts polling the metrics that
/// change without a resize (scroll offsets, screen position). Both are torn
/// down by [`destroy`](Self::destroy), which also runs on drop.
///
/// Change notifications never fire from inside a host callback. They are
/// queued on the [`RunLoop`] and delivered on its next flush.
///
/// Cached window metrics are filled lazily: a value is captured on its first
/// read, not at construction, and held until its next change notification.
pub struct WindowMetricsService {
    inner: Rc<Inner>,
}

struct Inner {
    host: Rc<dyn WindowHost>,
    run_loop: Rc<RunLoop>,
    table: MonitorTable,
    store: ReactiveStore,
    resize: EventEmitter<Rc<ResizeEvent>>,
    listener: Cell<Option<ListenerId>>,
    frame: Cell<Option<FrameId>>,
    frames: Cell<u64>,
    destroyed: Cell<bool>,
}

macro_rules! metric_accessors {
    ($($(#[$doc:meta])* $name:ident => $metric:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(&self) -> f64 {
                self.get(Metric::$metric)
            }
        )*
    };
}

impl WindowMetricsService {
    /// Validate `config` and bind to `host`.
    pub fn new(
        host: Rc<dyn WindowHost>,
        run_loop: Rc<RunLoop>,
        config: &ServiceConfig,
    ) -> Result<Self, ConfigError> {
        let table = config.validate()?;
        Ok(Self::with_table(host, run_loop, table))
    }

    pub fn with_table(host: Rc<dyn WindowHost>, run_loop: Rc<RunLoop>, table: MonitorTable) -> Self {
        let inner = Rc::new(Inner {
            host,
            run_loop,
            table,
            store: ReactiveStore::new(),
            resize: EventEmitter::new(),
            listener: Cell::new(None),
            frame: Cell::new(None),
            frames: Cell::new(0),
            destroyed: Cell::new(false),
        });

        let weak = Rc::downgrade(&inner);
        let listener = inner.host.add_resize_listener(Rc::new(move |event: ResizeEvent| {
            if let Some(inner) = weak.upgrade() {
                Inner::on_window_resize(&inner, event);
            }
        }));
        inner.listener.set(Some(listener));
        Inner::refresh_poll_loop(&inner);

        debug!(
            cached = inner.table.window().len(),
            polled = inner.table.poll().len(),
            on_resize = inner.table.resize().len(),
            "window metrics service started"
        );
        Self { inner }
    }

    /// Current value of `metric`. Missing readings are 0.
    pub fn get(&self, metric: Metric) -> f64 {
        self.inner.read(metric)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::collect(|metric| self.inner.read(metric))
    }

    metric_accessors! {
        inner_height => InnerHeight,
        inner_width => InnerWidth,
        outer_height => OuterHeight,
        outer_width => OuterWidth,
        screen_x => ScreenX,
        screen_y => ScreenY,
        client_height => ClientHeight,
        client_width => ClientWidth,
        scroll_top => ScrollTop,
        scroll_left => ScrollLeft,
        scroll_height => ScrollHeight,
        scroll_width => ScrollWidth,
        /// `scroll_width - client_width - scroll_left`
        scroll_right => ScrollRight,
        /// `scroll_height - client_height - scroll_top`
        scroll_bottom => ScrollBottom,
        /// 1 when the page cannot scroll horizontally.
        scroll_h_ratio => ScrollHRatio,
        /// NaN or infinite when the page cannot scroll vertically.
        scroll_v_ratio => ScrollVRatio,
    }

    /// Subscribe to `resize`.
    ///
    /// Each physical resize is delivered once per resize-monitored metric,
    /// so up to 12 times with the default table. Every delivery for one
    /// resize carries the same `Rc`.
    pub fn on_resize(&self, listener: impl Fn(&Rc<ResizeEvent>) + 'static) -> SubscriptionId {
        self.inner.resize.subscribe(listener)
    }

    pub fn off_resize(&self, id: SubscriptionId) -> bool {
        self.inner.resize.unsubscribe(id)
    }

    /// Subscribe to change notifications. A notified metric is followed by
    /// each derived metric that depends on it.
    pub fn observe(&self, observer: impl Fn(Metric) + 'static) -> SubscriptionId {
        self.inner.store.observe(move |metric| observer(*metric))
    }

    pub fn unobserve(&self, id: SubscriptionId) -> bool {
        self.inner.store.unobserve(id)
    }

    /// Invalidate `metric` and notify observers right away.
    pub fn notify_property_change(&self, metric: Metric) {
        if self.inner.destroyed.get() {
            warn!(%metric, "change notified on a destroyed window metrics service");
            return;
        }
        self.inner.store.notify_property_change(metric);
    }

    pub fn run_loop(&self) -> &Rc<RunLoop> {
        &self.inner.run_loop
    }

    pub fn table(&self) -> &MonitorTable {
        &self.inner.table
    }

    /// Animation frames handled since construction.
    pub fn frames(&self) -> u64 {
        self.inner.frames.get()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// Cancel the poll loop and unregister the resize listener.
    ///
    /// Idempotent. Work already queued on the run loop is dropped when it
    /// runs, and readings keep working against the live host.
    pub fn destroy(&self) {
        let inner = &self.inner;
        if inner.destroyed.replace(true) {
            return;
        }
        if let Some(frame) = inner.frame.take() {
            inner.host.cancel_animation_frame(frame);
        }
        if let Some(listener) = inner.listener.take() {
            inner.host.remove_resize_listener(listener);
        }
        inner.resize.clear();
        inner.store.reset();
        debug!(frames = inner.frames.get(), "window metrics service destroyed");
    }
}

impl Drop for WindowMetricsService {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for WindowMetricsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowMetricsService")
            .field("table", &self.inner.table)
            .field("frames", &self.inner.frames.get())
            .field("destroyed", &self.inner.destroyed.get())
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn read(&self, metric: Metric) -> f64 {
        match metric.source() {
            MetricSource::Window(property) if self.table.is_cached_window_property(metric) => {
                self.store
                    .get_or_compute(metric, || self.read_window(property))
            }
            MetricSource::Window(property) => self.read_window(property),
            MetricSource::Document(property) => self.read_document(property),
            MetricSource::Derived(_) => self.store.get_or_compute(metric, || {
                snapshot::derive(metric, |input| self.read(input)).unwrap_or(0.0)
            }),
        }
    }

    fn read_window(&self, property: WindowProperty) -> f64 {
        present(self.host.window_property(property)).unwrap_or(0.0)
    }

    /// Root element first, then `body`. A zero reading falls through, since
    /// some engines report page scroll on `body` and 0 on the root.
    fn read_document(&self, property: ElementProperty) -> f64 {
        DocumentElement::FALLBACK_ORDER
            .into_iter()
            .find_map(|element| present(self.host.element_property(element, property)))
            .unwrap_or(0.0)
    }

    fn on_window_resize(inner: &Rc<Self>, event: ResizeEvent) {
        if inner.destroyed.get() {
            return;
        }
        trace!(
            width = event.inner_width,
            height = event.inner_height,
            "window resized"
        );
        let event = Rc::new(event);
        for &metric in inner.table.resize() {
            let weak = Rc::downgrade(inner);
            let event = event.clone();
            inner.run_loop.next(move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if inner.destroyed.get() {
                    return;
                }
                inner.store.notify_property_change(metric);
                inner.resize.publish(&event);
            });
        }
    }

    fn refresh_poll_loop(inner: &Rc<Self>) {
        for &metric in inner.table.poll() {
            let weak = Rc::downgrade(inner);
            inner.run_loop.next(move || {
                if let Some(inner) = weak.upgrade()
                    && !inner.destroyed.get()
                {
                    inner.store.notify_property_change(metric);
                }
            });
        }

        let weak = Rc::downgrade(inner);
        let frame = inner.host.request_animation_frame(Box::new(move |timestamp: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.destroyed.get() {
                return;
            }
            inner.frames.set(inner.frames.get() + 1);
            trace!(timestamp, "animation frame");
            Inner::refresh_poll_loop(&inner);
        }));
        inner.frame.set(Some(frame));
    }
}

/// Absent, zero and NaN readings all count as missing.
fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::host::{ElementState, NullWindow, SimulatedWindow, WindowState};

    fn scrolling_page() -> WindowState {
        WindowState {
            inner_height: Some(768.0),
            inner_width: Some(1024.0),
            outer_height: Some(868.0),
            outer_width: Some(1040.0),
            screen_x: Some(10.0),
            screen_y: Some(20.0),
            root: Some(ElementState {
                client_height: Some(768.0),
                client_width: Some(1009.0),
                scroll_top: Some(200.0),
                scroll_left: Some(0.0),
                scroll_height: Some(2768.0),
                scroll_width: Some(1009.0),
            }),
            body: None,
        }
    }

    fn bind(state: WindowState) -> (Rc<SimulatedWindow>, WindowMetricsService) {
        let window = Rc::new(SimulatedWindow::with_state(state));
        let service = WindowMetricsService::with_table(
            window.clone(),
            RunLoop::new(),
            MonitorTable::default(),
        );
        (window, service)
    }

    #[test]
    fn reads_window_and_document_metrics() {
        let (_window, service) = bind(scrolling_page());
        assert_eq!(service.inner_width(), 1024.0);
        assert_eq!(service.outer_height(), 868.0);
        assert_eq!(service.screen_y(), 20.0);
        assert_eq!(service.scroll_top(), 200.0);
        assert_eq!(service.scroll_right(), 0.0);
        assert_eq!(service.scroll_bottom(), 1800.0);
        assert_eq!(service.scroll_h_ratio(), 1.0);
        assert_eq!(service.scroll_v_ratio(), 0.1);
    }

    #[test]
    fn missing_readings_are_zero() {
        let (_window, service) = bind(WindowState::default());
        for metric in Metric::ALL {
            if metric == Metric::ScrollHRatio {
                assert_eq!(service.get(metric), 1.0);
            } else if metric == Metric::ScrollVRatio {
                assert!(service.get(metric).is_nan());
            } else {
                assert_eq!(service.get(metric), 0.0, "{metric}");
            }
        }
    }

    #[test]
    fn nan_window_property_reads_as_zero() {
        let (_window, service) = bind(WindowState {
            screen_x: Some(f64::NAN),
            ..WindowState::default()
        });
        assert_eq!(service.screen_x(), 0.0);
    }

    #[test]
    fn zero_on_root_falls_back_to_body() {
        let mut state = scrolling_page();
        if let Some(root) = state.root.as_mut() {
            root.scroll_top = Some(0.0);
        }
        state.body = Some(ElementState {
            scroll_top: Some(350.0),
            ..ElementState::default()
        });
        let (_window, service) = bind(state);
        assert_eq!(service.scroll_top(), 350.0);
        assert_eq!(service.client_height(), 768.0);
    }

    #[test]
    fn window_properties_stay_cached_until_notified() {
        let (window, service) = bind(scrolling_page());
        assert_eq!(service.inner_width(), 1024.0);
        window.set_window_property(WindowProperty::InnerWidth, Some(800.0));
        assert_eq!(service.inner_width(), 1024.0);
        service.notify_property_change(Metric::InnerWidth);
        assert_eq!(service.inner_width(), 800.0);
    }

    #[test]
    fn window_cache_fills_on_first_read() {
        let (window, service) = bind(scrolling_page());
        window.resize(1280.0, 720.0);
        assert_eq!(service.inner_width(), 1280.0);

        window.set_window_property(WindowProperty::InnerWidth, Some(640.0));
        assert_eq!(service.inner_width(), 1280.0);
    }

    #[test]
    fn uncached_window_property_reads_live() {
        let window = Rc::new(SimulatedWindow::with_state(scrolling_page()));
        let config = ServiceConfig {
            window_properties: vec!["innerWidth".into()],
            ..ServiceConfig::default()
        };
        let service = WindowMetricsService::new(window.clone(), RunLoop::new(), &config);
        let Ok(service) = service else {
            panic!("default-derived config must validate");
        };
        assert_eq!(service.outer_width(), 1040.0);
        window.set_window_property(WindowProperty::OuterWidth, Some(1200.0));
        assert_eq!(service.outer_width(), 1200.0);
    }

    #[test]
    fn document_metrics_are_never_cached() {
        let (window, service) = bind(scrolling_page());
        assert_eq!(service.scroll_top(), 200.0);
        window.scroll_to(0.0, 900.0);
        assert_eq!(service.scroll_top(), 900.0);
    }

    #[test]
    fn derived_metrics_refresh_on_dependency_notification() {
        let (window, service) = bind(scrolling_page());
        assert_eq!(service.scroll_bottom(), 1800.0);
        window.scroll_to(0.0, 800.0);
        assert_eq!(service.scroll_bottom(), 1800.0);
        service.notify_property_change(Metric::ScrollTop);
        assert_eq!(service.scroll_bottom(), 1200.0);
    }

    #[test]
    fn construction_registers_listener_and_first_frame() {
        let (window, service) = bind(scrolling_page());
        assert_eq!(window.listener_count(), 1);
        assert_eq!(window.pending_frames().len(), 1);
        assert_eq!(service.run_loop().pending(), 4);
    }

    #[test]
    fn each_frame_polls_and_reschedules() {
        let (window, service) = bind(scrolling_page());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        service.observe(move |m| s.borrow_mut().push(m));

        service.run_loop().flush();
        seen.borrow_mut().clear();

        assert_eq!(window.advance_frame(16.0), 1);
        assert_eq!(service.frames(), 1);
        assert_eq!(window.pending_frames().len(), 1);
        assert!(seen.borrow().is_empty());

        assert_eq!(service.run_loop().flush(), 4);
        let seen = seen.borrow();
        for metric in [Metric::ScreenX, Metric::ScreenY, Metric::ScrollLeft, Metric::ScrollTop] {
            assert!(seen.contains(&metric), "{metric} not polled");
        }
        assert!(!seen.contains(&Metric::InnerWidth));
    }

    #[test]
    fn resize_notifications_are_deferred() {
        let (window, service) = bind(scrolling_page());
        service.run_loop().flush();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        service.on_resize(move |_| h.set(h.get() + 1));
        assert_eq!(service.inner_width(), 1024.0);

        window.resize(1280.0, 720.0);
        assert_eq!(hits.get(), 0);
        assert_eq!(service.inner_width(), 1024.0);

        service.run_loop().flush();
        assert_eq!(hits.get(), 12);
        assert_eq!(service.inner_width(), 1280.0);
        assert_eq!(service.client_height(), 720.0);
    }

    #[test]
    fn destroy_is_idempotent_and_silences_pending_work() {
        let (window, service) = bind(scrolling_page());
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        service.observe(move |_| h.set(h.get() + 1));
        window.resize(640.0, 480.0);

        service.destroy();
        service.destroy();
        assert!(service.is_destroyed());
        assert_eq!(window.listener_count(), 0);
        assert!(window.pending_frames().is_empty());
        assert_eq!(window.cancelled_frames().len(), 1);

        service.run_loop().flush();
        assert_eq!(hits.get(), 0);
        assert_eq!(window.advance_frame(16.0), 0);
    }

    #[test]
    fn drop_unbinds_from_the_host() {
        let (window, service) = bind(scrolling_page());
        let run_loop = service.run_loop().clone();
        drop(service);
        assert_eq!(window.listener_count(), 0);
        assert!(window.pending_frames().is_empty());
        assert_eq!(run_loop.flush(), 4);
    }

    #[test]
    fn null_window_reads_zero_and_goes_quiet() {
        let service = WindowMetricsService::with_table(
            Rc::new(NullWindow),
            RunLoop::new(),
            MonitorTable::default(),
        );
        service.run_loop().flush();
        let snapshot = service.snapshot();
        assert_eq!(snapshot.inner_height, 0.0);
        assert_eq!(snapshot.scroll_right, 0.0);
        assert_eq!(snapshot.scroll_h_ratio, 1.0);
        assert!(snapshot.scroll_v_ratio.is_nan());
        assert_eq!(service.frames(), 0);
        service.destroy();
    }

    #[test]
    fn invalid_config_fails_before_binding() {
        let window = Rc::new(SimulatedWindow::new());
        let config = ServiceConfig {
            window_properties: vec!["scrollHRatio".into()],
            ..ServiceConfig::default()
        };
        let result = WindowMetricsService::new(window.clone(), RunLoop::new(), &config);
        assert!(matches!(result, Err(ConfigError::NotAWindowProperty { .. })));
        assert_eq!(window.listener_count(), 0);
        assert!(window.pending_frames().is_empty());
    }
}
