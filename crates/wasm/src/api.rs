use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use windoc_core::{
    NullWindow, ResizeEvent, RunLoop, SubscriptionId, WindowHost, WindowMetricsService,
    select_host,
};

use crate::browser::BrowserWindow;
use crate::{parse_config, to_js_id};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Whether this page is being rendered without a real browser window:
/// either no global `window` exists or a `FastBoot` global is defined.
pub fn is_server_rendered() -> bool {
    let fastboot = js_sys::Reflect::has(&js_sys::global(), &JsValue::from_str("FastBoot"))
        .unwrap_or(false);
    fastboot || web_sys::window().is_none()
}

/// A run loop flushed from a microtask each time work is queued on it.
pub fn microtask_run_loop() -> Rc<RunLoop> {
    let run_loop = RunLoop::new();
    let weak = Rc::downgrade(&run_loop);
    run_loop.set_waker(move || {
        let weak = weak.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Some(run_loop) = weak.upgrade() {
                run_loop.flush();
            }
        });
    });
    run_loop
}

/// The JS value handed to `onResize` callbacks: the DOM event when the host
/// attached one, otherwise a plain `{timeStamp, innerWidth, innerHeight}`.
fn resize_event_value(event: &ResizeEvent) -> JsValue {
    event
        .native
        .as_ref()
        .and_then(|native| native.downcast_ref::<JsValue>())
        .cloned()
        .unwrap_or_else(|| resize_event_object(event))
}

fn resize_event_object(event: &ResizeEvent) -> JsValue {
    let object = js_sys::Object::new();
    for (key, value) in [
        ("timeStamp", event.time_stamp),
        ("innerWidth", event.inner_width),
        ("innerHeight", event.inner_height),
    ] {
        // Setting a data property on a fresh plain object cannot fail.
        let _ = js_sys::Reflect::set(&object, &JsValue::from_str(key), &JsValue::from_f64(value));
    }
    object.into()
}

fn report(err: &JsValue) {
    web_sys::console::error_1(&format!("windoc: listener threw: {err:?}").into());
}

/// Window metrics exposed to JS.
///
/// ```js
/// const metrics = new WindowMetrics();
/// metrics.onResize((event) => console.log(event.innerWidth, metrics.scrollBottom));
/// // ...
/// metrics.destroy();
/// ```
#[wasm_bindgen]
pub struct WindowMetrics {
    service: WindowMetricsService,
    server_rendered: bool,
    last_resize: Rc<RefCell<Option<(Rc<ResizeEvent>, JsValue)>>>,
}

#[wasm_bindgen]
impl WindowMetrics {
    /// Bind to the global window. `config` is an optional JSON
    /// `ServiceConfig`; an invalid one throws.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<WindowMetrics, JsError> {
        let config = parse_config(config.as_deref()).map_err(|e| JsError::new(&e.to_string()))?;
        let server_rendered = is_server_rendered();
        let host = select_host(server_rendered, || -> Rc<dyn WindowHost> {
            match BrowserWindow::current() {
                Some(window) => Rc::new(window),
                None => Rc::new(NullWindow),
            }
        });
        let service = WindowMetricsService::new(host, microtask_run_loop(), &config)
            .map_err(|e| JsError::new(&e.to_string()))?;
        if server_rendered {
            web_sys::console::log_1(&"windoc: server rendering, window metrics read as 0".into());
        }
        Ok(Self {
            service,
            server_rendered,
            last_resize: Rc::new(RefCell::new(None)),
        })
    }

    #[wasm_bindgen(getter, js_name = isServerRendered)]
    pub fn is_server_rendered(&self) -> bool {
        self.server_rendered
    }

    #[wasm_bindgen(getter, js_name = innerHeight)]
    pub fn inner_height(&self) -> f64 {
        self.service.inner_height()
    }

    #[wasm_bindgen(getter, js_name = innerWidth)]
    pub fn inner_width(&self) -> f64 {
        self.service.inner_width()
    }

    #[wasm_bindgen(getter, js_name = outerHeight)]
    pub fn outer_height(&self) -> f64 {
        self.service.outer_height()
    }

    #[wasm_bindgen(getter, js_name = outerWidth)]
    pub fn outer_width(&self) -> f64 {
        self.service.outer_width()
    }

    #[wasm_bindgen(getter, js_name = screenX)]
    pub fn screen_x(&self) -> f64 {
        self.service.screen_x()
    }

    #[wasm_bindgen(getter, js_name = screenY)]
    pub fn screen_y(&self) -> f64 {
        self.service.screen_y()
    }

    #[wasm_bindgen(getter, js_name = clientHeight)]
    pub fn client_height(&self) -> f64 {
        self.service.client_height()
    }

    #[wasm_bindgen(getter, js_name = clientWidth)]
    pub fn client_width(&self) -> f64 {
        self.service.client_width()
    }

    #[wasm_bindgen(getter, js_name = scrollTop)]
    pub fn scroll_top(&self) -> f64 {
        self.service.scroll_top()
    }

    #[wasm_bindgen(getter, js_name = scrollLeft)]
    pub fn scroll_left(&self) -> f64 {
        self.service.scroll_left()
    }

    #[wasm_bindgen(getter, js_name = scrollHeight)]
    pub fn scroll_height(&self) -> f64 {
        self.service.scroll_height()
    }

    #[wasm_bindgen(getter, js_name = scrollWidth)]
    pub fn scroll_width(&self) -> f64 {
        self.service.scroll_width()
    }

    #[wasm_bindgen(getter, js_name = scrollRight)]
    pub fn scroll_right(&self) -> f64 {
        self.service.scroll_right()
    }

    #[wasm_bindgen(getter, js_name = scrollBottom)]
    pub fn scroll_bottom(&self) -> f64 {
        self.service.scroll_bottom()
    }

    #[wasm_bindgen(getter, js_name = scrollHRatio)]
    pub fn scroll_h_ratio(&self) -> f64 {
        self.service.scroll_h_ratio()
    }

    #[wasm_bindgen(getter, js_name = scrollVRatio)]
    pub fn scroll_v_ratio(&self) -> f64 {
        self.service.scroll_v_ratio()
    }

    /// All metrics as a JSON object string.
    pub fn snapshot(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.service.snapshot()).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Call `callback(event)` on every `resize` delivery with the original
    /// DOM resize event. Every subscriber and every delivery that stems from
    /// the same physical resize receives the same JS object.
    #[wasm_bindgen(js_name = onResize)]
    pub fn on_resize(&self, callback: js_sys::Function) -> u32 {
        let last = self.last_resize.clone();
        let id = self.service.on_resize(move |event| {
            let cached = last
                .borrow()
                .as_ref()
                .filter(|(seen, _)| Rc::ptr_eq(seen, event))
                .map(|(_, object)| object.clone());
            let object = match cached {
                Some(object) => object,
                None => {
                    let object = resize_event_value(event);
                    *last.borrow_mut() = Some((event.clone(), object.clone()));
                    object
                }
            };
            if let Err(err) = callback.call1(&JsValue::NULL, &object) {
                report(&err);
            }
        });
        to_js_id(id)
    }

    #[wasm_bindgen(js_name = offResize)]
    pub fn off_resize(&self, id: u32) -> bool {
        self.service.off_resize(SubscriptionId(u64::from(id)))
    }

    /// Call `callback(name)` with the camelCase metric name on every change
    /// notification.
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&self, callback: js_sys::Function) -> u32 {
        let id = self.service.observe(move |metric| {
            if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(metric.name())) {
                report(&err);
            }
        });
        to_js_id(id)
    }

    #[wasm_bindgen(js_name = offChange)]
    pub fn off_change(&self, id: u32) -> bool {
        self.service.unobserve(SubscriptionId(u64::from(id)))
    }

    /// Stop polling and unregister from the window. Safe to call twice.
    pub fn destroy(&self) {
        self.service.destroy();
    }
}
