use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use windoc_core::host::{
    FrameCallback, FrameId, ListenerId, NativeEvent, ResizeCallback, ResizeEvent, WindowHost,
};
use windoc_core::metric::{DocumentElement, ElementProperty, Metric, WindowProperty};

type ResizeClosure = Closure<dyn FnMut(web_sys::Event)>;

/// [`WindowHost`] over the real browser `window`.
///
/// Resize closures are owned here and dropped when their listener is
/// removed. Each dispatched [`ResizeEvent`] carries the DOM `Event` as its
/// `native` payload. Frame closures are handed to JS with `once_into_js` and free
/// themselves when they run.
pub struct BrowserWindow {
    window: web_sys::Window,
    listeners: RefCell<HashMap<ListenerId, ResizeClosure>>,
    next_listener: Cell<u64>,
}

impl BrowserWindow {
    pub fn new(window: web_sys::Window) -> Self {
        Self {
            window,
            listeners: RefCell::new(HashMap::new()),
            next_listener: Cell::new(1),
        }
    }

    /// The global `window`, if there is one.
    pub fn current() -> Option<Self> {
        web_sys::window().map(Self::new)
    }
}

fn js_number(value: Result<JsValue, JsValue>) -> Option<f64> {
    value.ok().and_then(|v| v.as_f64())
}

fn warn(message: &str, err: &JsValue) {
    web_sys::console::warn_1(&format!("windoc: {message}: {err:?}").into());
}

impl WindowHost for BrowserWindow {
    fn window_property(&self, property: WindowProperty) -> Option<f64> {
        let w = &self.window;
        js_number(match property {
            WindowProperty::InnerHeight => w.inner_height(),
            WindowProperty::InnerWidth => w.inner_width(),
            WindowProperty::OuterHeight => w.outer_height(),
            WindowProperty::OuterWidth => w.outer_width(),
            WindowProperty::ScreenX => w.screen_x(),
            WindowProperty::ScreenY => w.screen_y(),
        })
    }

    fn element_property(&self, element: DocumentElement, property: ElementProperty) -> Option<f64> {
        let document = self.window.document()?;
        let target: JsValue = match element {
            DocumentElement::Root => document.document_element()?.into(),
            DocumentElement::Body => document.body()?.into(),
        };
        let key = JsValue::from_str(Metric::from(property).name());
        js_sys::Reflect::get(&target, &key).ok()?.as_f64()
    }

    fn add_resize_listener(&self, callback: ResizeCallback) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);

        let window = self.window.clone();
        let closure = ResizeClosure::new(move |event: web_sys::Event| {
            callback(ResizeEvent {
                time_stamp: event.time_stamp(),
                inner_width: js_number(window.inner_width()).unwrap_or(0.0),
                inner_height: js_number(window.inner_height()).unwrap_or(0.0),
                native: Some(NativeEvent::new(JsValue::from(event))),
            });
        });
        if let Err(err) = self
            .window
            .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
        {
            warn("addEventListener failed", &err);
        }
        self.listeners.borrow_mut().insert(id, closure);
        id
    }

    fn remove_resize_listener(&self, id: ListenerId) {
        let Some(closure) = self.listeners.borrow_mut().remove(&id) else {
            return;
        };
        if let Err(err) = self
            .window
            .remove_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
        {
            warn("removeEventListener failed", &err);
        }
    }

    fn request_animation_frame(&self, callback: FrameCallback) -> FrameId {
        let closure = Closure::once_into_js(move |timestamp: f64| callback(timestamp));
        match self.window.request_animation_frame(closure.unchecked_ref()) {
            Ok(handle) => u64::try_from(handle).map_or(FrameId::NONE, FrameId),
            Err(err) => {
                warn("requestAnimationFrame failed", &err);
                FrameId::NONE
            }
        }
    }

    fn cancel_animation_frame(&self, id: FrameId) {
        if id == FrameId::NONE {
            return;
        }
        let Ok(handle) = i32::try_from(id.0) else {
            return;
        };
        if let Err(err) = self.window.cancel_animation_frame(handle) {
            warn("cancelAnimationFrame failed", &err);
        }
    }
}

impl Drop for BrowserWindow {
    fn drop(&mut self) {
        let ids: Vec<ListenerId> = self.listeners.borrow().keys().copied().collect();
        for id in ids {
            self.remove_resize_listener(id);
        }
    }
}
