use std::cell::{Cell, RefCell};

use serde::{Deserialize, Serialize};

use crate::metric::{DocumentElement, ElementProperty, WindowProperty};

use super::{
    FrameCallback, FrameId, ListenerId, NativeEvent, ResizeCallback, ResizeEvent, WindowHost,
};

/// Scroll and client box of one document element. `None` fields are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementState {
    pub client_height: Option<f64>,
    pub client_width: Option<f64>,
    pub scroll_top: Option<f64>,
    pub scroll_left: Option<f64>,
    pub scroll_height: Option<f64>,
    pub scroll_width: Option<f64>,
}

impl ElementState {
    pub fn get(&self, property: ElementProperty) -> Option<f64> {
        match property {
            ElementProperty::ClientHeight => self.client_height,
            ElementProperty::ClientWidth => self.client_width,
            ElementProperty::ScrollTop => self.scroll_top,
            ElementProperty::ScrollLeft => self.scroll_left,
            ElementProperty::ScrollHeight => self.scroll_height,
            ElementProperty::ScrollWidth => self.scroll_width,
        }
    }

    pub fn set(&mut self, property: ElementProperty, value: Option<f64>) {
        let slot = match property {
            ElementProperty::ClientHeight => &mut self.client_height,
            ElementProperty::ClientWidth => &mut self.client_width,
            ElementProperty::ScrollTop => &mut self.scroll_top,
            ElementProperty::ScrollLeft => &mut self.scroll_left,
            ElementProperty::ScrollHeight => &mut self.scroll_height,
            ElementProperty::ScrollWidth => &mut self.scroll_width,
        };
        *slot = value;
    }
}

/// Full observable state of a [`SimulatedWindow`].
///
/// A missing `root` or `body` models a document without that element; with
/// both missing the window behaves as if it had no document at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowState {
    pub inner_height: Option<f64>,
    pub inner_width: Option<f64>,
    pub outer_height: Option<f64>,
    pub outer_width: Option<f64>,
    pub screen_x: Option<f64>,
    pub screen_y: Option<f64>,
    pub root: Option<ElementState>,
    pub body: Option<ElementState>,
}

impl WindowState {
    pub fn get(&self, property: WindowProperty) -> Option<f64> {
        match property {
            WindowProperty::InnerHeight => self.inner_height,
            WindowProperty::InnerWidth => self.inner_width,
            WindowProperty::OuterHeight => self.outer_height,
            WindowProperty::OuterWidth => self.outer_width,
            WindowProperty::ScreenX => self.screen_x,
            WindowProperty::ScreenY => self.screen_y,
        }
    }

    pub fn set(&mut self, property: WindowProperty, value: Option<f64>) {
        let slot = match property {
            WindowProperty::InnerHeight => &mut self.inner_height,
            WindowProperty::InnerWidth => &mut self.inner_width,
            WindowProperty::OuterHeight => &mut self.outer_height,
            WindowProperty::OuterWidth => &mut self.outer_width,
            WindowProperty::ScreenX => &mut self.screen_x,
            WindowProperty::ScreenY => &mut self.screen_y,
        };
        *slot = value;
    }

    pub fn element(&self, element: DocumentElement) -> Option<&ElementState> {
        match element {
            DocumentElement::Root => self.root.as_ref(),
            DocumentElement::Body => self.body.as_ref(),
        }
    }

    fn element_mut(&mut self, element: DocumentElement) -> &mut ElementState {
        match element {
            DocumentElement::Root => self.root.get_or_insert_with(ElementState::default),
            DocumentElement::Body => self.body.get_or_insert_with(ElementState::default),
        }
    }
}

/// An in-memory window driven by hand.
///
/// Nothing happens on its own: resize events fire from [`resize`] and frame
/// callbacks run from [`advance_frame`]. Callbacks are always invoked with
/// no internal borrow held, so they may call back into the window.
///
/// [`resize`]: SimulatedWindow::resize
/// [`advance_frame`]: SimulatedWindow::advance_frame
pub struct SimulatedWindow {
    state: RefCell<WindowState>,
    listeners: RefCell<Vec<(ListenerId, ResizeCallback)>>,
    frames: RefCell<Vec<(FrameId, FrameCallback)>>,
    cancelled: RefCell<Vec<FrameId>>,
    next_id: Cell<u64>,
    clock: Cell<f64>,
}

impl SimulatedWindow {
    pub fn new() -> Self {
        Self::with_state(WindowState::default())
    }

    pub fn with_state(state: WindowState) -> Self {
        Self {
            state: RefCell::new(state),
            listeners: RefCell::new(Vec::new()),
            frames: RefCell::new(Vec::new()),
            cancelled: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            clock: Cell::new(0.0),
        }
    }

    pub fn state(&self) -> WindowState {
        self.state.borrow().clone()
    }

    pub fn replace_state(&self, state: WindowState) {
        *self.state.borrow_mut() = state;
    }

    pub fn set_window_property(&self, property: WindowProperty, value: Option<f64>) {
        self.state.borrow_mut().set(property, value);
    }

    /// Set one element property, creating the element if it is missing.
    pub fn set_element_property(
        &self,
        element: DocumentElement,
        property: ElementProperty,
        value: Option<f64>,
    ) {
        self.state
            .borrow_mut()
            .element_mut(element)
            .set(property, value);
    }

    pub fn remove_element(&self, element: DocumentElement) {
        let mut state = self.state.borrow_mut();
        match element {
            DocumentElement::Root => state.root = None,
            DocumentElement::Body => state.body = None,
        }
    }

    /// Scroll the root element.
    pub fn scroll_to(&self, left: f64, top: f64) {
        let mut state = self.state.borrow_mut();
        let root = state.element_mut(DocumentElement::Root);
        root.scroll_left = Some(left);
        root.scroll_top = Some(top);
    }

    /// Resize the viewport and dispatch a resize event to every listener.
    ///
    /// The inner size changes, and so does the root element's client box
    /// when a root element exists. Returns the number of listeners invoked.
    pub fn resize(&self, width: f64, height: f64) -> usize {
        self.resize_with(width, height, None)
    }

    /// [`resize`](Self::resize), with `native` attached to the dispatched
    /// event the way a browser host attaches its DOM event.
    pub fn resize_with(&self, width: f64, height: f64, native: Option<NativeEvent>) -> usize {
        {
            let mut state = self.state.borrow_mut();
            state.inner_width = Some(width);
            state.inner_height = Some(height);
            if let Some(root) = state.root.as_mut() {
                root.client_width = Some(width);
                root.client_height = Some(height);
            }
        }
        let event = ResizeEvent {
            time_stamp: self.clock.get(),
            inner_width: width,
            inner_height: height,
            native,
        };
        let listeners: Vec<ResizeCallback> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for listener in &listeners {
            listener(event.clone());
        }
        listeners.len()
    }

    /// Advance the clock by `delta_ms` and run the frame callbacks that were
    /// pending at this moment. Frames requested by those callbacks wait for
    /// the next call. Returns the number of callbacks run.
    pub fn advance_frame(&self, delta_ms: f64) -> usize {
        let now = self.clock.get() + delta_ms;
        self.clock.set(now);
        let due = std::mem::take(&mut *self.frames.borrow_mut());
        let count = due.len();
        for (_, callback) in due {
            callback(now);
        }
        count
    }

    /// Host time in milliseconds.
    pub fn now(&self) -> f64 {
        self.clock.get()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn pending_frames(&self) -> Vec<FrameId> {
        self.frames.borrow().iter().map(|(id, _)| *id).collect()
    }

    pub fn cancelled_frames(&self) -> Vec<FrameId> {
        self.cancelled.borrow().clone()
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl Default for SimulatedWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowHost for SimulatedWindow {
    fn window_property(&self, property: WindowProperty) -> Option<f64> {
        self.state.borrow().get(property)
    }

    fn element_property(&self, element: DocumentElement, property: ElementProperty) -> Option<f64> {
        self.state
            .borrow()
            .element(element)
            .and_then(|e| e.get(property))
    }

    fn add_resize_listener(&self, callback: ResizeCallback) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.listeners.borrow_mut().push((id, callback));
        id
    }

    fn remove_resize_listener(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(existing, _)| *existing != id);
    }

    fn request_animation_frame(&self, callback: FrameCallback) -> FrameId {
        let id = FrameId(self.next_id());
        self.frames.borrow_mut().push((id, callback));
        id
    }

    fn cancel_animation_frame(&self, id: FrameId) {
        let mut frames = self.frames.borrow_mut();
        let before = frames.len();
        frames.retain(|(existing, _)| *existing != id);
        if frames.len() != before {
            self.cancelled.borrow_mut().push(id);
        }
    }
}
