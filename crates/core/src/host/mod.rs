//! The window object the service binds to.
//!
//! A [`WindowHost`] is the whole system boundary: property reads, the
//! `resize` listener and the animation-frame scheduler. The browser binding
//! lives in `windoc-wasm`; this module carries the server-rendering stand-in
//! ([`NullWindow`]) and a scriptable [`SimulatedWindow`].

mod null;
mod sim;

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::metric::{DocumentElement, ElementProperty, WindowProperty};

pub use null::NullWindow;
pub use sim::{ElementState, SimulatedWindow, WindowState};

/// Handle for a registered resize listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

/// Handle for a pending animation-frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameId(pub u64);

impl FrameId {
    /// Returned when the host could not schedule a frame. Cancelling it is a no-op.
    pub const NONE: FrameId = FrameId(0);
}

/// The event a host dispatches to resize listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeEvent {
    /// Host timestamp of the event, in milliseconds.
    pub time_stamp: f64,
    pub inner_width: f64,
    pub inner_height: f64,
    /// The host's own event object, handed through untouched.
    #[serde(skip)]
    pub native: Option<NativeEvent>,
}

/// Opaque handle on a host event object.
///
/// Equality is identity: two handles are equal when they share one
/// allocation.
#[derive(Clone)]
pub struct NativeEvent(Rc<dyn Any>);

impl NativeEvent {
    pub fn new<T: Any>(event: T) -> Self {
        Self(Rc::new(event))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    pub fn ptr_eq(&self, other: &NativeEvent) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for NativeEvent {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for NativeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NativeEvent(..)")
    }
}

pub type ResizeCallback = Rc<dyn Fn(ResizeEvent)>;

/// Invoked once with the frame timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// A window object as seen by the metrics service.
///
/// Reads return `None` when the property (or the document, or the element)
/// does not exist. Callbacks must not be invoked synchronously from inside
/// `add_resize_listener` or `request_animation_frame`.
pub trait WindowHost {
    fn window_property(&self, property: WindowProperty) -> Option<f64>;

    fn element_property(&self, element: DocumentElement, property: ElementProperty) -> Option<f64>;

    fn add_resize_listener(&self, callback: ResizeCallback) -> ListenerId;

    fn remove_resize_listener(&self, id: ListenerId);

    fn request_animation_frame(&self, callback: FrameCallback) -> FrameId;

    fn cancel_animation_frame(&self, id: FrameId);
}

/// Pick the window to bind to.
///
/// In a server-rendering context the [`NullWindow`] stand-in is returned and
/// `browser` is never called, so no real window API is touched.
pub fn select_host<F>(server_rendered: bool, browser: F) -> Rc<dyn WindowHost>
where
    F: FnOnce() -> Rc<dyn WindowHost>,
{
    if server_rendered {
        tracing::debug!("server-rendering context, binding to the null window");
        Rc::new(NullWindow)
    } else {
        browser()
    }
}
