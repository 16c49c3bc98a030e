use crate::metric::{DocumentElement, ElementProperty, WindowProperty};

use super::{FrameCallback, FrameId, ListenerId, ResizeCallback, WindowHost};

/// Stand-in window for server-rendering contexts.
///
/// Every reading is absent and every operation is a no-op. Frame callbacks
/// are dropped without running, so a service bound here requests exactly one
/// frame and then goes quiet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullWindow;

impl WindowHost for NullWindow {
    fn window_property(&self, _property: WindowProperty) -> Option<f64> {
        None
    }

    fn element_property(&self, _element: DocumentElement, _property: ElementProperty) -> Option<f64> {
        None
    }

    fn add_resize_listener(&self, _callback: ResizeCallback) -> ListenerId {
        ListenerId(0)
    }

    fn remove_resize_listener(&self, _id: ListenerId) {}

    fn request_animation_frame(&self, _callback: FrameCallback) -> FrameId {
        FrameId::NONE
    }

    fn cancel_animation_frame(&self, _id: FrameId) {}
}
