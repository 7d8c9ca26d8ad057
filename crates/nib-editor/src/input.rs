//! Input abstraction layer.
//!
//! Normalizes mouse, touch, and stylus events from the host into
//! immutable `Pointer` snapshots and a unified `InputEvent` enum consumed
//! by the tool controller. A fresh snapshot is created per event; nothing
//! here is mutated after construction.

use nib_core::vec::Vec2;
use nib_core::viewport::Viewport;

/// The kind of device behind a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerDevice {
    Pen,
    Touch,
    Mouse,
    Other,
}

/// An immutable snapshot of one pointer at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub screen_pos: Vec2,
    pub canvas_pos: Vec2,
    /// Stylus pressure 0.0..1.0; `None` for devices that don't report it.
    pub pressure: Option<f64>,
    pub device: PointerDevice,
    /// Host-assigned id, stable for the lifetime of one contact.
    pub id: u32,
    pub is_down: bool,
    /// The first/primary contact of a gesture.
    pub is_primary: bool,
    pub time_ms: f64,
}

impl Pointer {
    /// Build a snapshot from a screen position, resolving the canvas
    /// position through the viewport.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        screen_pos: Vec2,
        viewport: &Viewport,
        pressure: Option<f64>,
        device: PointerDevice,
        id: u32,
        is_down: bool,
        is_primary: bool,
        time_ms: f64,
    ) -> Self {
        Self {
            screen_pos,
            canvas_pos: viewport.screen_to_canvas(screen_pos),
            pressure,
            device,
            id,
            is_down,
            is_primary,
            time_ms,
        }
    }

    /// A down primary mouse pointer — the common case in tests and hosts
    /// without multi-touch.
    pub fn down(screen_pos: Vec2, viewport: &Viewport, time_ms: f64) -> Self {
        Self::new(screen_pos, viewport, None, PointerDevice::Mouse, 0, true, true, time_ms)
    }

    /// The same contact at a new position.
    pub fn moved_to(&self, screen_pos: Vec2, viewport: &Viewport, time_ms: f64) -> Self {
        Self {
            screen_pos,
            canvas_pos: viewport.screen_to_canvas(screen_pos),
            time_ms,
            ..*self
        }
    }

    /// The same contact lifted.
    pub fn lifted(&self, time_ms: f64) -> Self {
        Self { is_down: false, time_ms, ..*self }
    }
}

/// A normalized input event from the host UI.
#[derive(Debug, Clone)]
pub enum InputEvent {
    PointerDown {
        pointer: Pointer,
        /// Every pointer currently down, including `pointer`.
        all_pointers: Vec<Pointer>,
    },
    PointerMove {
        pointer: Pointer,
        all_pointers: Vec<Pointer>,
    },
    PointerUp {
        pointer: Pointer,
        /// Pointers still down after this one lifted.
        all_pointers: Vec<Pointer>,
    },
    Wheel {
        screen_pos: Vec2,
        delta: Vec2,
    },
    KeyPress {
        key: String,
    },
    /// The host aborted the gesture (palm rejection, focus loss, system
    /// gesture). The capturing tool must revert its preview state.
    GestureCancel,
}
