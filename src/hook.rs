//! Seams to the operating system's pointer input and output.
//!
//! The engine never talks to the OS directly. A [`Recorder`] consumes an
//! [`InputHook`] and a [`Player`] consumes a [`PointerOutput`]; real
//! backends (CGEventTap, SendInput, XRecord, ...) live outside this crate
//! and are injected, which also keeps every session's device ownership
//! explicit.
//!
//! [`Recorder`]: crate::recorder::Recorder
//! [`Player`]: crate::player::Player

use crate::error::Result;
use crate::event::MouseButton;

/// One hook notification, exactly as delivered by the OS: no timestamp
/// yet, the recorder stamps elapsed time on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawPointerEvent {
    Move {
        x: i32,
        y: i32,
    },
    Button {
        x: i32,
        y: i32,
        button: MouseButton,
        pressed: bool,
    },
    Wheel {
        x: i32,
        y: i32,
        dx: i32,
        dy: i32,
    },
}

/// Callback a hook drives with raw notifications. Invoked on a thread the
/// hook owns.
pub type EventSink = Box<dyn Fn(RawPointerEvent) + Send + Sync>;

/// OS-level pointer event source.
///
/// A hook carries at most one subscription at a time; subscribing an
/// already-subscribed hook may fail. Contract: `unsubscribe` is
/// synchronous — after it returns, the sink is never invoked again.
pub trait InputHook: Send {
    fn subscribe(&mut self, sink: EventSink) -> Result<()>;
    fn unsubscribe(&mut self) -> Result<()>;
}

/// OS-level synthetic pointer output.
///
/// Coordinates and deltas pass through unmodified; bounds handling is the
/// backend's business. Failures surface as [`Error::Device`] and must not
/// carry any state that would poison subsequent calls.
///
/// [`Error::Device`]: crate::error::Error::Device
pub trait PointerOutput: Send {
    fn set_position(&mut self, x: i32, y: i32) -> Result<()>;
    fn press(&mut self, button: MouseButton) -> Result<()>;
    fn release(&mut self, button: MouseButton) -> Result<()>;
    fn scroll(&mut self, dx: i32, dy: i32) -> Result<()>;
}
