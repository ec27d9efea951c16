//! Canonical pointer events and the macro container.
//!
//! Events serialize to the same flat JSON the original file format used:
//! a `timestamp` plus an `event_type` tag with only the fields that kind
//! carries, so an invalid field combination cannot be represented.

use serde::{Deserialize, Serialize};

/// Format tag written into every persisted macro.
pub const FORMAT_VERSION: &str = "1.0";

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// Any button we cannot name. Unrecognized strings in persisted
    /// records also land here instead of failing the whole load.
    Unknown,
}

impl From<String> for MouseButton {
    fn from(s: String) -> Self {
        match s.as_str() {
            "left" => MouseButton::Left,
            "right" => MouseButton::Right,
            "middle" => MouseButton::Middle,
            _ => MouseButton::Unknown,
        }
    }
}

/// One captured pointer action, stamped with seconds elapsed since the
/// recording started. Timestamps within a macro are non-decreasing; ties
/// keep insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseEvent {
    pub timestamp: f64,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Event payload, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "lowercase")]
pub enum EventKind {
    /// Cursor moved to (x, y).
    Move { x: i32, y: i32 },
    /// Button press (`pressed == true`) or release at (x, y).
    Click {
        x: i32,
        y: i32,
        button: MouseButton,
        pressed: bool,
    },
    /// Scroll wheel ticks at (x, y). Deltas are signed line counts.
    Scroll {
        x: i32,
        y: i32,
        dx: i32,
        dy: i32,
    },
}

impl MouseEvent {
    pub fn moved(timestamp: f64, x: i32, y: i32) -> Self {
        Self {
            timestamp,
            kind: EventKind::Move { x, y },
        }
    }

    pub fn clicked(timestamp: f64, x: i32, y: i32, button: MouseButton, pressed: bool) -> Self {
        Self {
            timestamp,
            kind: EventKind::Click {
                x,
                y,
                button,
                pressed,
            },
        }
    }

    pub fn scrolled(timestamp: f64, x: i32, y: i32, dx: i32, dy: i32) -> Self {
        Self {
            timestamp,
            kind: EventKind::Scroll { x, y, dx, dy },
        }
    }
}

/// A named, ordered, immutable recording of pointer events.
///
/// A `Macro` is only ever built by [`Recorder::get_macro`] or the
/// serializer; after that every consumer shares it read-only (the player
/// holds an `Arc<Macro>` and never mutates).
///
/// [`Recorder::get_macro`]: crate::recorder::Recorder::get_macro
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macro {
    pub name: String,
    /// Unix timestamp (seconds) of the moment recording started.
    #[serde(default)]
    pub created_at: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub events: Vec<MouseEvent>,
}

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

impl Macro {
    pub fn new(
        name: impl Into<String>,
        created_at: f64,
        description: impl Into<String>,
        events: Vec<MouseEvent>,
    ) -> Self {
        Self {
            name: name.into(),
            created_at,
            description: description.into(),
            version: FORMAT_VERSION.to_string(),
            events,
        }
    }

    /// Timestamp of the last event; 0.0 for an empty macro.
    pub fn duration(&self) -> f64 {
        self.events.last().map_or(0.0, |e| e.timestamp)
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
