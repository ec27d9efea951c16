//! mousemacro - record and replay mouse macros with timing fidelity.
//!
//! The engine captures pointer actions (moves, clicks, scroll ticks) with
//! elapsed-time stamps, wraps them into named immutable macros, persists
//! them as JSON, and replays them preserving inter-event timing.
//!
//! The OS is reached only through two injected seams: an [`InputHook`]
//! feeding the [`Recorder`] and a [`PointerOutput`] driven by the
//! [`Player`]. Real platform backends (event taps, `SendInput`, XRecord)
//! live in the crates that embed this one.
//!
//! ```no_run
//! use mousemacro::prelude::*;
//! use std::time::Duration;
//!
//! # fn demo(hook: Box<dyn InputHook>, output: Box<dyn PointerOutput>) -> mousemacro::Result<()> {
//! let mut recorder = Recorder::new(hook);
//! recorder.start()?;
//! // ... user moves and clicks ...
//! recorder.stop()?;
//! let mac = recorder.get_macro("login", "clicks through the login form")?;
//!
//! let json = storage::to_json(&mac)?;
//! let mac = storage::from_json(&json)?;
//!
//! let mut player = Player::new(output);
//! player.load(mac)?;
//! player.start(false, Duration::ZERO)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod event;
pub mod hook;
pub mod player;
pub mod recorder;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
pub use event::{EventKind, Macro, MouseButton, MouseEvent, FORMAT_VERSION};
pub use hook::{EventSink, InputHook, PointerOutput, RawPointerEvent};
pub use player::Player;
pub use recorder::Recorder;
pub use storage::MacroStore;

pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::event::{EventKind, Macro, MouseButton, MouseEvent};
    pub use crate::hook::{InputHook, PointerOutput, RawPointerEvent};
    pub use crate::player::Player;
    pub use crate::recorder::Recorder;
    pub use crate::storage::{self, MacroStore};
}
