//! Error taxonomy for the macro engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type. Each variant corresponds to a distinct failure
/// class with its own propagation policy: `State` and `Format` fail fast
/// with no partial state change, `Device` is recovered locally during
/// playback, `EmptyMacro` rejects a load without displacing the macro
/// already installed.
#[derive(Debug, Error)]
pub enum Error {
    /// Operation invalid for the component's current state, e.g.
    /// `stop()` while idle or `start()` while already recording.
    #[error("StateError: {0}")]
    State(String),

    /// A macro with zero events was offered for playback.
    #[error("EmptyMacroError: macro has no events to play")]
    EmptyMacro,

    /// A persisted record is structurally invalid.
    #[error("FormatError: {0}")]
    Format(String),

    /// A single OS input/output call failed.
    #[error("DeviceError: {0}")]
    Device(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Format(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Format(format!("io: {err}"))
    }
}
