//! In-memory collaborator doubles shared by the unit tests.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::event::MouseButton;
use crate::hook::{EventSink, InputHook, PointerOutput, RawPointerEvent};

/// Hook double: the test drives it by calling [`FakeHook::emit`], which
/// invokes the subscribed sink synchronously, exactly like an OS hook
/// delivering on its own thread.
#[derive(Clone, Default)]
pub struct FakeHook {
    sink: Arc<Mutex<Option<EventSink>>>,
}

impl FakeHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, raw: RawPointerEvent) {
        if let Some(sink) = &*self.sink.lock() {
            sink(raw);
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.sink.lock().is_some()
    }
}

impl InputHook for FakeHook {
    fn subscribe(&mut self, sink: EventSink) -> Result<()> {
        let mut slot = self.sink.lock();
        if slot.is_some() {
            return Err(Error::Device("hook already subscribed".into()));
        }
        *slot = Some(sink);
        Ok(())
    }

    fn unsubscribe(&mut self) -> Result<()> {
        // Dropping the sink before returning upholds the "no callback
        // after unsubscribe" contract.
        self.sink.lock().take();
        Ok(())
    }
}

/// One call the player issued to its output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputAction {
    Position(i32, i32),
    Press(MouseButton),
    Release(MouseButton),
    Scroll(i32, i32),
}

/// Output double that records every successful call with its arrival
/// instant. Clones share the same log.
#[derive(Clone)]
pub struct RecordingOutput {
    log: Arc<Mutex<Vec<(Instant, OutputAction)>>>,
    fail_presses: bool,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            fail_presses: false,
        }
    }

    /// Variant whose `press` always fails, for device-error recovery
    /// tests. Failed calls are not logged.
    pub fn failing_presses() -> Self {
        Self {
            fail_presses: true,
            ..Self::new()
        }
    }

    pub fn actions(&self) -> Vec<OutputAction> {
        self.log.lock().iter().map(|(_, a)| *a).collect()
    }

    pub fn instants(&self) -> Vec<Instant> {
        self.log.lock().iter().map(|(t, _)| *t).collect()
    }
}

impl PointerOutput for RecordingOutput {
    fn set_position(&mut self, x: i32, y: i32) -> Result<()> {
        self.log.lock().push((Instant::now(), OutputAction::Position(x, y)));
        Ok(())
    }

    fn press(&mut self, button: MouseButton) -> Result<()> {
        if self.fail_presses {
            return Err(Error::Device("synthetic press rejected".into()));
        }
        self.log.lock().push((Instant::now(), OutputAction::Press(button)));
        Ok(())
    }

    fn release(&mut self, button: MouseButton) -> Result<()> {
        self.log.lock().push((Instant::now(), OutputAction::Release(button)));
        Ok(())
    }

    fn scroll(&mut self, dx: i32, dy: i32) -> Result<()> {
        self.log.lock().push((Instant::now(), OutputAction::Scroll(dx, dy)));
        Ok(())
    }
}
