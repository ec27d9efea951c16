//! Capture engine: turns hook notifications into a timed event buffer.
//!
//! Hook callbacks run on a thread the OS owns, so the callback never
//! touches recorder state directly. It stamps the elapsed time, notifies
//! the live observer, and posts the event onto a channel; the recorder
//! drains that channel from its own thread when the session stops. The
//! hook's synchronous `unsubscribe` guarantees no send races the drain.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver};

use crate::error::{Error, Result};
use crate::event::{Macro, MouseEvent};
use crate::hook::{InputHook, RawPointerEvent};

/// Live feedback callback, invoked once per captured event from the
/// hook's delivery thread. Side effect only; a panic inside it is
/// swallowed so it cannot corrupt the capture.
pub type RecordObserver = Arc<dyn Fn(&MouseEvent) + Send + Sync>;

/// Records pointer events delivered by an injected [`InputHook`].
///
/// Two states, Idle and Recording. `start` and `stop` cycle between them;
/// `get_macro` wraps the most recently captured session.
pub struct Recorder {
    hook: Box<dyn InputHook>,
    recording: bool,
    rx: Option<Receiver<MouseEvent>>,
    /// Wall-clock stamp of the last `start()`, unix seconds.
    session_started_at: f64,
    /// Events of the last completed session. `None` until the first stop.
    captured: Option<Vec<MouseEvent>>,
    observer: Option<RecordObserver>,
}

impl Recorder {
    pub fn new(hook: Box<dyn InputHook>) -> Self {
        Self {
            hook,
            recording: false,
            rx: None,
            session_started_at: 0.0,
            captured: None,
            observer: None,
        }
    }

    /// Register a per-event observer. Takes effect at the next `start()`.
    pub fn set_observer(&mut self, observer: impl Fn(&MouseEvent) + Send + Sync + 'static) {
        self.observer = Some(Arc::new(observer));
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Begin a recording session: reset the buffer, capture the start
    /// reference, subscribe to the hook.
    pub fn start(&mut self) -> Result<()> {
        if self.recording {
            return Err(Error::State("already recording".into()));
        }

        let (tx, rx) = unbounded::<MouseEvent>();
        let start = Instant::now();
        let observer = self.observer.clone();

        self.hook.subscribe(Box::new(move |raw| {
            let event = stamp(raw, start.elapsed().as_secs_f64());
            if let Some(obs) = &observer {
                if catch_unwind(AssertUnwindSafe(|| obs(&event))).is_err() {
                    log::warn!("recording observer panicked; event kept");
                }
            }
            let _ = tx.send(event);
        }))?;

        self.session_started_at = unix_now();
        self.rx = Some(rx);
        self.recording = true;
        log::debug!("recording started");
        Ok(())
    }

    /// End the session and return the captured events in order.
    ///
    /// Unsubscribes before reading, so nothing can append concurrently
    /// with the drain.
    pub fn stop(&mut self) -> Result<Vec<MouseEvent>> {
        if !self.recording {
            return Err(Error::State("not currently recording".into()));
        }

        self.hook.unsubscribe()?;
        let events: Vec<MouseEvent> = self
            .rx
            .take()
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default();

        self.recording = false;
        log::debug!("recording stopped with {} events", events.len());
        self.captured = Some(events.clone());
        Ok(events)
    }

    /// Wrap the last captured session into a named macro. Zero events is
    /// a legal macro. Invalid while Recording or before any completed
    /// session.
    pub fn get_macro(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Macro> {
        if self.recording {
            return Err(Error::State(
                "cannot build a macro while recording; stop first".into(),
            ));
        }
        let events = self
            .captured
            .as_ref()
            .ok_or_else(|| Error::State("no recording has been captured yet".into()))?;

        Ok(Macro::new(
            name,
            self.session_started_at,
            description,
            events.clone(),
        ))
    }
}

fn stamp(raw: RawPointerEvent, timestamp: f64) -> MouseEvent {
    match raw {
        RawPointerEvent::Move { x, y } => MouseEvent::moved(timestamp, x, y),
        RawPointerEvent::Button {
            x,
            y,
            button,
            pressed,
        } => MouseEvent::clicked(timestamp, x, y, button, pressed),
        RawPointerEvent::Wheel { x, y, dx, dy } => MouseEvent::scrolled(timestamp, x, y, dx, dy),
    }
}

fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, MouseButton};
    use crate::testing::FakeHook;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder() -> (Recorder, FakeHook) {
        let hook = FakeHook::new();
        (Recorder::new(Box::new(hook.clone())), hook)
    }

    #[test]
    fn start_while_recording_is_state_error() {
        let (mut rec, _hook) = recorder();
        rec.start().unwrap();
        assert!(matches!(rec.start(), Err(Error::State(_))));
    }

    #[test]
    fn stop_while_idle_is_state_error() {
        let (mut rec, _hook) = recorder();
        assert!(matches!(rec.stop(), Err(Error::State(_))));
    }

    #[test]
    fn get_macro_while_recording_is_state_error() {
        let (mut rec, _hook) = recorder();
        rec.start().unwrap();
        assert!(matches!(rec.get_macro("m", ""), Err(Error::State(_))));
    }

    #[test]
    fn get_macro_before_any_session_is_state_error() {
        let (rec, _hook) = recorder();
        assert!(matches!(rec.get_macro("m", ""), Err(Error::State(_))));
    }

    #[test]
    fn captures_events_in_order_with_elapsed_stamps() {
        let (mut rec, hook) = recorder();
        rec.start().unwrap();

        hook.emit(RawPointerEvent::Move { x: 10, y: 10 });
        hook.emit(RawPointerEvent::Button {
            x: 10,
            y: 10,
            button: MouseButton::Left,
            pressed: true,
        });
        hook.emit(RawPointerEvent::Wheel {
            x: 10,
            y: 10,
            dx: 0,
            dy: -2,
        });

        let events = rec.stop().unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0].kind, EventKind::Move { x: 10, y: 10 }));
        assert!(matches!(
            events[1].kind,
            EventKind::Click {
                button: MouseButton::Left,
                pressed: true,
                ..
            }
        ));
        assert!(matches!(events[2].kind, EventKind::Scroll { dy: -2, .. }));

        // Elapsed stamps never run backwards.
        for pair in events.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn stop_unsubscribes_before_reading() {
        let (mut rec, hook) = recorder();
        rec.start().unwrap();
        hook.emit(RawPointerEvent::Move { x: 1, y: 1 });
        let events = rec.stop().unwrap();
        assert_eq!(events.len(), 1);
        assert!(!hook.is_subscribed());

        // A hardware event arriving after stop is dropped, not queued
        // into the next session.
        hook.emit(RawPointerEvent::Move { x: 2, y: 2 });
        rec.start().unwrap();
        let events = rec.stop().unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn empty_session_yields_legal_macro() {
        let (mut rec, _hook) = recorder();
        rec.start().unwrap();
        rec.stop().unwrap();
        let m = rec.get_macro("nothing", "no events").unwrap();
        assert!(m.is_empty());
        assert_eq!(m.name, "nothing");
        assert!(m.created_at > 0.0);
    }

    #[test]
    fn observer_sees_each_event_and_panics_are_swallowed() {
        let (mut rec, hook) = recorder();
        static SEEN: AtomicUsize = AtomicUsize::new(0);
        rec.set_observer(|_event| {
            SEEN.fetch_add(1, Ordering::SeqCst);
            panic!("listener misbehaves");
        });

        rec.start().unwrap();
        hook.emit(RawPointerEvent::Move { x: 0, y: 0 });
        hook.emit(RawPointerEvent::Move { x: 1, y: 1 });
        let events = rec.stop().unwrap();

        assert_eq!(SEEN.load(Ordering::SeqCst), 2);
        // Capture survived the panicking observer.
        assert_eq!(events.len(), 2);
    }
}
