//! Playback engine: replays a macro against an injected output device,
//! preserving inter-event timing.
//!
//! One dedicated thread per playback session. Pause, resume and stop are
//! condvar-driven: every wait the session performs (initial delay, pause,
//! inter-event gap) parks on the same condvar and is woken by `resume()`
//! or `stop()`, so resume latency is bounded and `stop()` joins promptly.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};
use crate::event::{EventKind, Macro, MouseEvent};
use crate::hook::PointerOutput;

/// Per-event playback observer, invoked with `(event, index)` just before
/// the event's effect is issued. Panics are swallowed.
pub type PlayObserver = Arc<dyn Fn(&MouseEvent, usize) + Send + Sync>;

/// Session-end notification, fired exactly once per session: `completed`
/// for a natural end, `stopped` for cancellation.
pub type SessionCallback = Arc<dyn Fn() + Send + Sync>;

/// State shared between the player handle and the playback thread.
struct Shared {
    cancel: AtomicBool,
    active: AtomicBool,
    index: AtomicUsize,
    paused: Mutex<bool>,
    cond: Condvar,
}

impl Shared {
    fn new() -> Self {
        Self {
            cancel: AtomicBool::new(false),
            active: AtomicBool::new(false),
            index: AtomicUsize::new(0),
            paused: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Park while the pause flag is set. Returns true if cancelled.
    fn wait_while_paused(&self) -> bool {
        let mut paused = self.paused.lock();
        while *paused && !self.cancel.load(Ordering::SeqCst) {
            self.cond.wait(&mut paused);
        }
        self.cancel.load(Ordering::SeqCst)
    }

    /// Sleep for `dur`, waking early only on cancellation. Returns true
    /// if cancelled.
    fn sleep_cancellable(&self, dur: Duration) -> bool {
        if dur.is_zero() {
            return self.cancel.load(Ordering::SeqCst);
        }
        let deadline = Instant::now() + dur;
        let mut guard = self.paused.lock();
        while !self.cancel.load(Ordering::SeqCst) {
            if self.cond.wait_until(&mut guard, deadline).timed_out() {
                return self.cancel.load(Ordering::SeqCst);
            }
        }
        true
    }

    fn wake(&self) {
        self.cond.notify_all();
    }
}

/// Replays a loaded [`Macro`] through an injected [`PointerOutput`].
///
/// States: Idle, Playing, with Paused a sub-state of Playing. Inter-event
/// waits are the deltas between consecutive timestamps, measured from the
/// moment the previous event finished; per-event overhead therefore
/// accumulates over a long macro rather than being reconciled against an
/// absolute schedule. That drift is an accepted characteristic of the
/// format, not a bug.
pub struct Player {
    output: Arc<Mutex<Box<dyn PointerOutput>>>,
    current: Option<Arc<Macro>>,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    on_event: Option<PlayObserver>,
    on_complete: Option<SessionCallback>,
    on_stopped: Option<SessionCallback>,
    speed: f64,
}

impl Player {
    pub fn new(output: Box<dyn PointerOutput>) -> Self {
        Self {
            output: Arc::new(Mutex::new(output)),
            current: None,
            shared: Arc::new(Shared::new()),
            worker: None,
            on_event: None,
            on_complete: None,
            on_stopped: None,
            speed: 1.0,
        }
    }

    /// Playback speed multiplier: 1.0 is real time, 2.0 twice as fast.
    /// Non-positive or non-finite values are ignored.
    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() && speed > 0.0 {
            self.speed = speed;
        }
    }

    pub fn set_observer(&mut self, observer: impl Fn(&MouseEvent, usize) + Send + Sync + 'static) {
        self.on_event = Some(Arc::new(observer));
    }

    pub fn set_complete_callback(&mut self, cb: impl Fn() + Send + Sync + 'static) {
        self.on_complete = Some(Arc::new(cb));
    }

    pub fn set_stopped_callback(&mut self, cb: impl Fn() + Send + Sync + 'static) {
        self.on_stopped = Some(Arc::new(cb));
    }

    /// Load a macro for playback, replacing the previous one.
    ///
    /// Rejects a zero-event macro with [`Error::EmptyMacro`]; on any
    /// failure the previously loaded macro stays installed untouched.
    pub fn load(&mut self, mac: Macro) -> Result<()> {
        if self.shared.active.load(Ordering::SeqCst) {
            return Err(Error::State("cannot load while playing".into()));
        }
        if mac.is_empty() {
            return Err(Error::EmptyMacro);
        }
        self.current = Some(Arc::new(mac));
        self.shared.index.store(0, Ordering::SeqCst);
        Ok(())
    }

    pub fn loaded_macro(&self) -> Option<Arc<Macro>> {
        self.current.clone()
    }

    /// Playing or paused.
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.is_active() && *self.shared.paused.lock()
    }

    pub fn is_playing(&self) -> bool {
        self.is_active() && !*self.shared.paused.lock()
    }

    /// Index of the event the session last reached. Reset to 0 by
    /// [`Player::load`] and [`Player::start`].
    pub fn current_index(&self) -> usize {
        self.shared.index.load(Ordering::SeqCst)
    }

    /// Fraction of the loaded macro reached so far: current event index
    /// over total event count. Reset to 0 by [`Player::load`].
    pub fn progress(&self) -> f64 {
        match &self.current {
            Some(mac) if !mac.is_empty() => {
                self.shared.index.load(Ordering::SeqCst) as f64 / mac.event_count() as f64
            }
            _ => 0.0,
        }
    }

    /// Start a playback session on a dedicated thread.
    ///
    /// Sleeps `delay_before` first (skipped if stopped during the sleep),
    /// then issues each event in order. With `looping` the whole session,
    /// delay included, restarts after the last event until `stop()`.
    pub fn start(&mut self, looping: bool, delay_before: Duration) -> Result<()> {
        if self.shared.active.load(Ordering::SeqCst) {
            return Err(Error::State("already playing".into()));
        }
        let mac = self
            .current
            .clone()
            .ok_or_else(|| Error::State("no macro loaded".into()))?;

        // Reap the thread of a naturally finished previous session.
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }

        self.shared.cancel.store(false, Ordering::SeqCst);
        self.shared.index.store(0, Ordering::SeqCst);
        *self.shared.paused.lock() = false;
        self.shared.active.store(true, Ordering::SeqCst);

        let session = Session {
            mac,
            shared: self.shared.clone(),
            output: self.output.clone(),
            on_event: self.on_event.clone(),
            on_complete: self.on_complete.clone(),
            on_stopped: self.on_stopped.clone(),
            looping,
            delay_before,
            speed: self.speed,
        };
        self.worker = Some(thread::spawn(move || session.run()));
        log::debug!("playback started (looping: {looping})");
        Ok(())
    }

    /// Cancel the session and wait for the playback thread to exit.
    /// Calling this while idle is a no-op, never an error.
    pub fn stop(&mut self) {
        // The cancel store must happen under the pause mutex: the worker
        // checks the flag while holding the lock and only then parks on
        // the condvar, so a store+notify outside the lock could land in
        // that window and wake nobody, leaving a paused worker parked
        // with no deadline.
        {
            let _paused = self.shared.paused.lock();
            self.shared.cancel.store(true, Ordering::SeqCst);
        }
        self.shared.wake();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        *self.shared.paused.lock() = false;
    }

    /// Pause at the current event index. Meaningful only while playing.
    pub fn pause(&mut self) {
        if self.is_active() {
            *self.shared.paused.lock() = true;
        }
    }

    pub fn resume(&mut self) {
        *self.shared.paused.lock() = false;
        self.shared.wake();
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything one playback thread needs, moved into it at spawn.
struct Session {
    mac: Arc<Macro>,
    shared: Arc<Shared>,
    output: Arc<Mutex<Box<dyn PointerOutput>>>,
    on_event: Option<PlayObserver>,
    on_complete: Option<SessionCallback>,
    on_stopped: Option<SessionCallback>,
    looping: bool,
    delay_before: Duration,
    speed: f64,
}

impl Session {
    fn run(self) {
        let events = &self.mac.events;
        let mut completed = false;

        'session: loop {
            if self.shared.sleep_cancellable(self.delay_before) {
                break;
            }
            for (i, event) in events.iter().enumerate() {
                if self.shared.wait_while_paused() {
                    break 'session;
                }
                self.shared.index.store(i, Ordering::SeqCst);

                if let Some(obs) = &self.on_event {
                    if catch_unwind(AssertUnwindSafe(|| obs(event, i))).is_err() {
                        log::warn!("playback observer panicked at event {i}");
                    }
                }

                let result = {
                    let mut out = self.output.lock();
                    execute(&mut **out, &event.kind)
                };
                if let Err(err) = result {
                    // One failed synthetic action must not invalidate the
                    // rest of a long recording.
                    log::warn!("event {i} failed: {err}; continuing");
                }

                if let Some(next) = events.get(i + 1) {
                    let gap = (next.timestamp - event.timestamp).max(0.0) / self.speed;
                    if self.shared.sleep_cancellable(Duration::from_secs_f64(gap)) {
                        break 'session;
                    }
                }
            }
            if !self.looping {
                completed = true;
                break;
            }
        }

        self.shared.active.store(false, Ordering::SeqCst);
        let ending = if completed {
            &self.on_complete
        } else {
            &self.on_stopped
        };
        if let Some(cb) = ending {
            if catch_unwind(AssertUnwindSafe(|| cb())).is_err() {
                log::warn!("session-end callback panicked");
            }
        }
        log::debug!(
            "playback {}",
            if completed { "completed" } else { "stopped" }
        );
    }
}

fn execute(out: &mut dyn PointerOutput, kind: &EventKind) -> Result<()> {
    match *kind {
        EventKind::Move { x, y } => out.set_position(x, y),
        EventKind::Click {
            button, pressed, ..
        } => {
            if pressed {
                out.press(button)
            } else {
                out.release(button)
            }
        }
        EventKind::Scroll { dx, dy, .. } => out.scroll(dx, dy),
    }
}
