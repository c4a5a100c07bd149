use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval},
};

use crate::duration;

/// How often the display value is refreshed while the timer runs.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(10);

/// Phases of the plank timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// Nothing measured yet; elapsed time is zero.
    Idle,
    /// Time is being measured and the sampler refreshes the display.
    Running,
    /// Measurement finished; the value waits to be saved or discarded.
    Stopped,
}

/// Events that can be applied to the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Begin measuring.
    Start,
    /// Freeze the measured value.
    Stop,
    /// Discard the measured value and return to idle.
    Reset,
}

/// Error returned when an event cannot be applied from the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while {from:?}")]
pub struct InvalidTransition {
    /// The phase the timer was in when the event arrived.
    pub from: TimerPhase,
    /// The rejected event.
    pub event: TimerEvent,
}

/// Keys the timer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// The space bar toggles start/stop.
    Space,
    /// Any other key.
    Other,
}

/// A key-down notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    /// Which key went down.
    pub key: Key,
    /// True for auto-repeat events generated while the key is held.
    pub repeat: bool,
}

impl KeyPress {
    /// Initial press of `key`.
    pub fn press(key: Key) -> Self {
        Self { key, repeat: false }
    }

    /// Auto-repeat of a held `key`.
    pub fn repeat(key: Key) -> Self {
        Self { key, repeat: true }
    }
}

/// Stopwatch measuring a plank attempt from monotonic clock deltas.
///
/// Starting spawns a sampler on the current tokio runtime that publishes the
/// elapsed time every [`SAMPLE_INTERVAL`]. The published value is always
/// `now - start`, so a starved sampler only delays the display, never skews it.
#[derive(Debug)]
pub struct Timer {
    phase: TimerPhase,
    started_at: Option<Instant>,
    elapsed: Duration,
    sampler: Option<JoinHandle<()>>,
    display: Arc<watch::Sender<Duration>>,
    sample_every: Duration,
}

impl Default for Timer {
    fn default() -> Self {
        Self::with_sample_interval(SAMPLE_INTERVAL)
    }
}

impl Timer {
    /// Create an idle timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an idle timer with a custom display refresh period.
    pub fn with_sample_interval(sample_every: Duration) -> Self {
        let (display, _rx) = watch::channel(Duration::ZERO);
        Self {
            phase: TimerPhase::Idle,
            started_at: None,
            elapsed: Duration::ZERO,
            sampler: None,
            display: Arc::new(display),
            sample_every,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    /// Elapsed time: live while running, frozen once stopped, zero when idle.
    pub fn elapsed(&self) -> Duration {
        match (self.phase, self.started_at) {
            (TimerPhase::Running, Some(started_at)) => started_at.elapsed(),
            _ => self.elapsed,
        }
    }

    /// Elapsed time truncated to whole seconds, as submitted for an attempt.
    pub fn whole_seconds(&self) -> u64 {
        self.elapsed().as_secs()
    }

    /// `mm:ss.cc` rendering of the elapsed time.
    pub fn display(&self) -> String {
        duration::format_with_centiseconds(self.elapsed().as_millis() as u64)
    }

    /// Subscribe to the sampled elapsed time.
    pub fn subscribe(&self) -> watch::Receiver<Duration> {
        self.display.subscribe()
    }

    /// Whether a sampler task is currently scheduled.
    pub fn is_sampling(&self) -> bool {
        self.sampler.is_some()
    }

    /// Apply an event, returning the phase reached.
    pub fn apply(&mut self, event: TimerEvent) -> Result<TimerPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;

        match event {
            TimerEvent::Start => {
                let started_at = Instant::now() - self.elapsed;
                self.started_at = Some(started_at);
                self.spawn_sampler(started_at);
            }
            TimerEvent::Stop => {
                self.cancel_sampler();
                if let Some(started_at) = self.started_at.take() {
                    self.elapsed = started_at.elapsed();
                }
                self.display.send_replace(self.elapsed);
            }
            TimerEvent::Reset => {
                self.cancel_sampler();
                self.started_at = None;
                self.elapsed = Duration::ZERO;
                self.display.send_replace(Duration::ZERO);
            }
        }

        self.phase = next;
        Ok(next)
    }

    /// Start measuring. Only valid while idle.
    pub fn start(&mut self) -> Result<TimerPhase, InvalidTransition> {
        self.apply(TimerEvent::Start)
    }

    /// Stop measuring. Only valid while running.
    pub fn stop(&mut self) -> Result<TimerPhase, InvalidTransition> {
        self.apply(TimerEvent::Stop)
    }

    /// Return to idle from any phase, discarding the measured value.
    pub fn reset(&mut self) -> TimerPhase {
        // Reset is accepted from every phase.
        self.apply(TimerEvent::Reset).unwrap_or(TimerPhase::Idle)
    }

    /// Map a key press to start/stop. Returns the new phase when something happened.
    pub fn handle_key(&mut self, press: KeyPress) -> Option<TimerPhase> {
        let event = key_event(self.phase, press)?;
        self.apply(event).ok()
    }

    fn compute_transition(&self, event: TimerEvent) -> Result<TimerPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (TimerPhase::Idle, TimerEvent::Start) => TimerPhase::Running,
            (TimerPhase::Running, TimerEvent::Stop) => TimerPhase::Stopped,
            (_, TimerEvent::Reset) => TimerPhase::Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }

    fn spawn_sampler(&mut self, started_at: Instant) {
        self.cancel_sampler();

        let display = Arc::clone(&self.display);
        let period = self.sample_every;
        self.sampler = Some(tokio::spawn(async move {
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                display.send_replace(started_at.elapsed());
            }
        }));
    }

    fn cancel_sampler(&mut self) {
        if let Some(handle) = self.sampler.take() {
            handle.abort();
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel_sampler();
    }
}

/// Translate a key press into the event it triggers from `phase`, if any.
pub fn key_event(phase: TimerPhase, press: KeyPress) -> Option<TimerEvent> {
    if press.repeat || press.key != Key::Space {
        return None;
    }

    match phase {
        TimerPhase::Idle => Some(TimerEvent::Start),
        TimerPhase::Running => Some(TimerEvent::Stop),
        TimerPhase::Stopped => None,
    }
}
