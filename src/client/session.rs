//! Save flow wrapped around the [`Timer`].
//!
//! A [`TimerSession`] owns the stopwatch, the save status and the feedback
//! message. A successful save schedules a delayed reset that is skipped when
//! the user resets first; either way the refresh counter is bumped so views
//! showing attempt lists can reload.

use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

use super::{
    AttemptApi, StatusMessage,
    timer::{InvalidTransition, KeyPress, Timer, TimerEvent, TimerPhase, key_event},
};
use crate::{
    dto::attempt::{CreateAttemptRequest, CreateAttemptResponse},
    duration::MIN_DURATION_SECS,
};

/// Delay between a successful save and the automatic reset.
pub const RESET_DELAY: Duration = Duration::from_secs(2);
/// Shown when saving less than one whole second.
pub const TOO_SHORT_MESSAGE: &str = "Hold the plank for at least 1 second";

/// Where the session stands with respect to saving the measured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// No save in progress.
    Ready,
    /// A create-attempt call is in flight.
    Saving,
    /// The attempt was stored; the delayed reset is pending.
    Saved,
}

/// Result of [`TimerSession::save`].
#[derive(Debug, Clone)]
pub enum SaveOutcome {
    /// Less than one whole second was measured; nothing was sent.
    TooShort,
    /// The service stored the attempt.
    Saved {
        /// Whether it is the new personal best.
        personal_best: bool,
        /// Service response.
        response: CreateAttemptResponse,
    },
    /// The service refused the attempt or could not be reached.
    Failed {
        /// Text shown to the user.
        message: String,
    },
}

/// Operations refused by a [`TimerSession`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Saving needs a stopped timer.
    #[error("nothing to save while {0:?}")]
    NotStopped(TimerPhase),
    /// A save is in flight or a reset is pending.
    #[error("session is busy ({0:?})")]
    Busy(SaveStatus),
    /// The timer refused the transition.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

/// Cloneable handle on one timer and its save flow.
#[derive(Clone)]
pub struct TimerSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: Arc<dyn AttemptApi>,
    state: Mutex<SessionState>,
    refresh: watch::Sender<u64>,
    reset_delay: Duration,
}

struct SessionState {
    timer: Timer,
    status: SaveStatus,
    message: Option<StatusMessage>,
    /// Bumped by every manual reset; a delayed reset only fires if it is unchanged.
    generation: u64,
}

impl TimerSession {
    /// Session that resets [`RESET_DELAY`] after a successful save.
    pub fn new(api: Arc<dyn AttemptApi>) -> Self {
        Self::with_reset_delay(api, RESET_DELAY)
    }

    /// Session with a custom delay before the post-save reset.
    pub fn with_reset_delay(api: Arc<dyn AttemptApi>, reset_delay: Duration) -> Self {
        let (refresh, _rx) = watch::channel(0);
        Self {
            inner: Arc::new(SessionInner {
                api,
                state: Mutex::new(SessionState {
                    timer: Timer::new(),
                    status: SaveStatus::Ready,
                    message: None,
                    generation: 0,
                }),
                refresh,
                reset_delay,
            }),
        }
    }

    /// Start measuring and clear any message left from a previous run.
    pub async fn start(&self) -> Result<TimerPhase, SessionError> {
        let mut state = self.inner.state.lock().await;
        let phase = state.timer.start()?;
        state.message = None;
        Ok(phase)
    }

    /// Freeze the elapsed time.
    pub async fn stop(&self) -> Result<TimerPhase, SessionError> {
        let mut state = self.inner.state.lock().await;
        Ok(state.timer.stop()?)
    }

    /// Discard the measured value. Refused while a save is in flight.
    pub async fn reset(&self) -> Result<TimerPhase, SessionError> {
        let mut state = self.inner.state.lock().await;
        if state.status == SaveStatus::Saving {
            return Err(SessionError::Busy(SaveStatus::Saving));
        }
        state.generation += 1;
        state.status = SaveStatus::Ready;
        state.message = None;
        Ok(state.timer.reset())
    }

    /// Space bar handling: start when idle, stop when running.
    pub async fn handle_key(&self, press: KeyPress) -> Option<TimerPhase> {
        let phase = self.phase().await;
        match key_event(phase, press)? {
            TimerEvent::Start => self.start().await.ok(),
            TimerEvent::Stop => self.stop().await.ok(),
            TimerEvent::Reset => self.reset().await.ok(),
        }
    }

    /// Submit the stopped duration, truncated to whole seconds.
    pub async fn save(&self) -> Result<SaveOutcome, SessionError> {
        let seconds = {
            let mut state = self.inner.state.lock().await;
            let phase = state.timer.phase();
            if phase != TimerPhase::Stopped {
                return Err(SessionError::NotStopped(phase));
            }
            if state.status != SaveStatus::Ready {
                return Err(SessionError::Busy(state.status));
            }

            let seconds = u32::try_from(state.timer.whole_seconds()).unwrap_or(u32::MAX);
            if seconds < MIN_DURATION_SECS {
                state.message = Some(StatusMessage::Error(TOO_SHORT_MESSAGE.to_owned()));
                return Ok(SaveOutcome::TooShort);
            }

            state.status = SaveStatus::Saving;
            state.message = None;
            seconds
        };

        debug!(seconds, "submitting attempt");
        let result = self
            .inner
            .api
            .create_attempt(CreateAttemptRequest::seconds(seconds))
            .await;

        let mut state = self.inner.state.lock().await;
        match result {
            Ok(response) => {
                state.status = SaveStatus::Saved;
                state.message = Some(StatusMessage::saved(&response));
                self.schedule_reset(state.generation);
                Ok(SaveOutcome::Saved {
                    personal_best: response.is_personal_best,
                    response,
                })
            }
            Err(err) => {
                warn!(error = %err, seconds, "failed to save attempt");
                let message = StatusMessage::failed(&err);
                let text = message.text().to_owned();
                state.status = SaveStatus::Ready;
                state.message = Some(message);
                Ok(SaveOutcome::Failed { message: text })
            }
        }
    }

    fn schedule_reset(&self, generation: u64) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.reset_delay).await;
            {
                let mut state = inner.state.lock().await;
                if state.generation == generation {
                    state.timer.reset();
                    state.status = SaveStatus::Ready;
                    state.message = None;
                }
            }
            inner.refresh.send_modify(|count| *count += 1);
        });
    }

    /// Current timer phase.
    pub async fn phase(&self) -> TimerPhase {
        self.inner.state.lock().await.timer.phase()
    }

    /// Time measured so far.
    pub async fn elapsed(&self) -> Duration {
        self.inner.state.lock().await.timer.elapsed()
    }

    /// `mm:ss.cc` rendering of the elapsed time.
    pub async fn display(&self) -> String {
        self.inner.state.lock().await.timer.display()
    }

    /// Current save status.
    pub async fn status(&self) -> SaveStatus {
        self.inner.state.lock().await.status
    }

    /// Feedback line for the last action, if any.
    pub async fn message(&self) -> Option<StatusMessage> {
        self.inner.state.lock().await.message.clone()
    }

    /// Sampled elapsed time while the timer runs.
    pub async fn subscribe_display(&self) -> watch::Receiver<Duration> {
        self.inner.state.lock().await.timer.subscribe()
    }

    /// Counter bumped after every successful save.
    pub fn subscribe_refresh(&self) -> watch::Receiver<u64> {
        self.inner.refresh.subscribe()
    }
}
