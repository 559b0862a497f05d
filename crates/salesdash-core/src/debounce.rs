//! Search input debouncer
//!
//! Two states:
//! - `Idle`: nothing pending
//! - `Pending { deadline, candidate }`: last edit waiting for quiet
//!
//! An edit always (re)starts the timer; firing commits the candidate and
//! returns to `Idle`. Time is passed in so the machine itself never sleeps.

use std::time::Duration;
use tokio::time::Instant;

/// Debouncer state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DebounceState {
    /// No edit pending
    #[default]
    Idle,
    /// Edit waiting for the quiet period to elapse
    Pending {
        /// When the candidate commits
        deadline: Instant,
        /// Latest raw value
        candidate: String,
    },
}

/// Timer-owning debounce state machine
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    state: DebounceState,
}

impl Debouncer {
    /// Create idle debouncer with quiet period `delay`
    #[inline]
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: DebounceState::Idle,
        }
    }

    /// Quiet period
    #[inline]
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &DebounceState {
        &self.state
    }

    /// Candidate waiting to commit
    #[must_use]
    pub fn pending(&self) -> Option<&str> {
        match &self.state {
            DebounceState::Pending { candidate, .. } => Some(candidate),
            DebounceState::Idle => None,
        }
    }

    /// Deadline of the pending candidate
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            DebounceState::Pending { deadline, .. } => Some(*deadline),
            DebounceState::Idle => None,
        }
    }

    /// Record an edit at `now`, cancelling any pending timer
    pub fn edit(&mut self, value: impl Into<String>, now: Instant) {
        self.state = DebounceState::Pending {
            deadline: now + self.delay,
            candidate: value.into(),
        };
    }

    /// Fire if the deadline has passed at `now`
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        if self.deadline().is_some_and(|deadline| deadline <= now) {
            self.cancel()
        } else {
            None
        }
    }

    /// Drop the pending candidate without committing
    pub fn cancel(&mut self) -> Option<String> {
        match std::mem::take(&mut self.state) {
            DebounceState::Pending { candidate, .. } => Some(candidate),
            DebounceState::Idle => None,
        }
    }

    /// Wait for the pending deadline and fire
    ///
    /// Returns `None` immediately when idle.
    pub async fn settle(&mut self) -> Option<String> {
        let deadline = self.deadline()?;
        tokio::time::sleep_until(deadline).await;
        self.poll(deadline)
    }
}
