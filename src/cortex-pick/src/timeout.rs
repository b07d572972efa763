//! Timeout and cancellation handling for a session.
//!
//! A session blocks on "whatever happens next": the next input event, the
//! deadline, or the abort token. [`TimeoutController::wait`] races the three
//! and reports the winner. The deadline is a fixed instant taken when the
//! session starts, and the sleep future only lives for the duration of one
//! wait, so nothing can fire once the session has returned.

use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::event::{EventSource, PickEvent};

/// What an expired timer does to the in-flight state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnTimeout {
    /// Report whatever a confirm would have committed at that instant.
    #[default]
    CommitCurrent,
    /// Report the timeout with no result.
    Discard,
}

/// Timeout configuration for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeoutPolicy {
    duration: Duration,
    on_timeout: OnTimeout,
}

impl TimeoutPolicy {
    /// A policy that never fires.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Fires after `duration`; zero disables the timer.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            on_timeout: OnTimeout::CommitCurrent,
        }
    }

    pub fn with_on_timeout(mut self, on_timeout: OnTimeout) -> Self {
        self.on_timeout = on_timeout;
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn on_timeout(&self) -> OnTimeout {
        self.on_timeout
    }

    pub fn is_enabled(&self) -> bool {
        !self.duration.is_zero()
    }
}

/// Why a wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wake {
    Event(PickEvent),
    /// The event source is exhausted.
    Closed,
    Expired,
    Cancelled,
}

/// Races the session's next event against its deadline and abort token.
#[derive(Debug)]
pub struct TimeoutController {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl TimeoutController {
    /// Arms the deadline, if the policy has one, starting now.
    pub fn start(policy: &TimeoutPolicy, cancel: CancellationToken) -> Self {
        let deadline = policy
            .is_enabled()
            .then(|| Instant::now() + policy.duration());
        Self { deadline, cancel }
    }

    /// Time left before expiry, `None` when no deadline is armed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Drops the deadline; later waits only see events and aborts.
    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    /// Waits for the first of abort, expiry, or the next event.
    ///
    /// Abort is checked first and expiry second, so an abort or a deadline
    /// that is already due wins over a queued event.
    pub async fn wait<E>(&self, events: &mut E) -> Wake
    where
        E: EventSource + ?Sized,
    {
        let expiry = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Wake::Cancelled,
            _ = expiry => Wake::Expired,
            event = events.next_event() => match event {
                Some(event) => Wake::Event(event),
                None => Wake::Closed,
            },
        }
    }
}
