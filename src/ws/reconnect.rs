//! Backoff bookkeeping and the deferred reconnect timer.

use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff as _;
use tokio::time::{Instant, sleep_until};

use super::dispatcher::EventDispatcher;

/// A reconnect waiting for its deadline.
#[derive(Debug)]
pub(crate) struct PendingReconnect {
    pub(crate) delay: Duration,
    pub(crate) deadline: Instant,
    /// Session captured when the reconnect was scheduled
    pub(crate) session: EventDispatcher,
}

/// Outcome of [`ReconnectPolicy::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Schedule {
    Scheduled { attempt: u32, delay: Duration },
    Exhausted { attempts: u32 },
}

/// Counts reconnect attempts and owns the single pending reconnect timer.
#[derive(Debug, Default)]
pub(crate) struct ReconnectPolicy {
    attempts: u32,
    /// Delay sequence of the current run of attempts, built on the first schedule after a reset
    backoff: Option<ExponentialBackoff>,
    pending: Option<PendingReconnect>,
}

impl ReconnectPolicy {
    /// Arm the timer for the next attempt of `session`, unless its attempt cap is reached.
    pub(crate) fn schedule(&mut self, session: &EventDispatcher) -> Schedule {
        self.cancel();

        let reconnect = &session.config().reconnect;
        if self.attempts >= reconnect.max_attempts {
            return Schedule::Exhausted {
                attempts: self.attempts,
            };
        }

        let delay = self
            .backoff
            .get_or_insert_with(|| reconnect.clone().into())
            .next_backoff()
            .unwrap_or(reconnect.max_delay);
        self.attempts = self.attempts.saturating_add(1);
        self.pending = Some(PendingReconnect {
            delay,
            deadline: deadline_after(delay),
            session: session.clone(),
        });

        Schedule::Scheduled {
            attempt: self.attempts,
            delay,
        }
    }

    /// Drop the pending timer, if any. Returns whether one was pending.
    pub(crate) fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub(crate) fn reset(&mut self) {
        self.attempts = 0;
        self.backoff = None;
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }

    pub(crate) fn pending(&self) -> Option<&PendingReconnect> {
        self.pending.as_ref()
    }

    /// Take the pending reconnect if its deadline has passed.
    pub(crate) fn take_due(&mut self) -> Option<PendingReconnect> {
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.deadline <= Instant::now())
        {
            self.pending.take()
        } else {
            None
        }
    }

    /// Resolves once the pending reconnect is due. Never resolves when nothing is pending.
    pub(crate) async fn due(&self) {
        match &self.pending {
            Some(pending) => sleep_until(pending.deadline).await,
            None => std::future::pending().await,
        }
    }
}

fn deadline_after(delay: Duration) -> Instant {
    // Roughly 30 years.
    const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

    let now = Instant::now();
    now.checked_add(delay).unwrap_or_else(|| now + FAR_FUTURE)
}
