//! Cancellable single-shot step timer
//!
//! At most one step is pending at a time. Every schedule or cancel starts a
//! new generation, and a token is only honoured while its generation is
//! current, so a step scheduled by a scene that has since been torn down can
//! never run.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy)]
struct Pending {
    token: TimerToken,
    due: Instant,
}

#[derive(Debug, Default)]
pub struct StepTimer {
    generation: u64,
    pending: Option<Pending>,
}

impl StepTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule the next step `delay` after `now`, replacing any pending one.
    pub fn schedule(&mut self, now: Instant, delay: Duration) -> TimerToken {
        self.generation += 1;
        let token = TimerToken(self.generation);
        self.pending = Some(Pending { token, due: now + delay });
        token
    }

    /// Drop the pending step and invalidate every outstanding token.
    pub fn cancel(&mut self) -> bool {
        self.generation += 1;
        self.pending.take().is_some()
    }

    /// Token of the pending step if it is due at `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<TimerToken> {
        match self.pending {
            Some(p) if p.due <= now => {
                self.pending = None;
                Some(p.token)
            }
            _ => None,
        }
    }

    /// Accept `token` if it is current. A token is accepted at most once.
    pub fn consume(&mut self, token: TimerToken) -> bool {
        if token.0 != self.generation {
            return false;
        }
        self.generation += 1;
        if self.pending.is_some_and(|p| p.token == token) {
            self.pending = None;
        }
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.map(|p| p.due)
    }
}
