use std::time::SystemTime;

use thiserror::Error;

/// Lifecycle phase of a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Session created, participants may join, no answers accepted yet.
    Waiting,
    /// Session is live: answers are accepted and the clock is running.
    Active {
        /// Instant the session went live; the time limit counts from here.
        started_at: SystemTime,
    },
    /// Terminal phase; only reads are allowed from now on.
    Completed {
        /// Why the session ended.
        reason: CompletionReason,
    },
}

/// Indicates why a session reached the completed phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// The trainer ended the session explicitly.
    ManualStop,
    /// The configured time limit elapsed.
    TimeExpired,
}

/// Events that can be applied to the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Trainer starts the session; carries the start timestamp.
    Start {
        /// Timestamp recorded as the session start.
        at: SystemTime,
    },
    /// The session ends, either explicitly or by expiry.
    End {
        /// Why the session is ending.
        reason: CompletionReason,
    },
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: SessionEvent,
}

/// State machine enforcing the waiting → active → completed session lifecycle.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    phase: SessionPhase,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Waiting,
        }
    }
}

impl SessionStateMachine {
    /// Create a new state machine initialised in the waiting phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether the session is currently accepting answers.
    pub fn is_active(&self) -> bool {
        matches!(self.phase, SessionPhase::Active { .. })
    }

    /// Whether the session has reached its terminal phase.
    pub fn is_completed(&self) -> bool {
        matches!(self.phase, SessionPhase::Completed { .. })
    }

    /// Start timestamp, once the session has gone live.
    pub fn started_at(&self) -> Option<SystemTime> {
        match self.phase {
            SessionPhase::Active { started_at } => Some(started_at),
            _ => None,
        }
    }

    /// Apply an event, moving the state machine to the next phase.
    pub fn apply(&mut self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        Ok(self.phase)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (SessionPhase::Waiting, SessionEvent::Start { at }) => {
                SessionPhase::Active { started_at: at }
            }
            (SessionPhase::Active { .. }, SessionEvent::End { reason }) => {
                SessionPhase::Completed { reason }
            }
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
