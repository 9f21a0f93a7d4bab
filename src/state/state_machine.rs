use thiserror::Error;

/// Lifecycle status of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// The session accepts next-song and submit calls.
    Active,
    /// Every round was played or the playlist ran out of songs.
    Completed,
    /// The session was superseded by a newer one or idled past the timeout.
    Abandoned,
}

/// Why a session was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbandonReason {
    /// The owner started another session.
    Superseded,
    /// No action was received within the idle window.
    IdleTimeout,
}

/// Events that can be applied to a session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Close the session as played to the end.
    Complete,
    /// Close the session without finishing it.
    Abandon(AbandonReason),
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while {from:?}")]
pub struct InvalidTransition {
    /// The status the session was in when the event was received.
    pub from: SessionStatus,
    /// The event that cannot be applied from this status.
    pub event: SessionEvent,
}

impl SessionStatus {
    /// Whether no further transition can leave this status.
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Active)
    }

    /// Compute the status reached by applying `event`, if the transition is valid.
    ///
    /// Transitions are monotonic: only an active session can be closed, and a
    /// closed session never reopens.
    pub fn transition(self, event: SessionEvent) -> Result<SessionStatus, InvalidTransition> {
        let next = match (self, event) {
            (SessionStatus::Active, SessionEvent::Complete) => SessionStatus::Completed,
            (SessionStatus::Active, SessionEvent::Abandon(_)) => SessionStatus::Abandoned,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
