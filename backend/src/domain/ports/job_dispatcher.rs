//! Port for handing detached work to a background runner.

use std::fmt;

use thiserror::Error;

use crate::domain::EventId;

/// Work that runs independently of the request that scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackgroundJob {
    /// Try to fill a freed slot from the event's waitlist.
    PromoteWaitlist {
        /// Event whose waitlist is consulted.
        event_id: EventId,
    },
    /// Recompute the event's mean review rating.
    RecomputeRating {
        /// Event whose reviews are averaged.
        event_id: EventId,
    },
}

impl BackgroundJob {
    /// Event the job operates on.
    #[must_use]
    pub const fn event_id(&self) -> EventId {
        match self {
            Self::PromoteWaitlist { event_id } | Self::RecomputeRating { event_id } => *event_id,
        }
    }

    /// Short label used in logs and span names.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PromoteWaitlist { .. } => "promote_waitlist",
            Self::RecomputeRating { .. } => "recompute_rating",
        }
    }
}

impl fmt::Display for BackgroundJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.event_id())
    }
}

/// Errors raised when a job cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobDispatchError {
    /// The runner has shut down.
    #[error("job dispatcher unavailable: {message}")]
    Unavailable {
        /// Why the runner cannot take jobs.
        message: String,
    },
    /// The runner is alive but refused the job, typically because its queue
    /// is full.
    #[error("job dispatcher rejected job: {message}")]
    Rejected {
        /// Why the job was refused.
        message: String,
    },
}

impl JobDispatchError {
    /// Build a [`JobDispatchError::Unavailable`] from any message.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Build a [`JobDispatchError::Rejected`] from any message.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

/// Port for submitting background jobs.
///
/// Dispatch is synchronous so that a caller can schedule follow-up work in
/// the same poll that completed the triggering mutation.
#[cfg_attr(test, mockall::automock)]
pub trait JobDispatcher: Send + Sync {
    /// Queue the job without waiting for it to run.
    ///
    /// # Errors
    ///
    /// [`JobDispatchError::Rejected`] when the queue is full and
    /// [`JobDispatchError::Unavailable`] once the runner has stopped.
    fn dispatch(&self, job: BackgroundJob) -> Result<(), JobDispatchError>;
}
