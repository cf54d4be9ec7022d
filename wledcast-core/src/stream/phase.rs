//! Lifecycle of a streaming session.
//!
//! Transitions are validated and return `Result` instead of panicking.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::CastError;

/// The current phase of a streaming session.
///
/// ```text
///  Idle ──► Running ──► Stopping ──► Stopped
///    │                                  ▲
///    └──────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamPhase {
    /// Built but not started.
    #[default]
    Idle,

    /// Pulling, sampling and transmitting frames.
    Running {
        /// When the loop entered `Running`.
        since: Instant,
    },

    /// Cancellation observed; finishing the current cycle.
    Stopping,

    /// Terminal. Sinks have been released.
    Stopped,
}

impl std::fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Running { .. } => write!(f, "Running"),
            Self::Stopping => write!(f, "Stopping"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

impl StreamPhase {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// How long the session has been running. `None` in any other phase.
    pub fn running_for(&self) -> Option<Duration> {
        match self {
            Self::Running { since } => Some(since.elapsed()),
            _ => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Valid from: `Idle`.
    pub fn start(&mut self) -> Result<(), CastError> {
        match self {
            Self::Idle => {
                *self = Self::Running {
                    since: Instant::now(),
                };
                Ok(())
            }
            _ => Err(CastError::InvalidState("cannot start: not Idle")),
        }
    }

    /// Valid from: `Running`.
    pub fn begin_stop(&mut self) -> Result<(), CastError> {
        match self {
            Self::Running { .. } => {
                *self = Self::Stopping;
                Ok(())
            }
            _ => Err(CastError::InvalidState("cannot stop: not Running")),
        }
    }

    /// Valid from: `Stopping`, and `Idle` for a session cancelled
    /// before it started.
    pub fn finish_stop(&mut self) -> Result<(), CastError> {
        match self {
            Self::Stopping | Self::Idle => {
                *self = Self::Stopped;
                Ok(())
            }
            _ => Err(CastError::InvalidState("cannot finish stop: not Stopping")),
        }
    }
}
