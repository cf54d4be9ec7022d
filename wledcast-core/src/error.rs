//! Domain-specific error types for the casting pipeline.
//!
//! All fallible operations return `Result<T, CastError>`.
//! Load-time variants abort startup; per-frame variants are isolated to
//! the frame or destination that raised them.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for wledcast.
#[derive(Debug, Error)]
pub enum CastError {
    // ── Load-time Errors ─────────────────────────────────────────
    /// The topology file is malformed or destinations are inconsistent.
    #[error("config error: {0}")]
    Config(String),

    /// A node carried no arguments at all (usually an indentation slip).
    #[error("parse error: {0}")]
    Parse(String),

    /// A node name does not match any registered shape or transform.
    #[error("unknown shape or transform: {0:?}")]
    UnknownShape(String),

    /// A shape or transform was given an argument it cannot use.
    #[error("invalid argument for {node}: {reason}")]
    InvalidArgument { node: String, reason: String },

    /// The YAML document could not be read at all.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ── Geometry Errors ──────────────────────────────────────────
    /// A geometry query was made on a mapping without coordinates.
    #[error("mapping has no coordinates")]
    EmptyMapping,

    // ── Per-frame Errors ─────────────────────────────────────────
    /// The frame source had nothing to hand out this cycle.
    #[error("frame unavailable: {0}")]
    FrameUnavailable(String),

    /// Sending to one destination failed.
    #[error("transmit to {destination} failed: {source}")]
    Transmit {
        destination: String,
        #[source]
        source: std::io::Error,
    },

    /// An operation exceeded its deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    // ── Runtime Errors ───────────────────────────────────────────
    /// The underlying socket or file layer reported an error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A stream phase transition was requested from the wrong phase.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

impl CastError {
    /// Shorthand for [`CastError::InvalidArgument`].
    pub fn invalid_argument(node: impl Into<String>, reason: impl ToString) -> Self {
        CastError::InvalidArgument {
            node: node.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the streaming loop may carry on after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CastError::FrameUnavailable(_)
                | CastError::Transmit { .. }
                | CastError::Timeout(_)
                | CastError::Io(_)
        )
    }
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for CastError {
    fn from(s: String) -> Self {
        CastError::Other(s)
    }
}

impl From<&str> for CastError {
    fn from(s: &str) -> Self {
        CastError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for CastError {
    fn from(e: serde_json::Error) -> Self {
        CastError::Other(format!("json: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = CastError::UnknownShape("hexagon".into());
        assert!(e.to_string().contains("hexagon"));

        let e = CastError::invalid_argument("matrix", "first corner \"middle\"");
        assert!(e.to_string().contains("matrix"));
        assert!(e.to_string().contains("middle"));
    }

    #[test]
    fn from_string() {
        let e: CastError = "something broke".into();
        assert!(matches!(e, CastError::Other(_)));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: CastError = io_err.into();
        assert!(matches!(e, CastError::Io(_)));
        assert!(e.is_recoverable());
    }

    #[test]
    fn load_errors_are_fatal() {
        assert!(!CastError::EmptyMapping.is_recoverable());
        assert!(!CastError::Config("dup".into()).is_recoverable());
        assert!(CastError::FrameUnavailable("capture".into()).is_recoverable());
    }
}
