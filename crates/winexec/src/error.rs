//! Error types for remote execution.
//!
//! Errors are categorized to drive the retry loop: transient remote-admin
//! protocol failures are worth retrying, everything else is not. Each
//! variant carries the offending command and the captured output explicitly,
//! so callers never have to dig through a wrapped lower-level error.

use std::time::Duration;
use thiserror::Error;

/// Categories of execution errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Remote-admin protocol failure reported in stdout (retryable)
    Transient,
    /// The tool was killed at the per-attempt deadline
    Timeout,
    /// Failed termination with no transient marker present
    Permanent,
    /// Transient markers persisted through every allotted attempt
    Exhausted,
    /// The tool could not be launched at all
    Environment,
}

impl ErrorCategory {
    /// Whether the executor's own retry loop should try again.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Transient)
    }

    /// Get a short description of this error category.
    pub fn description(self) -> &'static str {
        match self {
            Self::Transient => "Transient remote-admin failure",
            Self::Timeout => "Execution deadline exceeded",
            Self::Permanent => "Permanent remote failure",
            Self::Exhausted => "Retry budget exhausted",
            Self::Environment => "winexe not usable",
        }
    }
}

/// Errors that can occur while executing a remote command.
#[derive(Debug, Error)]
pub enum Error {
    /// A transient remote-admin status marker was found in stdout.
    ///
    /// winexe reports protocol-level failures (`NT_STATUS_*`, `Error:`) as
    /// text on stdout rather than through its exit code.
    #[error("transient failure running `{command}`: {marker} in output")]
    TransientStatus {
        /// The remote command that was being executed
        command: String,
        /// The marker that was matched
        marker: String,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },

    /// The tool was killed at the per-attempt deadline.
    #[error("`{command}` timed out after {timeout:?}")]
    TimedOut {
        /// The remote command that was being executed
        command: String,
        /// The deadline that elapsed
        timeout: Duration,
    },

    /// Failed termination with no transient marker present.
    ///
    /// Retrying would not help (bad syntax, access denied, missing binary),
    /// so this surfaces immediately.
    #[error("command failed: `{command}`")]
    CommandFailed {
        /// The remote command that was being executed
        command: String,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
        /// Exit code of the tool, if it exited normally
        code: Option<i32>,
    },

    /// Only transient markers were seen, through every allotted attempt.
    #[error("`{command}` could not be completed after {attempts} attempts")]
    RetriesExhausted {
        /// The remote command that was being executed
        command: String,
        /// How many attempts were made
        attempts: u32,
    },

    /// The winexe process could not be spawned.
    #[error("failed to spawn winexe: {message}")]
    Spawn {
        /// Detail from the failed spawn
        message: String,
    },

    /// winexe is not installed or not found in PATH.
    #[error("winexe not found in PATH")]
    ToolNotFound,

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Get the error category for retry logic.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::TransientStatus { .. } => ErrorCategory::Transient,
            Error::TimedOut { .. } => ErrorCategory::Timeout,
            Error::CommandFailed { .. } | Error::Other(_) => ErrorCategory::Permanent,
            Error::RetriesExhausted { .. } => ErrorCategory::Exhausted,
            Error::Spawn { .. } | Error::ToolNotFound => ErrorCategory::Environment,
        }
    }

    /// Whether the executor's own retry loop should try again.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

/// Result type for remote execution operations.
pub type Result<T> = std::result::Result<T, Error>;
