//! Error types for deployment orchestration.

use thiserror::Error;

/// Errors that abort a deployment.
///
/// Cleanup never produces one of these: its phases record their outcomes in
/// a [`crate::CleanupReport`] instead of raising.
#[derive(Debug, Error)]
pub enum Error {
    /// Mounting the payload share failed
    #[error(transparent)]
    Mount(#[from] sharekit::Error),

    /// A remote invocation failed beyond its local retry policy
    #[error(transparent)]
    Exec(#[from] winexec::Error),

    /// Starting the bootstrap daemon failed for a reason retrying cannot fix
    #[error("unable to run `{command}` on {host}")]
    DaemonStart {
        /// The launch command that failed
        command: String,
        /// The target host
        host: String,
        /// The underlying executor failure
        #[source]
        source: winexec::Error,
    },

    /// Every daemon-start attempt timed out
    #[error("unable to run `{command}` on {host} after {attempts} attempts")]
    DaemonStartExhausted {
        /// The launch command that kept timing out
        command: String,
        /// The target host
        host: String,
        /// How many attempts were made
        attempts: u32,
    },
}

/// Result type for deployment operations.
pub type Result<T> = std::result::Result<T, Error>;
