//! Error types for share session management.
//!
//! Only mounting can fail: unmount is a best-effort cleanup primitive and
//! downgrades every problem to a logged warning.

use thiserror::Error;

/// Errors that can occur while mounting a share.
#[derive(Debug, Error)]
pub enum Error {
    /// The mount command ran but the share did not come up
    #[error("failed to mount {unc}: {detail}")]
    MountFailed {
        /// The `\\host\share` UNC path that was being mounted
        unc: String,
        /// What `net use` reported (stderr, or stdout when stderr was empty)
        detail: String,
    },

    /// The executor could not complete the mount command at all
    #[error(transparent)]
    Exec(#[from] winexec::Error),
}

/// Result type for share operations.
pub type Result<T> = std::result::Result<T, Error>;
