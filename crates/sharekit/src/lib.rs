//! # sharekit
//!
//! Mounting and unmounting a network file share on a remote Windows host,
//! driven through [`winexec`].
//!
//! Windows rejects a second credentialed session from one caller to the same
//! share ("Multiple connections to a server or shared resource by the same
//! user ... are not allowed"), and stale sessions from crashed runs are
//! common. [`MountManager::mount`] therefore always removes every existing
//! session to the share's UNC path before connecting - unconditionally, not
//! as an optimization.
//!
//! ## Example
//!
//! ```no_run
//! use sharekit::{MountManager, ShareCredentials};
//! use winexec::{Executor, Target};
//!
//! let executor = Executor::new(Target::new("10.0.0.7", "Administrator", "s3cret")).unwrap();
//! let share = ShareCredentials {
//!     host: "smb.example.com".to_string(),
//!     share: "payloads".to_string(),
//!     user: "svc_deploy".to_string(),
//!     password: "hunter2".to_string(),
//!     collection_dir: "collection".to_string(),
//! };
//!
//! let mounts = MountManager::new(&executor, share);
//! let handle = mounts.mount(None).expect("mount failed");
//! // ... copy payloads through handle.as_path() ...
//! mounts.unmount(&handle);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

pub use error::{Error, Result};

use serde::{Deserialize, Serialize};
use std::fmt;
use winexec::Executor;

/// Fixed phrase `net use` prints when a mount succeeds.
const MOUNT_SUCCESS_PHRASE: &str = "The command completed successfully";

/// Credentials and location of the share holding the deployment payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareCredentials {
    /// Host exposing the share
    pub host: String,
    /// Share name on that host
    pub share: String,
    /// Account used to authenticate against the share
    pub user: String,
    /// Password for that account
    pub password: String,
    /// Subdirectory on the share holding this release's payload
    pub collection_dir: String,
}

impl ShareCredentials {
    /// The `\\host\share` UNC path of this share.
    pub fn unc_path(&self) -> String {
        format!(r"\\{}\{}", self.host, self.share)
    }
}

/// An established share session on the target host.
///
/// At most one is active per deployment; it is produced by
/// [`MountManager::mount`] and released by [`MountManager::unmount`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountHandle {
    /// Mounted on a drive letter, e.g. `Z:`
    Drive(String),
    /// Mounted without a drive letter; reached through the UNC path
    Unc(String),
}

impl MountHandle {
    /// The path prefix remote commands use to reach the share.
    pub fn as_path(&self) -> &str {
        match self {
            MountHandle::Drive(drive) => drive,
            MountHandle::Unc(path) => path,
        }
    }
}

impl fmt::Display for MountHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

/// Manages the single share session of one deployment.
pub struct MountManager<'a> {
    executor: &'a Executor,
    credentials: ShareCredentials,
}

impl<'a> MountManager<'a> {
    /// Create a manager for one share on the executor's target host.
    pub fn new(executor: &'a Executor, credentials: ShareCredentials) -> Self {
        Self {
            executor,
            credentials,
        }
    }

    /// Mount the share on the target host.
    ///
    /// Every existing session to the share's UNC path is removed first.
    /// Pass a drive letter to mount as `X:`, or `None` for direct UNC access
    /// (the default usage; no free letter has to be divined).
    ///
    /// Success is judged by the fixed phrase `net use` prints; a run without
    /// it fails with [`Error::MountFailed`] carrying whatever the command
    /// reported.
    pub fn mount(&self, drive_letter: Option<char>) -> Result<MountHandle> {
        let unc = self.credentials.unc_path();
        log::debug!("removing all existing sessions to {}", unc);
        self.unmount_all();

        let drive = drive_letter.map(|letter| format!("{}:", letter));
        let command = match &drive {
            Some(drive) => format!(
                r"net use {} {} /user:{}\{} {} /persistent:no",
                drive, unc, self.credentials.host, self.credentials.user, self.credentials.password
            ),
            None => format!(
                r"net use {} /user:{}\{} {} /persistent:no",
                unc, self.credentials.host, self.credentials.user, self.credentials.password
            ),
        };

        log::debug!("mounting {}", unc);
        let result = self.executor.execute(&command)?;
        if result.stdout.contains(MOUNT_SUCCESS_PHRASE) {
            let handle = match drive {
                Some(drive) => MountHandle::Drive(drive),
                None => MountHandle::Unc(unc),
            };
            log::debug!("mounted share as {}", handle);
            return Ok(handle);
        }

        // A mount that produced neither the success phrase nor stderr is
        // still not a mount.
        let detail = if result.stderr.is_empty() {
            result.stdout
        } else {
            result.stderr
        };
        Err(Error::MountFailed { unc, detail })
    }

    /// Remove a share session.
    ///
    /// Always issues the remove command, and never fails: a session that is
    /// already gone is the desired state during cleanup, so problems are
    /// logged and swallowed.
    pub fn unmount(&self, handle: &MountHandle) {
        let command = match handle {
            MountHandle::Drive(drive) => format!("net use {} /DELETE", drive),
            MountHandle::Unc(path) => format!("net use {} /DELETE /YES", path),
        };

        log::debug!("unmounting {}", handle);
        match self.executor.execute(&command) {
            Ok(result) if !result.stderr.is_empty() => {
                log::warn!("unmounting {} reported: {}", handle, result.stderr.trim());
            }
            Ok(_) => log::debug!("{} unmounted", handle),
            Err(e) => log::warn!("unmounting {} failed: {}", handle, e),
        }
    }

    /// Remove every session to the share's UNC path.
    pub fn unmount_all(&self) {
        self.unmount(&MountHandle::Unc(self.credentials.unc_path()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use winexec::backend::{Backend, Invocation};
    use winexec::{RawOutput, RetryConfig, Target};

    struct ScriptedBackend {
        responses: Mutex<VecDeque<RawOutput>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<RawOutput>) -> (Self, Arc<Mutex<Vec<String>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            let backend = Self {
                responses: Mutex::new(responses.into()),
                calls: Arc::clone(&calls),
            };
            (backend, calls)
        }
    }

    impl Backend for ScriptedBackend {
        fn run(&self, invocation: &Invocation) -> winexec::Result<RawOutput> {
            self.calls.lock().unwrap().push(invocation.command.clone());
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| output("", "", 0)))
        }
    }

    fn output(stdout: &str, stderr: &str, code: i32) -> RawOutput {
        RawOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            code: Some(code),
            timed_out: false,
        }
    }

    fn mounted_output() -> RawOutput {
        output("The command completed successfully.\r\n", "", 0)
    }

    fn executor_with(
        responses: Vec<RawOutput>,
    ) -> (Executor, Arc<Mutex<Vec<String>>>) {
        let (backend, calls) = ScriptedBackend::new(responses);
        let executor = Executor::with_backend(
            Target::new("10.0.0.7", "Administrator", "s3cret"),
            Box::new(backend),
        )
        .with_retry_config(RetryConfig {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            backoff_factor: 1.0,
            max_delay: Duration::from_millis(10),
        });
        (executor, calls)
    }

    fn share() -> ShareCredentials {
        ShareCredentials {
            host: "smb.example.com".to_string(),
            share: "payloads".to_string(),
            user: "svc_deploy".to_string(),
            password: "hunter2".to_string(),
            collection_dir: "collection".to_string(),
        }
    }

    #[test]
    fn test_unc_path() {
        assert_eq!(share().unc_path(), r"\\smb.example.com\payloads");
    }

    #[test]
    fn test_mount_without_drive_returns_unc_handle() {
        let (executor, _calls) = executor_with(vec![output("", "", 0), mounted_output()]);
        let manager = MountManager::new(&executor, share());

        let handle = manager.mount(None).unwrap();
        assert_eq!(handle, MountHandle::Unc(r"\\smb.example.com\payloads".to_string()));
        assert_eq!(handle.as_path(), r"\\smb.example.com\payloads");
    }

    #[test]
    fn test_mount_with_drive_returns_drive_handle() {
        let (executor, calls) = executor_with(vec![output("", "", 0), mounted_output()]);
        let manager = MountManager::new(&executor, share());

        let handle = manager.mount(Some('Z')).unwrap();
        assert_eq!(handle, MountHandle::Drive("Z:".to_string()));

        let calls = calls.lock().unwrap();
        assert!(calls[1].starts_with(r"net use Z: \\smb.example.com\payloads"));
        assert!(calls[1].contains(r"/user:smb.example.com\svc_deploy"));
        assert!(calls[1].ends_with("/persistent:no"));
    }

    #[test]
    fn test_mount_always_unmounts_all_first() {
        let (executor, calls) = executor_with(vec![
            output("", "", 0),
            mounted_output(),
            output("", "", 0),
            mounted_output(),
        ]);
        let manager = MountManager::new(&executor, share());

        // Twice in a row, simulating a stale session from a prior run.
        manager.mount(None).unwrap();
        manager.mount(None).unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        for unmount in [&calls[0], &calls[2]] {
            assert!(unmount.starts_with(r"net use \\smb.example.com\payloads /DELETE /YES"));
        }
    }

    #[test]
    fn test_mount_failure_carries_stderr() {
        let (executor, _calls) = executor_with(vec![
            output("", "", 0),
            output("", "System error 85 has occurred.\r\n", 0),
        ]);
        let manager = MountManager::new(&executor, share());

        let err = manager.mount(None).unwrap_err();
        match err {
            Error::MountFailed { unc, detail } => {
                assert_eq!(unc, r"\\smb.example.com\payloads");
                assert!(detail.contains("System error 85"));
            }
            other => panic!("expected MountFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_mount_failure_without_stderr_still_fails() {
        let (executor, _calls) = executor_with(vec![
            output("", "", 0),
            output("Drive mapping pending...\r\n", "", 0),
        ]);
        let manager = MountManager::new(&executor, share());

        let err = manager.mount(None).unwrap_err();
        match err {
            Error::MountFailed { detail, .. } => assert!(detail.contains("pending")),
            other => panic!("expected MountFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_unmount_never_raises() {
        // First response: stderr from net use. Second: a permanent executor
        // failure. Neither may escape unmount.
        let (executor, calls) = executor_with(vec![
            output("", "The network connection could not be found.\r\n", 0),
            output("", "Access is denied.", 2),
        ]);
        let manager = MountManager::new(&executor, share());

        let handle = MountHandle::Drive("Z:".to_string());
        manager.unmount(&handle);
        manager.unmount(&handle);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], "net use Z: /DELETE");
    }

    #[test]
    fn test_unmount_command_shape_for_unc() {
        let (executor, calls) = executor_with(vec![output("", "", 0)]);
        let manager = MountManager::new(&executor, share());

        manager.unmount(&MountHandle::Unc(r"\\smb.example.com\payloads".to_string()));
        assert_eq!(
            calls.lock().unwrap()[0],
            r"net use \\smb.example.com\payloads /DELETE /YES"
        );
    }
}
