//! # deploykit
//!
//! Setup and teardown of a remote Windows host for a one-shot collection
//! job. The [`Deployer`] mounts the payload share, copies the extraction
//! toolchain into the target's temp directory, starts a bootstrap sshd, and
//! later tears everything down again - every step driven through
//! [`winexec`]'s retrying executor.
//!
//! ## Lifecycle
//!
//! `setup` runs `cleanup -> mount -> copy -> start sshd -> unmount` and
//! returns the collection directory on the target; `teardown` runs the
//! inverse `kill processes -> stop services -> remove directories`, each
//! phase best-effort so one failure never strands the rest.
//!
//! ## Example
//!
//! ```no_run
//! use deploykit::Deployer;
//! use sharekit::ShareCredentials;
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
//! let mut deployer = Deployer::new(executor, share);
//! let collection_dir = deployer.setup("sshd.exe", 12541, false).expect("setup failed");
//! println!("toolchain staged in {collection_dir}");
//! // ... collect ...
//! deployer.teardown();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cleanup;
pub mod error;
#[cfg(test)]
mod testutil;

pub use cleanup::{CleanupPhase, CleanupReport, PhaseOutcome, PhaseResult};
pub use error::{Error, Result};

use sharekit::{MountManager, ShareCredentials};
use std::thread;
use std::time::Duration;
use winexec::{ExecOptions, Executor};

/// Directory created under the target's `%TEMP%` to hold the toolchain.
pub const COLLECTION_DIR_NAME: &str = "collection";
/// Directory the toolchain archive extracts into, under the collection dir.
pub const CYGWIN_DIR_NAME: &str = "cygwin";
/// Self-extracting toolchain archive, as named on the share.
pub const CYGWIN_EXE_NAME: &str = "cygwin.exe";
/// Auxiliary diagnostic executable copied next to the toolchain.
pub const PYWMI_EXE_NAME: &str = "pywmi.exe";
/// Launch script inside the extracted toolchain that starts sshd.
pub const START_SSH_SCRIPT: &str = "start_sshd.bat";
/// Fallback when the target's `%TEMP%` cannot be read.
pub const DEFAULT_TEMP_DIR: &str = r"C:\WINDOWS\TEMP";

/// Processes killed during cleanup unless the caller supplies a list.
pub const DEFAULT_PROCESSES_TO_KILL: &[&str] =
    &["bash.exe", "sshd.exe", "sh.exe", "cygpath.exe", "mkpasswd.exe"];
/// Services stopped and deleted during cleanup unless the caller supplies a list.
pub const DEFAULT_SERVICES: &[&str] = &["winexesvc"];
/// Service never stopped via `sc stop`: it carries these very commands.
pub(crate) const SKIP_STOP_SERVICE: &str = "winexesvc";

/// Retry/backoff policy for starting the bootstrap daemon.
///
/// The backoff is multiplied by `backoff_factor` before every attempt, so
/// attempt `n` (1-indexed) sleeps `initial_backoff * factor^n` after a
/// successful launch, and its execution deadline grows with it:
/// `initial_timeout * backoff-in-seconds`. With the defaults that is a 4s/8s/
/// 16s backoff and a 40s/80s/160s deadline across the three attempts.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Maximum daemon-start attempts
    pub max_attempts: u32,
    /// Backoff seed
    pub initial_backoff: Duration,
    /// Multiplier applied before every attempt
    pub backoff_factor: f64,
    /// Execution-deadline seed
    pub initial_timeout: Duration,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
            backoff_factor: 2.0,
            initial_timeout: Duration::from_secs(10),
        }
    }
}

impl DaemonConfig {
    /// Backoff used by a given attempt (1-indexed).
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .mul_f64(self.backoff_factor.powi(attempt as i32))
    }

    /// Execution deadline for a given attempt (1-indexed).
    pub fn timeout_for_attempt(&self, attempt: u32) -> Duration {
        self.initial_timeout
            .mul_f64(self.backoff_for_attempt(attempt).as_secs_f64())
    }
}

/// The target's `%TEMP%` directory.
///
/// winexe sometimes prepends a charset warning to the real output - on
/// stdout, not stderr - which [`winexec::classify::single_line`] skips.
/// Falls back to [`DEFAULT_TEMP_DIR`] when the value cannot be read:
/// cleanup must be able to proceed on a target whose state is unknown.
pub fn win_temp_dir(executor: &Executor) -> String {
    match executor.execute("cmd /C echo %TEMP%") {
        Ok(result) => match winexec::classify::single_line(&result.stdout) {
            Some(line) => line.to_string(),
            None => {
                log::warn!(
                    "`echo %TEMP%` returned nothing usable ({:?}), using {}",
                    result.stdout,
                    DEFAULT_TEMP_DIR
                );
                DEFAULT_TEMP_DIR.to_string()
            }
        },
        Err(e) => {
            log::error!("error retrieving Windows TEMP dir: {}", e);
            DEFAULT_TEMP_DIR.to_string()
        }
    }
}

/// Orchestrates the setup/teardown lifecycle for one target host.
///
/// One instance drives one host, sequentially; concurrent targets take one
/// `Deployer` each. The target and share credentials are fixed at
/// construction and live for the instance's whole lifetime.
pub struct Deployer {
    executor: Executor,
    share: ShareCredentials,
    daemon: DaemonConfig,
    collection_dir: Option<String>,
}

impl Deployer {
    /// Create a deployer for the executor's target host.
    pub fn new(executor: Executor, share: ShareCredentials) -> Self {
        Self {
            executor,
            share,
            daemon: DaemonConfig::default(),
            collection_dir: None,
        }
    }

    /// Replace the daemon-start retry policy.
    pub fn with_daemon_config(mut self, daemon: DaemonConfig) -> Self {
        self.daemon = daemon;
        self
    }

    /// The collection directory created by the last successful `setup`.
    pub fn collection_dir(&self) -> Option<&str> {
        self.collection_dir.as_deref()
    }

    /// Borrow the underlying executor, e.g. for diagnostics.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Prepare the target for collection.
    ///
    /// Runs a full cleanup first (safe on a pristine target), mounts the
    /// payload share, copies the toolchain and the diagnostic executable
    /// unless `skip_copy`, starts the bootstrap daemon on `ssh_port`,
    /// unmounts, and returns the collection directory on the target.
    ///
    /// A failing step aborts the whole setup; the caller owns calling
    /// [`Deployer::teardown`] to clean up partial state.
    pub fn setup(&mut self, daemon_exe: &str, ssh_port: u16, skip_copy: bool) -> Result<String> {
        log::info!("setting up {} for collection", self.host());
        let report = self.cleanup_all();
        if !report.is_clean() {
            log::warn!("initial cleanup was partial: {}", report);
        }

        log::debug!("mounting payload share...");
        let mounts = MountManager::new(&self.executor, self.share.clone());
        let handle = mounts.mount(None)?;
        log::debug!("mounted on {}: {}", self.host(), handle);

        let share_payload_path = format!(r"{}\{}", handle.as_path(), self.share.collection_dir);
        let win_temp_dir = win_temp_dir(&self.executor);
        let collection_dir = format!(r"{}\{}", win_temp_dir, COLLECTION_DIR_NAME);

        if !skip_copy {
            self.copy_toolchain(&win_temp_dir, &share_payload_path)?;
            self.copy_diagnostic(&win_temp_dir, &share_payload_path)?;
        }

        log::info!("starting sshd on port {}", ssh_port);
        self.start_sshd(daemon_exe, &collection_dir, ssh_port)?;
        log::info!("sshd started");

        mounts.unmount(&handle);
        self.collection_dir = Some(collection_dir.clone());
        log::info!("setup done; collection dir is {}", collection_dir);
        Ok(collection_dir)
    }

    /// Tear down everything `setup` created.
    ///
    /// Never fails; the report records what each phase managed.
    pub fn teardown(&mut self) -> CleanupReport {
        log::info!("teardown sequence started on {}", self.host());
        let report = self.cleanup_all();
        log::info!("teardown sequence ended: {}", report);
        report
    }

    /// Run the three best-effort cleanup phases.
    pub fn cleanup_all(&mut self) -> CleanupReport {
        let report = cleanup::cleanup_all(&self.executor);
        self.collection_dir = None;
        report
    }

    /// The target's `%TEMP%` directory (with fallback).
    pub fn get_win_temp_dir(&self) -> String {
        win_temp_dir(&self.executor)
    }

    /// Start the bootstrap sshd through the toolchain's launch script.
    ///
    /// Deadline kills are retried with a growing backoff and deadline; any
    /// other failure is fatal immediately. After a successful invocation the
    /// current backoff is slept once so the daemon can bind its port before
    /// callers proceed.
    pub fn start_sshd(
        &self,
        daemon_exe: &str,
        collection_dir: &str,
        ssh_port: u16,
    ) -> Result<()> {
        log::debug!("starting {} via {}", daemon_exe, START_SSH_SCRIPT);

        // The launch script takes the toolchain dir and the port.
        let cygwin_path = format!(r"{}\{}", collection_dir, CYGWIN_DIR_NAME);
        let command = format!(
            r#"cmd /c "{0}\{1} {0} {2}""#,
            cygwin_path, START_SSH_SCRIPT, ssh_port
        );

        for attempt in 1..=self.daemon.max_attempts {
            let backoff = self.daemon.backoff_for_attempt(attempt);
            let timeout = self.daemon.timeout_for_attempt(attempt);
            // sshd must run as the connecting account, not SYSTEM.
            let options = ExecOptions {
                run_as_system: false,
                timeout: Some(timeout),
                ..ExecOptions::default()
            };

            match self.executor.execute_with(&command, &options) {
                Ok(_) => {
                    // Give sshd time to bind its port.
                    thread::sleep(backoff);
                    log::debug!("{} executed", START_SSH_SCRIPT);
                    return Ok(());
                }
                Err(e @ winexec::Error::TimedOut { .. }) => {
                    log::warn!("{}", e);
                    log::warn!("retry #{}: {}", attempt, command);
                }
                Err(e) => {
                    return Err(Error::DaemonStart {
                        command,
                        host: self.host().to_string(),
                        source: e,
                    });
                }
            }
        }

        Err(Error::DaemonStartExhausted {
            command,
            host: self.host().to_string(),
            attempts: self.daemon.max_attempts,
        })
    }

    /// Copy the self-extracting toolchain archive from the share and unpack
    /// it into the collection directory.
    fn copy_toolchain(&self, win_temp_dir: &str, share_payload_path: &str) -> Result<()> {
        let dest_dir = format!(r"{}\{}", win_temp_dir, COLLECTION_DIR_NAME);

        // xcopy will not create the directory chain itself.
        self.executor.execute(&format!(
            r##"cmd /C "IF NOT EXIST "{0}\" mkdir "{0}\"""##,
            dest_dir
        ))?;

        // `echo F` answers xcopy's "File or Directory?" prompt; /C continues
        // past per-file errors, /Y suppresses overwrite prompting, /F prints
        // full paths for the logs.
        self.executor.execute(&format!(
            r#"cmd /C "echo F | xcopy /C /Y /F "{1}\{2}" "{0}\{2}"""#,
            dest_dir, share_payload_path, CYGWIN_EXE_NAME
        ))?;

        // Self-extract in place. The trailing `\ ` keeps the extraction dir's
        // final backslash from escaping the closing quote.
        self.executor.execute(&format!(
            r#"cmd /C "{0}\{1} -y -o {0}\{2}\ ""#,
            dest_dir, CYGWIN_EXE_NAME, CYGWIN_DIR_NAME
        ))?;

        Ok(())
    }

    /// Copy the auxiliary diagnostic executable next to the toolchain.
    fn copy_diagnostic(&self, win_temp_dir: &str, share_payload_path: &str) -> Result<()> {
        let dest_dir = format!(r"{}\{}", win_temp_dir, COLLECTION_DIR_NAME);
        self.executor.execute(&format!(
            r#"cmd /C copy "{1}\{2}" "{0}\{2}""#,
            dest_dir, share_payload_path, PYWMI_EXE_NAME
        ))?;
        Ok(())
    }

    fn host(&self) -> &str {
        &self.executor.target().host
    }
}
