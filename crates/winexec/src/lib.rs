//! # winexec
//!
//! Remote Windows command execution through the external `winexe` tool.
//!
//! This crate provides functionality for:
//! - Building winexe invocations (credential pair, system-account flag,
//!   OS-bitness hint) against one target host
//! - Text-based success/failure classification of captured output
//! - Bounded retry with a fixed wait for transient remote-admin failures
//! - A `systeminfo` diagnostic for host identification
//!
//! ## Example
//!
//! ```no_run
//! use winexec::{Executor, Target};
//!
//! let target = Target::new("10.0.0.7", "Administrator", "s3cret");
//! let executor = Executor::new(target).expect("winexe not available");
//!
//! let result = executor.execute("cmd /C echo %TEMP%").expect("remote call failed");
//! println!("{}", result.stdout);
//! ```
//!
//! ## Retry logic
//!
//! winexe reports remote-admin protocol failures (`NT_STATUS_*`, `Error:`)
//! as text on stdout rather than through its exit code. Those runs are
//! retried with a fixed wait; a failed run without such markers is permanent
//! and surfaces immediately. Configure retry behavior with [`RetryConfig`].
//!
//! ```no_run
//! use winexec::{Executor, RetryConfig, Target};
//! use std::time::Duration;
//!
//! let target = Target::new("10.0.0.7", "Administrator", "s3cret");
//! let executor = Executor::new(target)
//!     .unwrap()
//!     .with_retry_config(RetryConfig::new(3, Duration::from_secs(2), 1.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod classify;
pub mod error;
pub mod hostinfo;
pub mod retry;
pub mod types;

pub use classify::Outcome;
pub use error::{Error, ErrorCategory, Result};
pub use hostinfo::HostInfo;
pub use types::{ExecOptions, ExecutionResult, OsHint, RawOutput, RetryConfig, Target};

use backend::winexe::WinexeBackend;
use backend::{Backend, Invocation};
use retry::LogCallback;
use std::time::Duration;

/// High-level client for remote command execution against one target host.
///
/// The executor wraps a backend (the real winexe binary, or a scripted one
/// in tests) and owns the retry loop and output classification around it.
pub struct Executor {
    backend: Box<dyn Backend>,
    target: Target,
    retry: RetryConfig,
}

impl Executor {
    /// Create an executor with the real winexe backend.
    ///
    /// Returns an error if winexe is not installed.
    pub fn new(target: Target) -> Result<Self> {
        let backend = WinexeBackend::new()?;
        Ok(Self::with_backend(target, Box::new(backend)))
    }

    /// Create an executor with a custom backend (useful for testing).
    pub fn with_backend(target: Target, backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            target,
            retry: RetryConfig::default(),
        }
    }

    /// Replace the retry configuration.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The target host this executor drives.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Execute a remote command with default options (system account, auto
    /// bitness, no deadline).
    pub fn execute(&self, command: &str) -> Result<ExecutionResult> {
        self.execute_with(command, &ExecOptions::default())
    }

    /// Execute a remote command.
    ///
    /// Every attempt is logged with the exact command, try number, and the
    /// captured stdout/stderr; post-mortem diagnosis depends on it. Transient
    /// remote-admin failures are retried per the executor's [`RetryConfig`];
    /// exhausting the budget yields [`Error::RetriesExhausted`]. A failed run
    /// without transient markers fails immediately with
    /// [`Error::CommandFailed`], and a run killed at the per-attempt deadline
    /// yields [`Error::TimedOut`] without in-loop retry.
    pub fn execute_with(&self, command: &str, options: &ExecOptions) -> Result<ExecutionResult> {
        let invocation = self.build_invocation(command, options);
        let mut attempt = 0u32;

        let result = retry::with_retry(&self.retry, Some(&LogCallback), || {
            attempt += 1;
            log::debug!("[winexe try {}] {} on //{}", attempt, command, self.target.host);

            let raw = self.backend.run(&invocation)?;
            log::debug!("[stdout] {}", raw.stdout);
            log::debug!("[stderr] {}", raw.stderr);

            if raw.timed_out {
                let timeout = options.timeout.unwrap_or(Duration::ZERO);
                log::warn!("`{}` timed out after {:?}", command, timeout);
                return Err(Error::TimedOut {
                    command: command.to_string(),
                    timeout,
                });
            }

            match classify::classify(&raw.stdout, &raw.stderr, raw.exited_ok()) {
                Outcome::Success => Ok(ExecutionResult {
                    stdout: raw.stdout,
                    stderr: raw.stderr,
                }),
                Outcome::Transient => Err(Error::TransientStatus {
                    command: command.to_string(),
                    marker: classify::transient_marker(&raw.stdout)
                        .unwrap_or("nt_status")
                        .to_string(),
                    stdout: raw.stdout,
                    stderr: raw.stderr,
                }),
                Outcome::Permanent => {
                    log::error!(
                        "executing `{}` on //{} failed permanently (code {:?})",
                        command,
                        self.target.host,
                        raw.code
                    );
                    Err(Error::CommandFailed {
                        command: command.to_string(),
                        stdout: raw.stdout,
                        stderr: raw.stderr,
                        code: raw.code,
                    })
                }
            }
        });

        result.map_err(|e| match e {
            Error::TransientStatus { command, .. } => Error::RetriesExhausted {
                command,
                attempts: self.retry.max_attempts,
            },
            other => other,
        })
    }

    /// Build the winexe argument vector for one invocation.
    ///
    /// Arguments go straight to the process, never through a shell, so the
    /// remote command string needs no extra escaping here.
    fn build_invocation(&self, command: &str, options: &ExecOptions) -> Invocation {
        let mut args = Vec::new();
        if options.run_as_system {
            args.push("--system".to_string());
        }
        args.push("--ostype".to_string());
        args.push(options.os_hint.flag().to_string());
        args.push("-U".to_string());
        args.push(self.target.credential());
        args.push(format!("//{}", self.target.host));
        args.push(command.to_string());
        Invocation {
            args,
            command: command.to_string(),
            timeout: options.timeout,
        }
    }
}
