//! Core types for remote command execution.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A remote Windows host and the privileged account used for every call.
///
/// Immutable for the lifetime of the executor that holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Hostname or IP address of the remote machine
    pub host: String,
    /// Account name used to authenticate
    pub username: String,
    /// Password for that account
    pub password: String,
}

impl Target {
    /// Create a new target.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// The `user%password` credential string winexe expects.
    pub(crate) fn credential(&self) -> String {
        format!("{}%{}", self.username, self.password)
    }
}

/// OS-bitness hint passed through winexe's `--ostype` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OsHint {
    /// Let winexe decide (`--ostype 2`)
    #[default]
    Auto,
    /// Force the 32-bit service binary (`--ostype 0`)
    Bits32,
    /// Force the 64-bit service binary (`--ostype 1`)
    Bits64,
}

impl OsHint {
    /// The numeric flag value winexe expects.
    pub fn flag(self) -> &'static str {
        match self {
            OsHint::Auto => "2",
            OsHint::Bits32 => "0",
            OsHint::Bits64 => "1",
        }
    }
}

/// Per-invocation execution options.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Run the remote command as the Windows system account
    pub run_as_system: bool,
    /// OS-bitness hint for the remote service
    pub os_hint: OsHint,
    /// Per-attempt deadline; the tool is killed when it elapses
    pub timeout: Option<Duration>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            run_as_system: true,
            os_hint: OsHint::Auto,
            timeout: None,
        }
    }
}

/// Captured output of a successfully completed remote command.
///
/// Never partially filled: a failed run surfaces as an error instead.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

/// Raw outcome of one winexe process run, before classification.
#[derive(Debug, Clone)]
pub struct RawOutput {
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Process exit code, if the process exited normally
    pub code: Option<i32>,
    /// Whether the process was killed at the per-attempt deadline
    pub timed_out: bool,
}

impl RawOutput {
    /// Whether the tool itself reported a clean exit.
    pub fn exited_ok(&self) -> bool {
        self.code == Some(0) && !self.timed_out
    }
}

/// Configuration for retry logic.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        // winexe's transient protocol failures clear quickly or not at all,
        // so the default wait is fixed rather than exponential.
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(5),
            backoff_factor: 1.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            max_delay: Duration::from_secs(60),
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_string() {
        let target = Target::new("10.0.0.7", "Administrator", "s3cret");
        assert_eq!(target.credential(), "Administrator%s3cret");
    }

    #[test]
    fn test_os_hint_flags() {
        assert_eq!(OsHint::Auto.flag(), "2");
        assert_eq!(OsHint::Bits32.flag(), "0");
        assert_eq!(OsHint::Bits64.flag(), "1");
    }

    #[test]
    fn test_default_options_run_as_system() {
        let options = ExecOptions::default();
        assert!(options.run_as_system);
        assert_eq!(options.os_hint, OsHint::Auto);
        assert!(options.timeout.is_none());
    }

    #[test]
    fn test_exited_ok() {
        let ok = RawOutput {
            stdout: String::new(),
            stderr: String::new(),
            code: Some(0),
            timed_out: false,
        };
        assert!(ok.exited_ok());

        let failed = RawOutput { code: Some(1), ..ok.clone() };
        assert!(!failed.exited_ok());

        let killed = RawOutput { timed_out: true, ..ok };
        assert!(!killed.exited_ok());
    }

    #[test]
    fn test_retry_config_fixed_wait_by_default() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(5));
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(5));
    }

    #[test]
    fn test_retry_config_delay_growth() {
        let config = RetryConfig::new(5, Duration::from_secs(10), 2.0);
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(10));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(20));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(40));
    }

    #[test]
    fn test_retry_config_max_delay() {
        let config = RetryConfig {
            max_delay: Duration::from_secs(30),
            ..RetryConfig::new(5, Duration::from_secs(10), 2.0)
        };
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(30));
        assert_eq!(config.delay_for_attempt(4), Duration::from_secs(30));
    }
}
