//! Scripted executor backend shared by the crate's tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use winexec::backend::{Backend, Invocation};
use winexec::{Executor, RawOutput, RetryConfig, Target};

/// Backend that replays queued outputs and records every remote command.
///
/// Once the queue runs dry it answers with empty successes, so sequences
/// only script the outputs they care about.
pub(crate) struct ScriptedBackend {
    responses: Mutex<VecDeque<RawOutput>>,
    calls: Arc<Mutex<Vec<String>>>,
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

pub(crate) fn output(stdout: &str, stderr: &str, code: i32) -> RawOutput {
    RawOutput {
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        code: Some(code),
        timed_out: false,
    }
}

pub(crate) fn transient_output() -> RawOutput {
    output("ERROR: Failed to open connection - NT_STATUS_IO_TIMEOUT", "", 1)
}

pub(crate) fn timed_out_output() -> RawOutput {
    RawOutput {
        stdout: String::new(),
        stderr: String::new(),
        code: None,
        timed_out: true,
    }
}

pub(crate) fn mounted_output() -> RawOutput {
    output("The command completed successfully.\r\n", "", 0)
}

/// An executor over a scripted backend with millisecond retry waits.
pub(crate) fn executor_with(
    responses: Vec<RawOutput>,
) -> (Executor, Arc<Mutex<Vec<String>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let backend = ScriptedBackend {
        responses: Mutex::new(responses.into()),
        calls: Arc::clone(&calls),
    };
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
