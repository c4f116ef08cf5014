//! Child-process capture with an optional hard deadline.
//!
//! `std::process` has no deadline support, so the deadlined path spawns the
//! child with piped output, drains both pipes on helper threads (a full pipe
//! would otherwise block the child and the deadline alike), and polls
//! `try_wait` until the child exits or the deadline passes.

use crate::types::RawOutput;
use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Poll interval while waiting on a deadlined child.
const WAIT_POLL: Duration = Duration::from_millis(50);

/// Run `command` to completion, killing it if `timeout` elapses first.
///
/// A kill at the deadline is reported through `RawOutput::timed_out`, with
/// whatever output was captured up to that point.
pub fn run_with_timeout(mut command: Command, timeout: Option<Duration>) -> io::Result<RawOutput> {
    let Some(timeout) = timeout else {
        let output = command.output()?;
        return Ok(RawOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            code: output.status.code(),
            timed_out: false,
        });
    };

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let (code, timed_out) = loop {
        match child.try_wait()? {
            Some(status) => break (status.code(), false),
            None if Instant::now() >= deadline => {
                let _ = child.kill();
                let status = child.wait()?;
                break (status.code(), true);
            }
            None => thread::sleep(WAIT_POLL),
        }
    };

    Ok(RawOutput {
        stdout: join(stdout),
        stderr: join(stderr),
        code,
        timed_out,
    })
}

/// Read a child pipe to the end on a helper thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        buffer
    })
}

fn join(handle: thread::JoinHandle<Vec<u8>>) -> String {
    String::from_utf8_lossy(&handle.join().unwrap_or_default()).to_string()
}
