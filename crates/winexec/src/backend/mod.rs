//! Backend implementations for running the winexe tool.

pub mod process;
pub mod winexe;

use crate::error::Result;
use crate::types::RawOutput;
use std::time::Duration;

/// One fully-built winexe invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Arguments passed to the winexe executable, in order
    pub args: Vec<String>,
    /// The remote command (the last argument), kept for logs and errors
    pub command: String,
    /// Per-attempt deadline, if any
    pub timeout: Option<Duration>,
}

/// Abstraction over the external winexe process.
///
/// The real backend spawns the tool; tests substitute scripted outputs so
/// retry and classification behavior can be exercised with literal strings
/// and without a network.
pub trait Backend {
    /// Run one invocation to completion and capture its raw output.
    fn run(&self, invocation: &Invocation) -> Result<RawOutput>;
}
