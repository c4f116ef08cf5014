pub mod deploy;
pub mod probe;
pub mod teardown;

use crate::cli::TargetArgs;
use anyhow::{Context, Result};
use winexec::{Executor, Target};

/// Build an executor for the given target, with the real winexe backend.
pub fn executor_for(args: &TargetArgs) -> Result<Executor> {
    let target = Target::new(&args.host, &args.username, &args.password);
    Executor::new(target).context("winexe is required; install it and ensure it is on PATH")
}
