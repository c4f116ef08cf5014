//! Best-effort cleanup of a target host.
//!
//! Three phases, always run in order, none of which may block the next:
//! kill the toolchain processes, stop and delete the remote-admin service,
//! remove the collection directory. A half-provisioned target is the normal
//! case here - setup calls this before doing anything, and teardown calls it
//! on whatever state a failed run left behind - so every phase records its
//! outcome instead of raising.

use crate::{COLLECTION_DIR_NAME, DEFAULT_PROCESSES_TO_KILL, DEFAULT_SERVICES, SKIP_STOP_SERVICE};
use serde::Serialize;
use std::fmt;
use winexec::Executor;

/// One of the three cleanup phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPhase {
    /// Force-kill the toolchain processes
    KillProcesses,
    /// Stop and delete the remote-admin service
    StopServices,
    /// Remove the collection directory
    RemoveDirectories,
}

impl fmt::Display for CleanupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CleanupPhase::KillProcesses => "kill processes",
            CleanupPhase::StopServices => "stop services",
            CleanupPhase::RemoveDirectories => "remove directories",
        };
        f.write_str(name)
    }
}

/// Recorded result of one cleanup phase.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseOutcome {
    /// The phase's remote invocation completed
    Completed,
    /// The phase failed; later phases still ran
    Failed {
        /// Why the phase failed
        error: String,
    },
}

impl PhaseOutcome {
    /// Whether this phase failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, PhaseOutcome::Failed { .. })
    }
}

/// Outcome of one phase within a cleanup run.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseResult {
    /// Which phase ran
    pub phase: CleanupPhase,
    /// How it went
    pub outcome: PhaseOutcome,
}

/// Aggregated outcome of a full cleanup run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    /// Per-phase outcomes, in execution order
    pub phases: Vec<PhaseResult>,
}

impl CleanupReport {
    /// Whether every phase completed.
    pub fn is_clean(&self) -> bool {
        self.phases.iter().all(|p| !p.outcome.is_failure())
    }

    /// The phases that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = &PhaseResult> {
        self.phases.iter().filter(|p| p.outcome.is_failure())
    }

    fn record(&mut self, phase: CleanupPhase, result: winexec::Result<()>) {
        let outcome = match result {
            Ok(()) => PhaseOutcome::Completed,
            Err(e) => {
                log::warn!("cleanup phase '{}' failed: {}", phase, e);
                PhaseOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        self.phases.push(PhaseResult { phase, outcome });
    }
}

impl fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, result) in self.phases.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match &result.outcome {
                PhaseOutcome::Completed => write!(f, "{}: ok", result.phase)?,
                PhaseOutcome::Failed { error } => {
                    write!(f, "{}: failed ({})", result.phase, error)?;
                }
            }
        }
        Ok(())
    }
}

/// Run all three cleanup phases against the executor's target.
///
/// Safe to call on a pristine target: killing processes that do not exist
/// and deleting directories that were never created are ordinary outcomes.
pub fn cleanup_all(executor: &Executor) -> CleanupReport {
    let mut report = CleanupReport::default();
    report.record(
        CleanupPhase::KillProcesses,
        kill_processes(executor, None, false),
    );
    report.record(CleanupPhase::StopServices, stop_services(executor, None));

    let temp_dir = crate::win_temp_dir(executor);
    let collection_dir = format!(r"{}\{}", temp_dir, COLLECTION_DIR_NAME);
    report.record(
        CleanupPhase::RemoveDirectories,
        remove_directories(executor, &[collection_dir]),
    );
    report
}

/// Force-kill processes on the target in one combined invocation.
///
/// `by_pid` switches the list from image names (`/IM`) to process ids
/// (`/PID`). Defaults to [`DEFAULT_PROCESSES_TO_KILL`].
pub fn kill_processes(
    executor: &Executor,
    processes: Option<&[&str]>,
    by_pid: bool,
) -> winexec::Result<()> {
    let list = processes.unwrap_or(DEFAULT_PROCESSES_TO_KILL);
    if list.is_empty() {
        return Ok(());
    }

    log::info!("killing tasks: {:?}", list);
    // One invocation for the whole list; `&` chains the kills so a process
    // that is already gone does not abort the rest.
    let flag = if by_pid { "/PID" } else { "/IM" };
    let mut command = String::from("cmd /C");
    for process in list {
        command.push_str(&format!(" taskkill /F /T {} {} &", flag, process));
    }
    executor.execute(&command)?;
    Ok(())
}

/// Stop and delete services on the target.
///
/// The remote-admin service itself is skipped in the stop pass - it is the
/// transport these very commands arrive over, and is expected to be stopped
/// through the daemon once that is healthy. Deletion still covers every
/// service in the list. Defaults to [`DEFAULT_SERVICES`].
pub fn stop_services(executor: &Executor, services: Option<&[&str]>) -> winexec::Result<()> {
    let list = services.unwrap_or(DEFAULT_SERVICES);
    if list.is_empty() {
        return Ok(());
    }

    let stoppable: Vec<&str> = list
        .iter()
        .copied()
        .filter(|s| !s.contains(SKIP_STOP_SERVICE))
        .collect();
    if !stoppable.is_empty() {
        let mut command = String::from("cmd /C");
        for service in &stoppable {
            command.push_str(&format!(" sc stop {} &", service));
        }
        executor.execute(&command)?;
    }

    let mut command = String::from("cmd /C");
    for service in list {
        command.push_str(&format!(" sc delete {} &", service));
    }
    executor.execute(&command)?;
    Ok(())
}

/// Recursively remove directories on the target in one combined invocation.
pub fn remove_directories(executor: &Executor, directories: &[String]) -> winexec::Result<()> {
    if directories.is_empty() {
        return Ok(());
    }

    let mut command = String::from("cmd /C");
    for directory in directories {
        command.push_str(&format!(r#" rmdir /S /Q "{}" &"#, directory));
    }
    executor.execute(&command)?;
    Ok(())
}
