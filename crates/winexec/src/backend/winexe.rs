//! Real backend spawning the external `winexe` tool.

use super::process::run_with_timeout;
use super::{Backend, Invocation};
use crate::error::{Error, Result};
use crate::types::RawOutput;
use std::process::Command;

/// Backend that executes the real `winexe` binary.
pub struct WinexeBackend {
    /// Path to the winexe executable
    tool_path: String,
}

impl WinexeBackend {
    /// Create a new WinexeBackend.
    ///
    /// Returns an error if winexe is not installed.
    pub fn new() -> Result<Self> {
        let tool_path = find_winexe()?;
        Ok(Self { tool_path })
    }

    /// Create a backend with an explicit tool path.
    pub fn with_tool_path(tool_path: impl Into<String>) -> Self {
        Self {
            tool_path: tool_path.into(),
        }
    }

    /// Check if winexe is available on this system.
    pub fn is_available() -> bool {
        find_winexe().is_ok()
    }
}

impl Backend for WinexeBackend {
    fn run(&self, invocation: &Invocation) -> Result<RawOutput> {
        let mut command = Command::new(&self.tool_path);
        command.args(&invocation.args);
        run_with_timeout(command, invocation.timeout).map_err(|e| Error::Spawn {
            message: format!("failed to execute winexe: {}", e),
        })
    }
}

/// Find the winexe executable path.
fn find_winexe() -> Result<String> {
    // Check common locations
    let paths = ["/usr/local/bin/winexe", "/usr/bin/winexe"];

    for path in &paths {
        if std::path::Path::new(path).exists() {
            return Ok((*path).to_string());
        }
    }

    // Try which
    let output = Command::new("which")
        .arg("winexe")
        .output()
        .map_err(|_| Error::ToolNotFound)?;

    if output.status.success() {
        let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !path.is_empty() {
            return Ok(path);
        }
    }

    Err(Error::ToolNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_with_tool_path_runs_arbitrary_binary() {
        // Any executable works as a stand-in for winexe here; the backend
        // only spawns and captures.
        let backend = WinexeBackend::with_tool_path("echo");
        let invocation = Invocation {
            args: vec!["hello".to_string()],
            command: "hello".to_string(),
            timeout: None,
        };
        let output = backend.run(&invocation).unwrap();
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.code, Some(0));
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let backend = WinexeBackend::with_tool_path("/nonexistent/winexe");
        let invocation = Invocation {
            args: Vec::new(),
            command: String::new(),
            timeout: Some(Duration::from_secs(1)),
        };
        let err = backend.run(&invocation).unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }
}
