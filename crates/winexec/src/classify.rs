//! Text-based success/failure classification of winexe output.
//!
//! winexe signals remote-admin protocol failures as text on stdout, not
//! through its exit status, so the exit code alone cannot be trusted. The
//! predicate here is kept separate from the retry loop so it can be tested
//! with literal strings, without spawning any process.

/// Classification of one completed winexe run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The remote command completed; output can be used
    Success,
    /// The remote-admin protocol failed; the same invocation may succeed later
    Transient,
    /// The run failed for a reason retrying cannot fix
    Permanent,
}

/// Substrings in stdout that mark a remote-admin protocol failure.
///
/// Matched case-insensitively. `NT_STATUS` covers the SMB status codes
/// (`NT_STATUS_IO_TIMEOUT`, `NT_STATUS_SHARING_VIOLATION`, ...); `error:`
/// covers winexe's own prefixed diagnostics.
const TRANSIENT_MARKERS: &[&str] = &["nt_status", "error:"];

/// Prefix and suffix of the charset warning winexe sometimes prepends to the
/// real output, e.g. `dos charset 'CP850' unavailable - using ASCII`.
const CHARSET_WARNING_PREFIX: &str = "dos charset ";
const CHARSET_WARNING_SUFFIX: &str = "unavailable - using ascii";

/// Classify a completed run from its captured output and exit status.
///
/// A transient marker anywhere in stdout wins over the exit status: winexe
/// may exit zero while the remote service never ran the command.
pub fn classify(stdout: &str, _stderr: &str, exited_ok: bool) -> Outcome {
    if transient_marker(stdout).is_some() {
        return Outcome::Transient;
    }
    if exited_ok {
        Outcome::Success
    } else {
        Outcome::Permanent
    }
}

/// The first transient marker present in `stdout`, if any.
pub fn transient_marker(stdout: &str) -> Option<&'static str> {
    let lower = stdout.to_lowercase();
    TRANSIENT_MARKERS.iter().copied().find(|m| lower.contains(m))
}

/// Whether `line` is the charset warning that sometimes precedes real output.
///
/// The warning arrives on stdout, not stderr, and must not be mistaken for
/// the payload of single-line reads.
pub fn is_charset_warning(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    lower.starts_with(CHARSET_WARNING_PREFIX) && lower.ends_with(CHARSET_WARNING_SUFFIX)
}

/// Extract a single-line payload from stdout.
///
/// Skips charset warnings and blank lines, trims line endings (winexe mixes
/// `\r\n` and `\n`), and returns the first remaining line.
pub fn single_line(stdout: &str) -> Option<&str> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !is_charset_warning(line))
}
