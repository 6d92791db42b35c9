use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// The command line that produced a failure, kept for diagnostics.
///
/// Every call-level error carries the binary path and argument list of the
/// invocation that failed, so the failing command can be reproduced by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Path to the agent binary.
    pub binary: PathBuf,
    /// Arguments passed to the binary, in order.
    pub args: Vec<String>,
}

impl Invocation {
    /// Create a new invocation record.
    pub fn new(binary: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            args,
        }
    }

    /// Render the invocation as a single shell-like command line.
    pub fn command_line(&self) -> String {
        let mut line = self.binary.display().to_string();
        for arg in &self.args {
            line.push(' ');
            if arg.contains(char::is_whitespace) {
                line.push('"');
                line.push_str(arg);
                line.push('"');
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command_line())
    }
}

/// Errors that can occur when bridging to the agent process.
///
/// The taxonomy is deliberately closed: every supervisor, decoder, or
/// subprocess failure is classified into one of these variants. Only
/// [`Error::Timeout`] is retryable.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The agent binary could not be launched.
    #[error("failed to launch agent `{}`: {message}", .invocation.binary.display())]
    Spawn {
        /// The invocation that failed to start.
        invocation: Invocation,
        /// The underlying launch failure, rendered.
        message: String,
    },

    /// The call exceeded its wall-clock budget.
    #[error("agent call timed out after {timeout:?}")]
    Timeout {
        /// The invocation that was terminated.
        invocation: Invocation,
        /// The budget that was exceeded.
        timeout: Duration,
    },

    /// The caller cancelled the call.
    ///
    /// This is an expected outcome, not a bug: the subprocess (if any) has
    /// been terminated before this error is surfaced.
    #[error("agent call aborted by caller")]
    Aborted {
        /// The invocation that was cancelled.
        invocation: Invocation,
    },

    /// The agent process exited with a non-zero code.
    #[error("agent exited with code {exit_code}: {stderr_tail}")]
    Process {
        /// The invocation that failed.
        invocation: Invocation,
        /// The process exit code (`-1` if terminated by signal).
        exit_code: i32,
        /// The tail of the captured stderr output.
        stderr_tail: String,
    },

    /// The agent emitted an `error` event on its output stream.
    #[error("agent reported an error: {message}")]
    Upstream {
        /// The invocation that produced the event.
        invocation: Invocation,
        /// The error string embedded in the event.
        message: String,
    },
}

/// A specialized Result type for libgoose operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Discriminant-only view of the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Binary missing or unexecutable.
    Spawn,
    /// Wall-clock budget exceeded.
    Timeout,
    /// Caller cancellation.
    Aborted,
    /// Non-zero process exit.
    Process,
    /// Error event embedded in the agent stream.
    Upstream,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Spawn => "spawn",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Aborted => "aborted",
            ErrorKind::Process => "process",
            ErrorKind::Upstream => "upstream",
        };
        write!(f, "{}", name)
    }
}

impl Error {
    /// Classify a launch failure.
    pub(crate) fn spawn(invocation: Invocation, source: std::io::Error) -> Self {
        Error::Spawn {
            invocation,
            message: source.to_string(),
        }
    }

    /// Classify a wall-clock budget overrun.
    pub(crate) fn timeout(invocation: Invocation, timeout: Duration) -> Self {
        Error::Timeout {
            invocation,
            timeout,
        }
    }

    /// Classify a caller cancellation.
    pub(crate) fn aborted(invocation: Invocation) -> Self {
        Error::Aborted { invocation }
    }

    /// Classify a non-zero exit, attaching the stderr tail.
    pub(crate) fn process(invocation: Invocation, exit_code: i32, stderr_tail: String) -> Self {
        Error::Process {
            invocation,
            exit_code,
            stderr_tail,
        }
    }

    /// Classify an `error` event from the agent stream.
    pub(crate) fn upstream(invocation: Invocation, message: impl Into<String>) -> Self {
        Error::Upstream {
            invocation,
            message: message.into(),
        }
    }

    /// Get the taxonomy discriminant for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Spawn { .. } => ErrorKind::Spawn,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Aborted { .. } => ErrorKind::Aborted,
            Error::Process { .. } => ErrorKind::Process,
            Error::Upstream { .. } => ErrorKind::Upstream,
        }
    }

    /// Check if retrying the same call may succeed.
    ///
    /// Only timeouts are considered transient; everything else reflects a
    /// deterministic condition (missing binary, cancellation, upstream
    /// failure) that a retry would reproduce.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// The invocation that produced this error.
    pub fn invocation(&self) -> &Invocation {
        match self {
            Error::Spawn { invocation, .. }
            | Error::Timeout { invocation, .. }
            | Error::Aborted { invocation }
            | Error::Process { invocation, .. }
            | Error::Upstream { invocation, .. } => invocation,
        }
    }

    /// The process exit code, if this error captured one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::Process { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }

    /// The captured stderr tail, if this error captured one.
    pub fn stderr_tail(&self) -> Option<&str> {
        match self {
            Error::Process { stderr_tail, .. } => Some(stderr_tail),
            _ => None,
        }
    }
}
