//! Subprocess supervision for the agent CLI.
//!
//! Each generation call spawns one agent process and owns it for the
//! duration of the call:
//!
//! ```text
//! libgoose                            goose CLI
//! ┌──────────────┐                   ┌─────────────┐
//! │ AgentProcess │────args/env──────▶│             │
//! │              │◀──stdout (NDJSON)─│             │
//! │              │◀──stderr (logs)───│             │
//! └──────────────┘                   └─────────────┘
//! ```
//!
//! The supervisor enforces the timeout and cancellation contracts and
//! guarantees the process is reaped exactly once on every exit path.

pub(crate) mod args;
mod io;
mod spawn;

pub use io::{LineSource, ProcessLineReader, StderrTail};
pub use spawn::AgentProcess;

use std::time::Duration;

/// How much captured stderr is kept for error reports.
pub const STDERR_TAIL_BYTES: usize = 8 * 1024;

/// How long a process gets between SIGTERM and SIGKILL.
pub(crate) const TERMINATE_GRACE: Duration = Duration::from_secs(2);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_reasonable() {
        assert!(STDERR_TAIL_BYTES >= 1024, "tail should hold at least 1KB");
        assert!(!TERMINATE_GRACE.is_zero());
    }
}
