// src/monitor/core.rs

//! Pure decision logic for one monitored task.
//!
//! No store, no filesystem, no processes: the runtime gathers the facts
//! (PID liveness, exit-code file contents) and this module turns them into
//! what should happen next.

use crate::types::Status;

/// What one poll observed about a RUNNING task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    StillRunning,
    /// The process is gone. `exit_code` is the recorded status, when the
    /// exit-code file was written.
    Terminated { exit_code: Option<i32> },
}

/// What to do with a terminated task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Ingest,
    Fail { exit_code: i32 },
}

/// Decide whether a task's process has ended.
///
/// A recorded exit code wins over liveness: a live PID next to an exit-code
/// file belongs to some unrelated process that reused it.
pub fn assess(alive: bool, exit_code: Option<i32>) -> Verdict {
    match (exit_code, alive) {
        (Some(code), _) => Verdict::Terminated {
            exit_code: Some(code),
        },
        (None, true) => Verdict::StillRunning,
        (None, false) => Verdict::Terminated { exit_code: None },
    }
}

/// A zero or unknown exit status proceeds to ingestion; the result files
/// decide the outcome. Any other status fails the task outright.
pub fn next_step(exit_code: Option<i32>) -> NextStep {
    match exit_code {
        Some(code) if code != 0 => NextStep::Fail { exit_code: code },
        _ => NextStep::Ingest,
    }
}

/// Exit-code file contents, if they hold an integer.
pub fn parse_exit_code(raw: &str) -> Option<i32> {
    raw.trim().parse().ok()
}

/// Counters for one monitor cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub examined: usize,
    pub still_running: usize,
    pub completed: usize,
    pub failed: usize,
    /// Tasks whose final state could not be persisted; they stay RUNNING.
    pub errors: usize,
}

impl PollSummary {
    /// Count one examined task by the status it was left in.
    pub fn record(&mut self, status: Status) {
        self.examined += 1;
        match status {
            Status::Running => self.still_running += 1,
            Status::Completed => self.completed += 1,
            Status::Failed => self.failed += 1,
        }
    }

    pub fn record_error(&mut self) {
        self.examined += 1;
        self.errors += 1;
    }

    pub fn is_idle(&self) -> bool {
        self.examined == 0
    }
}
