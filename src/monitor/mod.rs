// src/monitor/mod.rs

//! Completion detection for submitted tasks.
//!
//! There is no push signal when a pipeline finishes. The monitor instead
//! polls every RUNNING task on a fixed interval:
//!
//! - [`probe`] asks the OS whether a PID is still alive.
//! - [`core`] decides, purely, what the observed facts mean.
//! - [`reporter`] persists the final COMPLETED/FAILED state.
//! - [`runtime`] is the async loop tying the above to the store.

pub mod core;
pub mod probe;
pub mod reporter;
pub mod runtime;

/// Events driving the monitor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    /// The poll interval elapsed.
    Tick,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub use self::core::{PollSummary, Verdict};
pub use probe::{ProcessProbe, SysinfoProbe};
pub use reporter::StatusReporter;
pub use runtime::Monitor;
