// src/pipeline/mod.rs

//! Everything between a task's parameters and a running OS process.
//!
//! - [`layout`] owns the task directory's artifact paths.
//! - [`command`] builds the pipeline invocation (pure).
//! - [`launcher`] starts it and hands back the PID without waiting.

pub mod command;
pub mod launcher;
pub mod layout;

pub use command::{CommandBuilder, PipelineCommand, proteome_spec};
pub use launcher::{LaunchedProcess, ProcessLauncher, ShellLauncher};
pub use layout::WorkDirLayout;
