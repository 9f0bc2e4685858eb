// src/pipeline/launcher.rs

//! Starts pipeline processes without waiting for them.
//!
//! On Unix the pipeline runs under `sh -c` so that the shell itself records
//! the pipeline's exit status in the task's exit-code file once it finishes.
//! That file survives restarts of this service and lets the monitor tell
//! "exited" apart from "PID reused by something else".

use std::env;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::{EpitrackError, Result};
use crate::pipeline::command::{PipelineCommand, shell_quote};
use crate::pipeline::layout::WorkDirLayout;

/// Handle to a started pipeline process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchedProcess {
    pub pid: u32,
}

/// Trait abstracting how pipeline processes are started.
///
/// Production code uses [`ShellLauncher`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait ProcessLauncher: Send + Sync {
    /// Start `cmd` inside the layout's directory and return immediately.
    fn launch(&self, cmd: &PipelineCommand, layout: &WorkDirLayout) -> Result<LaunchedProcess>;
}

/// Real launcher: spawns via `tokio::process` with stdout and stderr
/// appended to the task log.
#[derive(Debug, Clone, Default)]
pub struct ShellLauncher {
    setup: Option<String>,
    extra_path: Vec<String>,
}

impl ShellLauncher {
    pub fn new(setup: Option<String>, extra_path: Vec<String>) -> Self {
        Self { setup, extra_path }
    }

    pub fn from_config(cfg: &crate::config::ConfigFile) -> Self {
        Self::new(cfg.pipeline.setup.clone(), cfg.pipeline.extra_path.clone())
    }
}

impl ProcessLauncher for ShellLauncher {
    fn launch(&self, cmd: &PipelineCommand, layout: &WorkDirLayout) -> Result<LaunchedProcess> {
        let launch_err = |source: io::Error| EpitrackError::LaunchFailure {
            program: cmd.program.clone(),
            source,
        };

        let current_path = env::var("PATH").unwrap_or_default();
        let path_var = augmented_path(&current_path, &self.extra_path);
        resolve_program(&cmd.program, path_var.as_deref().unwrap_or(&current_path))
            .map_err(launch_err)?;

        let exit_file = layout.exit_code_file();
        match fs::remove_file(&exit_file) {
            Ok(()) => debug!(path = ?exit_file, "removed stale exit-code file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(launch_err(e)),
        }

        let log = open_log(&layout.log_file()).map_err(launch_err)?;
        let log_err = log.try_clone().map_err(launch_err)?;

        let mut command = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&cmd.program).args(&cmd.args);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(shell_script(cmd, self.setup.as_deref(), &exit_file));
            c
        };

        command
            .current_dir(layout.dir())
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err));
        if let Some(path) = &path_var {
            command.env("PATH", path);
        }

        info!(command = %cmd, dir = ?layout.dir(), "starting pipeline process");
        let mut child = command.spawn().map_err(launch_err)?;
        let pid = child.id().ok_or_else(|| {
            launch_err(io::Error::other("process exited before its PID was read"))
        })?;
        info!(pid, "pipeline process started");

        // Reap the child in the background so it never lingers as a zombie
        // that would still look alive to the liveness probe.
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => info!(pid, exit_code = ?status.code(), "pipeline process exited"),
                Err(e) => warn!(pid, error = %e, "failed waiting on pipeline process"),
            }
        });

        Ok(LaunchedProcess { pid })
    }
}

fn open_log(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// `[setup &&] <pipeline>; echo $? > <exit file>`
fn shell_script(cmd: &PipelineCommand, setup: Option<&str>, exit_file: &Path) -> String {
    let pipeline = cmd.to_shell_string();
    let body = match setup {
        Some(setup) if !setup.trim().is_empty() => format!("{} && {}", setup.trim(), pipeline),
        _ => pipeline,
    };
    format!(
        "{}; echo $? > {}",
        body,
        shell_quote(&exit_file.display().to_string())
    )
}

/// `current` with each of `extra` prepended unless already present.
///
/// Returns `None` when nothing needs to change.
pub fn augmented_path(current: &str, extra: &[String]) -> Option<String> {
    let mut parts: Vec<String> = env::split_paths(current)
        .map(|p| p.display().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    let mut changed = false;

    for dir in extra.iter().rev() {
        if !parts.iter().any(|p| p == dir) {
            parts.insert(0, dir.clone());
            changed = true;
        }
    }

    if !changed {
        return None;
    }
    env::join_paths(parts)
        .ok()
        .map(|joined| joined.to_string_lossy().into_owned())
}

/// Locate `program` the way a shell would, so a missing or non-executable
/// binary is reported as a launch failure instead of a silent exit 127.
fn resolve_program(program: &str, path_var: &str) -> io::Result<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return check_executable(candidate);
    }

    env::split_paths(path_var)
        .map(|dir| dir.join(program))
        .find(|p| p.is_file())
        .map(|p| check_executable(&p))
        .unwrap_or_else(|| {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{program}' not found on PATH"),
            ))
        })
}

fn check_executable(path: &Path) -> io::Result<PathBuf> {
    let meta = fs::metadata(path)?;
    if !meta.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a file", path.display()),
        ));
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o111 == 0 {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is not executable", path.display()),
            ));
        }
    }
    Ok(path.to_path_buf())
}
