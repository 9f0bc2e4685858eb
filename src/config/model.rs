// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::StoreMode;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [monitor]
/// poll_interval = "60s"
///
/// [pipeline]
/// program = "nextflow"
/// prefix_args = ["run", "/pipeline/main.nf"]
/// setup = ". /venv/bin/activate"
/// extra_path = ["/usr/local/bin"]
///
/// [defaults]
/// cover = 90
/// identity = 90
/// word_size = 4
///
/// [store]
/// mode = "file"
/// path = ".epitrack/tasks"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub monitor: MonitorSection,

    #[serde(default)]
    pub pipeline: PipelineSection,

    #[serde(default)]
    pub defaults: DefaultsSection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub workspace: WorkspaceSection,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub monitor: MonitorSection,
    pub pipeline: PipelineSection,
    pub defaults: DefaultsSection,
    pub store: StoreSection,
    pub workspace: WorkspaceSection,
    poll_interval: Duration,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile, poll_interval: Duration) -> Self {
        Self {
            monitor: raw.monitor,
            pipeline: raw.pipeline,
            defaults: raw.defaults,
            store: raw.store,
            workspace: raw.workspace,
            poll_interval,
        }
    }

    /// Parsed `[monitor].poll_interval`.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

/// `[monitor]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSection {
    /// Duration string with an `ms`, `s`, `m` or `h` suffix.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Name of the sentinel file the launched shell writes the pipeline's
    /// exit status into, relative to the task directory.
    #[serde(default = "default_exit_code_file")]
    pub exit_code_file: String,
}

fn default_poll_interval() -> String {
    "60s".to_string()
}

fn default_exit_code_file() -> String {
    ".exit_code".to_string()
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            exit_code_file: default_exit_code_file(),
        }
    }
}

/// `[pipeline]` section: how the external pipeline is invoked.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments placed between `program` and the task-specific flags.
    #[serde(default = "default_prefix_args")]
    pub prefix_args: Vec<String>,

    /// Optional shell snippet executed before the pipeline (e.g. activating
    /// a virtualenv). Ignored on platforms without `sh`.
    #[serde(default)]
    pub setup: Option<String>,

    /// Directories prepended to `PATH` when not already present.
    #[serde(default)]
    pub extra_path: Vec<String>,

    /// Name of the merged stdout/stderr log inside the task directory.
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

fn default_program() -> String {
    "nextflow".to_string()
}

fn default_prefix_args() -> Vec<String> {
    vec!["run".to_string(), "/pipeline/main.nf".to_string()]
}

fn default_log_file() -> String {
    "pipeline.log".to_string()
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            prefix_args: default_prefix_args(),
            setup: None,
            extra_path: Vec::new(),
            log_file: default_log_file(),
        }
    }
}

/// `[defaults]` section: the pipeline's implicit parameter values.
///
/// A task parameter equal to its default here is left off the command line.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DefaultsSection {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_min_length")]
    pub min_length: u32,
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    #[serde(default = "default_cutoff")]
    pub cover: u32,
    #[serde(default = "default_cutoff")]
    pub identity: u32,
    #[serde(default = "default_word_size")]
    pub word_size: u32,
}

fn default_threshold() -> f64 {
    0.1512
}

fn default_min_length() -> u32 {
    10
}

fn default_max_length() -> u32 {
    30
}

fn default_cutoff() -> u32 {
    90
}

fn default_word_size() -> u32 {
    4
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            min_length: default_min_length(),
            max_length: default_max_length(),
            cover: default_cutoff(),
            identity: default_cutoff(),
            word_size: default_word_size(),
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub mode: StoreMode,

    /// Directory holding one JSON document per task (file mode only).
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".epitrack/tasks")
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            mode: StoreMode::default(),
            path: default_store_path(),
        }
    }
}

/// `[workspace]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceSection {
    /// Parent of every per-user task directory.
    #[serde(default = "default_workspace_root")]
    pub root: PathBuf,
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from("/www")
}

impl Default for WorkspaceSection {
    fn default() -> Self {
        Self {
            root: default_workspace_root(),
        }
    }
}
