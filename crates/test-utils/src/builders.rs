#![allow(dead_code)]

use std::path::{Path, PathBuf};

use epitrack::config::{ConfigFile, RawConfigFile};
use epitrack::model::{BlastParams, Proteome, Task, TaskParams};
use epitrack::types::{ActionType, Status, StoreMode};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_poll_interval(mut self, interval: &str) -> Self {
        self.config.monitor.poll_interval = interval.to_string();
        self
    }

    pub fn with_workspace_root(mut self, root: impl AsRef<Path>) -> Self {
        self.config.workspace.root = root.as_ref().to_path_buf();
        self
    }

    pub fn with_program(mut self, program: &str, prefix_args: &[&str]) -> Self {
        self.config.pipeline.program = program.to_string();
        self.config.pipeline.prefix_args = prefix_args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_setup(mut self, setup: &str) -> Self {
        self.config.pipeline.setup = Some(setup.to_string());
        self
    }

    pub fn with_memory_store(mut self) -> Self {
        self.config.store.mode = StoreMode::Memory;
        self
    }

    pub fn with_file_store(mut self, path: impl AsRef<Path>) -> Self {
        self.config.store.mode = StoreMode::File;
        self.config.store.path = path.as_ref().to_path_buf();
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for RUNNING `Task`s as the submission path would record them.
pub struct TaskBuilder {
    user: String,
    run_name: String,
    work_dir: PathBuf,
    pid: u32,
    params: TaskParams,
    status: Status,
}

impl TaskBuilder {
    pub fn new(work_dir: impl AsRef<Path>) -> Self {
        Self {
            user: "alice".to_string(),
            run_name: "run".to_string(),
            work_dir: work_dir.as_ref().to_path_buf(),
            pid: 1000,
            params: TaskParams::default(),
            status: Status::Running,
        }
    }

    pub fn user(mut self, user: &str) -> Self {
        self.user = user.to_string();
        self
    }

    pub fn run_name(mut self, run_name: &str) -> Self {
        self.run_name = run_name.to_string();
        self
    }

    pub fn pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    pub fn customized(mut self, threshold: f64, min: u32, max: u32) -> Self {
        self.params.action = ActionType::Customized;
        self.params.threshold = Some(threshold);
        self.params.min_length = Some(min);
        self.params.max_length = Some(max);
        self
    }

    /// Enable BLAST against `(alias, path)` proteomes with default cut-offs.
    pub fn blast(mut self, proteomes: &[(&str, &str)]) -> Self {
        self.params.blast = Some(BlastParams {
            proteomes: proteomes
                .iter()
                .map(|(alias, path)| Proteome::new(*alias, *path))
                .collect(),
            cover: 90,
            identity: 90,
            word_size: 4,
        });
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn build(self) -> Task {
        let input = self.work_dir.join("input.fasta");
        let mut task = Task::running(
            self.user,
            self.run_name,
            self.work_dir,
            input,
            self.params,
            self.pid,
        );
        task.state.status = self.status;
        task
    }
}
