// src/submit.rs

//! Submission path: validate → prepare task dir → build → launch → record.
//!
//! A task is written to the store only after its process has started, so a
//! launch failure never leaves a RUNNING record behind.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use crate::config::{ConfigFile, DefaultsSection};
use crate::errors::{EpitrackError, Result};
use crate::fs::FileSystem;
use crate::model::{Task, TaskId, TaskParams};
use crate::pipeline::layout::new_task_dir;
use crate::pipeline::{CommandBuilder, PipelineCommand, ProcessLauncher, WorkDirLayout};
use crate::store::TaskStore;
use crate::types::ActionType;

/// One run as requested by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitRequest {
    pub user: String,
    pub run_name: String,
    /// Input FASTA as uploaded; copied into the task directory.
    pub input_file: PathBuf,
    pub params: TaskParams,
}

pub struct Submitter {
    builder: CommandBuilder,
    defaults: DefaultsSection,
    launcher: Arc<dyn ProcessLauncher>,
    store: Arc<dyn TaskStore>,
    fs: Arc<dyn FileSystem>,
    workspace_root: PathBuf,
    log_file: String,
    exit_code_file: String,
}

impl Submitter {
    pub fn new(
        cfg: &ConfigFile,
        launcher: Arc<dyn ProcessLauncher>,
        store: Arc<dyn TaskStore>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            builder: CommandBuilder::from_config(cfg),
            defaults: cfg.defaults,
            launcher,
            store,
            fs,
            workspace_root: cfg.workspace.root.clone(),
            log_file: cfg.pipeline.log_file.clone(),
            exit_code_file: cfg.monitor.exit_code_file.clone(),
        }
    }

    /// Reject requests the pipeline could never run.
    pub fn validate(&self, req: &SubmitRequest) -> Result<()> {
        if req.user.trim().is_empty() {
            return Err(invalid("user must not be empty"));
        }
        if req.run_name.trim().is_empty() {
            return Err(invalid("run name must not be empty"));
        }
        if !self.fs.is_file(&req.input_file) {
            return Err(invalid(format!(
                "input file {} does not exist",
                req.input_file.display()
            )));
        }

        let params = &req.params;
        if params.action == ActionType::Customized {
            let min = params.min_length.unwrap_or(self.defaults.min_length);
            let max = params.max_length.unwrap_or(self.defaults.max_length);
            if min > max {
                return Err(invalid(format!(
                    "min length {min} is greater than max length {max}"
                )));
            }
            if let Some(threshold) = params.threshold {
                if !threshold.is_finite() || threshold < 0.0 {
                    return Err(invalid(format!("threshold {threshold} must be >= 0")));
                }
            }
        }

        if let Some(blast) = &params.blast {
            if blast.proteomes.is_empty() {
                return Err(invalid("BLAST search requires at least one proteome"));
            }
            if blast.cover > 100 || blast.identity > 100 {
                return Err(invalid("BLAST cover and identity are percentages (0-100)"));
            }
            if blast.word_size == 0 {
                return Err(invalid("BLAST word size must be at least 1"));
            }
        }
        Ok(())
    }

    /// The command a request would run, without creating or starting anything.
    pub fn preview(&self, req: &SubmitRequest) -> Result<PipelineCommand> {
        self.validate(req)?;
        let layout = self.layout(self.task_dir(req, TaskId::new_v4())?);
        let input = layout.input_file(&input_name(req)?);
        Ok(self.builder.build(&input, layout.dir(), &req.params))
    }

    /// Start the pipeline for `req` and record the task as RUNNING.
    pub async fn submit(&self, req: SubmitRequest) -> Result<Task> {
        self.validate(&req)?;

        let id = TaskId::new_v4();
        let layout = self.layout(self.task_dir(&req, id)?);
        let input = self.stage_input(&req, &layout)?;

        let params = CommandBuilder::effective_params(&req.params);
        let cmd = self.builder.build(&input, layout.dir(), &params);
        let launched = self.launcher.launch(&cmd, &layout)?;

        let task = Task {
            id,
            ..Task::running(
                req.user,
                req.run_name,
                layout.dir().to_path_buf(),
                input,
                params,
                launched.pid,
            )
        };
        match self.store.save(task).await {
            Ok(saved) => {
                info!(task_id = %saved.id, pid = launched.pid, dir = ?layout.dir(), "task submitted");
                Ok(saved)
            }
            Err(e) => {
                error!(pid = launched.pid, error = %e, "pipeline started but the task could not be recorded");
                Err(e)
            }
        }
    }

    /// Absolute directory for a new task. The pipeline runs inside this
    /// directory, so every path handed to it must not depend on the cwd.
    fn task_dir(&self, req: &SubmitRequest, id: TaskId) -> Result<PathBuf> {
        let root = std::path::absolute(&self.workspace_root)?;
        Ok(new_task_dir(&root, &req.user, &req.run_name, Utc::now(), id))
    }

    fn layout(&self, dir: PathBuf) -> WorkDirLayout {
        WorkDirLayout::with_file_names(dir, self.log_file.clone(), self.exit_code_file.clone())
    }

    /// Create the task directory and copy the input into it.
    fn stage_input(&self, req: &SubmitRequest, layout: &WorkDirLayout) -> Result<PathBuf> {
        self.fs.create_dir_all(layout.dir())?;
        let target = layout.input_file(&input_name(req)?);

        let mut contents = Vec::new();
        self.fs
            .open_read(&req.input_file)?
            .read_to_end(&mut contents)?;
        self.fs.write(&target, &contents)?;
        Ok(target)
    }
}

fn input_name(req: &SubmitRequest) -> Result<String> {
    req.input_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            invalid(format!(
                "input path {} has no file name",
                req.input_file.display()
            ))
        })
}

fn invalid(message: impl Into<String>) -> EpitrackError {
    EpitrackError::InvalidTask(message.into())
}
