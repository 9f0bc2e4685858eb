// src/model/task.rs

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::records::EpitopeRecord;
use crate::types::{ActionType, Status};

pub type TaskId = Uuid;

/// A proteome database that BLAST searches run against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Proteome {
    pub alias: String,
    pub path: PathBuf,
}

impl Proteome {
    pub fn new(alias: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            alias: alias.into(),
            path: path.into(),
        }
    }
}

/// Optional cross-database BLAST search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastParams {
    pub proteomes: Vec<Proteome>,
    /// Minimum query coverage, percent.
    pub cover: u32,
    /// Minimum identity, percent.
    pub identity: u32,
    pub word_size: u32,
}

/// Everything a submitter controls about a pipeline run.
///
/// `None` means "let the pipeline use its own default".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskParams {
    pub action: ActionType,
    pub threshold: Option<f64>,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    /// `None` disables the BLAST sub-search entirely.
    pub blast: Option<BlastParams>,
}

impl TaskParams {
    pub fn blast_enabled(&self) -> bool {
        self.blast.is_some()
    }
}

/// Process bookkeeping for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub status: Status,
    pub pid: Option<u32>,
}

/// One submitted pipeline run.
///
/// Created RUNNING at submission; afterwards only the monitor (through the
/// status reporter) mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user: String,
    pub run_name: String,
    pub work_dir: PathBuf,
    pub input_file: PathBuf,
    pub params: TaskParams,
    pub state: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Number of proteins in the analysed input, known after ingestion.
    pub proteome_size: Option<usize>,
    /// Why the task failed, for FAILED tasks.
    #[serde(default)]
    pub failure: Option<String>,
    #[serde(default)]
    pub epitopes: Vec<EpitopeRecord>,
}

impl Task {
    /// A freshly launched task, already RUNNING under `pid`.
    pub fn running(
        user: impl Into<String>,
        run_name: impl Into<String>,
        work_dir: PathBuf,
        input_file: PathBuf,
        params: TaskParams,
        pid: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: user.into(),
            run_name: run_name.into(),
            work_dir,
            input_file,
            params,
            state: TaskStatus {
                status: Status::Running,
                pid: Some(pid),
            },
            created_at: Utc::now(),
            finished_at: None,
            proteome_size: None,
            failure: None,
            epitopes: Vec::new(),
        }
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn pid(&self) -> Option<u32> {
        self.state.pid
    }
}
