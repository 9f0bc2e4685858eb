// src/pipeline/layout.rs

//! Single owner of every path inside a task's working directory.
//!
//! Nothing else in the crate joins artifact names onto a task directory, so
//! this is the one place to look when the pipeline's output naming changes.
//! Everything here is pure path arithmetic; no filesystem access.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use globset::{Glob, GlobMatcher};

use crate::model::TaskId;

pub const EPITOPE_TABLE: &str = "epitope-detail.tsv";
pub const TOPOLOGY_TABLE: &str = "topology.tsv";
pub const PROTEIN_SUMMARY: &str = "protein-summary.tsv";
pub const BLAST_FILE_PATTERN: &str = "blast-*.csv";

const DEFAULT_LOG_FILE: &str = "pipeline.log";
const DEFAULT_EXIT_CODE_FILE: &str = ".exit_code";

static BLAST_FILES: LazyLock<GlobMatcher> = LazyLock::new(|| {
    Glob::new(BLAST_FILE_PATTERN)
        .expect("static glob")
        .compile_matcher()
});

/// Paths of the artifacts in one task directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDirLayout {
    dir: PathBuf,
    log_file: String,
    exit_code_file: String,
}

impl WorkDirLayout {
    /// Layout with the default log and exit-code file names.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_file_names(dir, DEFAULT_LOG_FILE, DEFAULT_EXIT_CODE_FILE)
    }

    pub fn with_file_names(
        dir: impl Into<PathBuf>,
        log_file: impl Into<String>,
        exit_code_file: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            log_file: log_file.into(),
            exit_code_file: exit_code_file.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where an uploaded input with the given file name lives.
    pub fn input_file(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    pub fn log_file(&self) -> PathBuf {
        self.dir.join(&self.log_file)
    }

    pub fn exit_code_file(&self) -> PathBuf {
        self.dir.join(&self.exit_code_file)
    }

    pub fn epitope_table(&self) -> PathBuf {
        self.dir.join(EPITOPE_TABLE)
    }

    pub fn topology_table(&self) -> PathBuf {
        self.dir.join(TOPOLOGY_TABLE)
    }

    pub fn protein_summary(&self) -> PathBuf {
        self.dir.join(PROTEIN_SUMMARY)
    }

    /// Files that must exist after every run, BLAST or not.
    pub fn required_results(&self) -> [PathBuf; 3] {
        [
            self.epitope_table(),
            self.topology_table(),
            self.protein_summary(),
        ]
    }
}

/// Whether `path` names a per-database BLAST table (`blast-*.csv`).
pub fn is_blast_file(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| BLAST_FILES.is_match(Path::new(name)))
}

/// Database alias encoded in a BLAST table name: `blast-human.csv` → `human`.
pub fn blast_database_alias(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.strip_prefix("blast-")
        .and_then(|rest| rest.strip_suffix(".csv"))
        .map(str::to_string)
        .unwrap_or(name)
}

/// Directory for a new task:
/// `<root>/<user>/<run_name>_<yyyymmdd_HHMMSS>_<first 8 hex digits of id>`.
///
/// The id suffix keeps two submissions of the same run within one second
/// apart. User and run names are reduced to `[A-Za-z0-9._-]` so they cannot
/// climb out of `root`.
pub fn new_task_dir(
    root: &Path,
    user: &str,
    run_name: &str,
    now: DateTime<Utc>,
    id: TaskId,
) -> PathBuf {
    let mut suffix = id.simple().to_string();
    suffix.truncate(8);
    root.join(sanitize_component(user)).join(format!(
        "{}_{}_{}",
        sanitize_component(run_name),
        now.format("%Y%m%d_%H%M%S"),
        suffix
    ))
}

fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}
