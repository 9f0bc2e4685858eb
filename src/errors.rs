// src/errors.rs

//! Crate-wide error type and `Result` alias.
//!
//! Only structural failures live here. Per-row recoveries during result
//! parsing (bad numeric cells, unknown method labels) are logged and
//! defaulted in place and never surface as an `EpitrackError`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EpitrackError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid task: {0}")]
    InvalidTask(String),

    /// The pipeline process could not be started at all.
    #[error("failed to launch '{program}': {source}")]
    LaunchFailure {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Required output files were absent after the process terminated.
    #[error("missing result files in {dir:?}: {missing:?}")]
    MissingResultFiles { dir: PathBuf, missing: Vec<String> },

    /// A result file whose structure cannot be parsed (wrong column count,
    /// undecodable content).
    #[error("malformed result file {path:?}: {message}")]
    MalformedFile { path: PathBuf, message: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EpitrackError>;
