// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::DefaultsSection;
use crate::model::{BlastParams, Proteome, TaskParams};
use crate::submit::SubmitRequest;
use crate::types::{ActionType, Status};

/// Command-line arguments for `epitrack`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "epitrack",
    version,
    about = "Launch epitope prediction pipelines and ingest their results.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Epitrack.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Epitrack.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `EPITRACK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Start a pipeline run and record it as RUNNING.
    Submit(SubmitArgs),

    /// Print the command a submission would run, without running it.
    Command(SubmitArgs),

    /// Poll running tasks and ingest the results of finished ones.
    Monitor {
        /// Run a single poll cycle and exit.
        #[arg(long)]
        once: bool,
    },

    /// List recorded tasks.
    Status {
        /// Only tasks submitted by this user.
        #[arg(long)]
        user: Option<String>,

        /// Only tasks in this state (running, completed, failed).
        #[arg(long)]
        status: Option<Status>,
    },
}

/// Parameters of one pipeline run.
#[derive(Debug, Clone, Args)]
pub struct SubmitArgs {
    /// Input protein FASTA.
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    #[arg(long, value_name = "NAME")]
    pub run_name: String,

    #[arg(long, value_name = "USER")]
    pub user: String,

    /// `default` ignores --threshold/--min-length/--max-length.
    #[arg(long, default_value = "default")]
    pub action: ActionType,

    #[arg(long)]
    pub threshold: Option<f64>,

    #[arg(long)]
    pub min_length: Option<u32>,

    #[arg(long)]
    pub max_length: Option<u32>,

    /// Enable the BLAST search against the given proteomes.
    #[arg(long)]
    pub blast: bool,

    /// Proteome database as `alias=path`; repeatable. Implies --blast.
    #[arg(long = "proteome", value_name = "ALIAS=PATH", value_parser = parse_proteome)]
    pub proteomes: Vec<Proteome>,

    /// Minimum BLAST query coverage, percent.
    #[arg(long)]
    pub cover: Option<u32>,

    /// Minimum BLAST identity, percent.
    #[arg(long)]
    pub identity: Option<u32>,

    #[arg(long)]
    pub word_size: Option<u32>,
}

impl SubmitArgs {
    /// Turn CLI arguments into a request, filling unset BLAST cut-offs from
    /// `defaults`.
    pub fn into_request(self, defaults: &DefaultsSection) -> SubmitRequest {
        let blast = (self.blast || !self.proteomes.is_empty()).then(|| BlastParams {
            proteomes: self.proteomes,
            cover: self.cover.unwrap_or(defaults.cover),
            identity: self.identity.unwrap_or(defaults.identity),
            word_size: self.word_size.unwrap_or(defaults.word_size),
        });

        SubmitRequest {
            user: self.user,
            run_name: self.run_name,
            input_file: self.input,
            params: TaskParams {
                action: self.action,
                threshold: self.threshold,
                min_length: self.min_length,
                max_length: self.max_length,
                blast,
            },
        }
    }
}

fn parse_proteome(raw: &str) -> Result<Proteome, String> {
    match raw.split_once('=') {
        Some((alias, path)) if !alias.trim().is_empty() && !path.trim().is_empty() => {
            Ok(Proteome::new(alias.trim(), path.trim()))
        }
        _ => Err(format!("expected ALIAS=PATH, got '{raw}'")),
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
