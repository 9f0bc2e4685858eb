// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod pipeline;
pub mod store;
pub mod submit;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::cli::{CliArgs, Commands};
use crate::config::ConfigFile;
use crate::config::loader::load_and_validate;
use crate::fs::{FileSystem, RealFileSystem};
use crate::model::Task;
use crate::monitor::{Monitor, SysinfoProbe};
use crate::pipeline::ShellLauncher;
use crate::store::{TaskStore, build_store};
use crate::submit::Submitter;
use crate::types::StoreMode;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the task store
/// - the launcher (submit) or the liveness probe and monitor loop (monitor)
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let store = build_store(&cfg, fs.clone());

    match args.command {
        Commands::Submit(submit) => {
            if cfg.store.mode == StoreMode::Memory {
                warn!("memory store selected; the task will not outlive this process");
            }
            let submitter = submitter(&cfg, store, fs);
            let task = submitter.submit(submit.into_request(&cfg.defaults)).await?;
            println!("{}\t{}\t{}", task.id, task.state.status, task.work_dir.display());
        }
        Commands::Command(submit) => {
            let submitter = submitter(&cfg, store, fs);
            let cmd = submitter.preview(&submit.into_request(&cfg.defaults))?;
            println!("{cmd}");
        }
        Commands::Monitor { once } => {
            let monitor = Monitor::new(&cfg, store, Arc::new(SysinfoProbe::new()), fs);
            if once {
                let summary = monitor.poll_once().await?;
                println!(
                    "examined={} running={} completed={} failed={} errors={}",
                    summary.examined,
                    summary.still_running,
                    summary.completed,
                    summary.failed,
                    summary.errors
                );
            } else {
                monitor.run(cfg.poll_interval()).await?;
            }
        }
        Commands::Status { user, status } => {
            let tasks = match &user {
                Some(user) => store.find_all_by_user(user).await?,
                None => store.find_all().await?,
            };
            print_tasks(tasks.iter().filter(|t| status.is_none_or(|s| t.status() == s)));
        }
    }

    Ok(())
}

fn submitter(cfg: &ConfigFile, store: Arc<dyn TaskStore>, fs: Arc<dyn FileSystem>) -> Submitter {
    let launcher = Arc::new(ShellLauncher::from_config(cfg));
    Submitter::new(cfg, launcher, store, fs)
}

/// One tab-separated line per task.
fn print_tasks<'a>(tasks: impl Iterator<Item = &'a Task>) {
    let mut shown = 0;
    for task in tasks {
        shown += 1;
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            task.id,
            task.user,
            task.run_name,
            task.status(),
            task.pid().map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            task.created_at.format("%Y-%m-%d %H:%M:%S"),
            match (&task.failure, task.proteome_size) {
                (Some(reason), _) => reason.clone(),
                (None, Some(size)) => format!("{} epitopes, {size} proteins", task.epitopes.len()),
                (None, None) => String::new(),
            }
        );
    }
    debug!(shown, "listed tasks");
}
