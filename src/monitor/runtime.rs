// src/monitor/runtime.rs

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::ConfigFile;
use crate::errors::{EpitrackError, Result};
use crate::fs::FileSystem;
use crate::ingest::Ingestor;
use crate::model::Task;
use crate::pipeline::WorkDirLayout;
use crate::store::TaskStore;
use crate::types::Status;

use super::MonitorEvent;
use super::core::{NextStep, PollSummary, Verdict, assess, next_step, parse_exit_code};
use super::probe::ProcessProbe;
use super::reporter::StatusReporter;

/// Polls RUNNING tasks and finalizes the ones whose process has ended.
///
/// This is the async shell around [`super::core`]: it reads tasks from the
/// store, gathers liveness and exit-code facts, and hands terminated tasks
/// to ingestion and the [`StatusReporter`].
#[derive(Debug)]
pub struct Monitor {
    store: Arc<dyn TaskStore>,
    probe: Arc<dyn ProcessProbe>,
    fs: Arc<dyn FileSystem>,
    ingestor: Ingestor,
    reporter: StatusReporter,
    log_file: String,
    exit_code_file: String,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when a cycle ends, however it ends.
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Monitor {
    pub fn new(
        cfg: &ConfigFile,
        store: Arc<dyn TaskStore>,
        probe: Arc<dyn ProcessProbe>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            reporter: StatusReporter::new(store.clone()),
            ingestor: Ingestor::new(fs.clone()),
            store,
            probe,
            fs,
            log_file: cfg.pipeline.log_file.clone(),
            exit_code_file: cfg.monitor.exit_code_file.clone(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one cycle over every RUNNING task.
    ///
    /// Returns an empty summary without touching anything if another cycle
    /// is still in progress.
    pub async fn poll_once(&self) -> Result<PollSummary> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!("monitor cycle already in progress; skipping");
            return Ok(PollSummary::default());
        }
        let _guard = CycleGuard(&self.in_flight);

        let tasks = self.store.find_all_by_status(Status::Running).await?;
        debug!(running = tasks.len(), "monitor cycle started");

        let mut summary = PollSummary::default();
        for task in tasks {
            let id = task.id;
            match self.examine(task).await {
                Ok(status) => summary.record(status),
                Err(e) => {
                    error!(task_id = %id, error = %e, "failed to finalize task");
                    summary.record_error();
                }
            }
        }

        if summary.is_idle() {
            debug!("no running tasks");
        } else {
            info!(
                examined = summary.examined,
                still_running = summary.still_running,
                completed = summary.completed,
                failed = summary.failed,
                errors = summary.errors,
                "monitor cycle finished"
            );
        }
        Ok(summary)
    }

    /// Poll every `interval` until Ctrl-C.
    pub async fn run(&self, interval: Duration) -> Result<()> {
        self.run_until(interval, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for Ctrl-C; monitor runs until killed");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Poll every `interval` until `shutdown` resolves.
    ///
    /// Ticks feed a channel of capacity one that a single loop drains, so a
    /// slow cycle makes later ticks drop rather than pile up or overlap.
    pub async fn run_until<F>(&self, interval: Duration, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<MonitorEvent>(1);
        let ticker = tokio::spawn(tick(interval, tx.clone()));
        let stopper = tokio::spawn(async move {
            shutdown.await;
            let _ = tx.send(MonitorEvent::ShutdownRequested).await;
        });

        info!(interval = ?interval, "monitor started");
        while let Some(event) = rx.recv().await {
            match event {
                MonitorEvent::Tick => {
                    if let Err(e) = self.poll_once().await {
                        error!(error = %e, "monitor cycle failed");
                    }
                }
                MonitorEvent::ShutdownRequested => {
                    info!("shutdown requested; stopping monitor");
                    break;
                }
            }
        }

        ticker.abort();
        stopper.abort();
        info!("monitor exiting");
        Ok(())
    }

    fn layout_for(&self, task: &Task) -> WorkDirLayout {
        WorkDirLayout::with_file_names(
            task.work_dir.clone(),
            self.log_file.clone(),
            self.exit_code_file.clone(),
        )
    }

    /// Check one task and finalize it if its process has ended. Returns the
    /// status the task was left in.
    async fn examine(&self, task: Task) -> Result<Status> {
        let layout = self.layout_for(&task);
        let exit_code = self.read_exit_code(&layout);
        let alive = match task.pid() {
            Some(pid) => self.probe.is_alive(pid),
            None => {
                warn!(task_id = %task.id, "running task without a PID");
                false
            }
        };

        let exit_code = match assess(alive, exit_code) {
            Verdict::StillRunning => {
                debug!(task_id = %task.id, pid = ?task.pid(), "still running");
                return Ok(Status::Running);
            }
            Verdict::Terminated { exit_code } => exit_code,
        };
        info!(task_id = %task.id, pid = ?task.pid(), exit_code = ?exit_code, "pipeline process ended");

        let saved = match next_step(exit_code) {
            NextStep::Fail { exit_code } => {
                let reason = format!("pipeline exited with status {exit_code}");
                self.reporter.fail(task, &reason).await?
            }
            NextStep::Ingest => match self.ingest(&task, layout).await {
                Ok(result) => self.reporter.complete(task, result).await?,
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "ingestion failed");
                    self.reporter.fail(task, &e.to_string()).await?
                }
            },
        };
        Ok(saved.status())
    }

    async fn ingest(&self, task: &Task, layout: WorkDirLayout) -> Result<crate::ingest::IngestionResult> {
        let ingestor = self.ingestor.clone();
        let blast = task.params.blast_enabled();
        tokio::task::spawn_blocking(move || ingestor.ingest(&layout, blast))
            .await
            .map_err(|e| EpitrackError::Other(anyhow!("ingestion task panicked: {e}")))?
    }

    fn read_exit_code(&self, layout: &WorkDirLayout) -> Option<i32> {
        let path = layout.exit_code_file();
        if !self.fs.is_file(&path) {
            return None;
        }
        match self.fs.read_to_string(&path) {
            Ok(raw) => {
                let code = parse_exit_code(&raw);
                if code.is_none() {
                    debug!(path = ?path, "exit-code file not readable yet");
                }
                code
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "cannot read exit-code file");
                None
            }
        }
    }
}

async fn tick(period: Duration, tx: mpsc::Sender<MonitorEvent>) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        match tx.try_send(MonitorEvent::Tick) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => debug!("previous cycle still running; dropping tick"),
            Err(TrySendError::Closed(_)) => break,
        }
    }
}
