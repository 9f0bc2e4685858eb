use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use epitrack::errors::{EpitrackError, Result};
use epitrack::model::{Task, TaskId};
use epitrack::monitor::ProcessProbe;
use epitrack::pipeline::{LaunchedProcess, PipelineCommand, ProcessLauncher, WorkDirLayout};
use epitrack::store::{MemoryTaskStore, StoreFuture, TaskStore};
use epitrack::types::Status;

/// A probe whose live PIDs are set by the test.
///
/// Clones share the same set, so a test can "kill" a process after handing
/// the probe to a monitor.
#[derive(Debug, Clone, Default)]
pub struct FakeProbe {
    alive: Arc<Mutex<HashSet<u32>>>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&self, pid: u32) {
        self.alive.lock().unwrap().insert(pid);
    }

    pub fn kill(&self, pid: u32) {
        self.alive.lock().unwrap().remove(&pid);
    }
}

impl ProcessProbe for FakeProbe {
    fn is_alive(&self, pid: u32) -> bool {
        self.alive.lock().unwrap().contains(&pid)
    }
}

/// A launcher that:
/// - records every command and directory it was asked to start
/// - hands out increasing PIDs, marking them alive on `probe` when given
/// - or fails every launch with `NotFound` when built with `failing()`.
#[derive(Debug, Clone)]
pub struct FakeLauncher {
    launched: Arc<Mutex<Vec<(PipelineCommand, WorkDirLayout)>>>,
    next_pid: Arc<AtomicU32>,
    probe: Option<FakeProbe>,
    fail: bool,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self {
            launched: Arc::default(),
            next_pid: Arc::new(AtomicU32::new(5000)),
            probe: None,
            fail: false,
        }
    }

    pub fn with_probe(mut self, probe: FakeProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn launched(&self) -> Vec<(PipelineCommand, WorkDirLayout)> {
        self.launched.lock().unwrap().clone()
    }
}

impl Default for FakeLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLauncher for FakeLauncher {
    fn launch(&self, cmd: &PipelineCommand, layout: &WorkDirLayout) -> Result<LaunchedProcess> {
        if self.fail {
            return Err(EpitrackError::LaunchFailure {
                program: cmd.program.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such program"),
            });
        }
        self.launched
            .lock()
            .unwrap()
            .push((cmd.clone(), layout.clone()));
        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        if let Some(probe) = &self.probe {
            probe.spawn(pid);
        }
        Ok(LaunchedProcess { pid })
    }
}

/// In-memory store whose saves can be made to fail.
///
/// `fail_saves_with(status)` rejects saves of tasks in that status only, so
/// a test can fail the COMPLETED save while letting the FAILED fallback
/// through.
#[derive(Debug, Clone, Default)]
pub struct FlakyStore {
    inner: MemoryTaskStore,
    reject: Arc<Mutex<Option<Status>>>,
    reject_all: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_saves_with(&self, status: Status) {
        *self.reject.lock().unwrap() = Some(status);
    }

    pub fn fail_all_saves(&self) {
        self.reject_all.store(true, Ordering::SeqCst);
    }

    /// Seed a task bypassing failure injection.
    pub async fn seed(&self, task: Task) -> Task {
        self.inner.save(task).await.expect("memory store save")
    }

    fn rejects(&self, task: &Task) -> bool {
        self.reject_all.load(Ordering::SeqCst)
            || *self.reject.lock().unwrap() == Some(task.status())
    }
}

impl TaskStore for FlakyStore {
    fn find_all_by_status(&self, status: Status) -> StoreFuture<'_, Vec<Task>> {
        self.inner.find_all_by_status(status)
    }

    fn save(&self, task: Task) -> StoreFuture<'_, Task> {
        if self.rejects(&task) {
            let status = task.status();
            return Box::pin(async move {
                Err(EpitrackError::Persistence(format!("injected failure saving {status} task")))
            });
        }
        self.inner.save(task)
    }

    fn find_by_id(&self, id: TaskId) -> StoreFuture<'_, Option<Task>> {
        self.inner.find_by_id(id)
    }

    fn find_all_by_user<'a>(&'a self, user: &'a str) -> StoreFuture<'a, Vec<Task>> {
        self.inner.find_all_by_user(user)
    }

    fn find_all(&self) -> StoreFuture<'_, Vec<Task>> {
        self.inner.find_all()
    }
}
