#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use epitrack::config::ConfigFile;
use epitrack::fs::mock::MockFileSystem;
use epitrack::monitor::Monitor;
use epitrack::store::{MemoryTaskStore, TaskStore};
use epitrack::submit::{SubmitRequest, Submitter};
use epitrack::model::TaskParams;
use epitrack_test_utils::builders::ConfigFileBuilder;
use epitrack_test_utils::fakes::{FakeLauncher, FakeProbe};

pub use epitrack_test_utils::init_tracing;

pub const UPLOAD: &str = "/uploads/input.fasta";

/// Submitter and monitor wired to the same in-memory world:
/// a mock filesystem, a memory store, a fake probe and a fake launcher
/// that marks every PID it hands out as alive.
pub struct Harness {
    pub cfg: ConfigFile,
    pub fs: MockFileSystem,
    pub store: Arc<dyn TaskStore>,
    pub probe: FakeProbe,
    pub launcher: FakeLauncher,
    pub submitter: Submitter,
    pub monitor: Monitor,
}

impl Harness {
    pub fn new() -> Self {
        let probe = FakeProbe::new();
        Self::with(Arc::new(MemoryTaskStore::new()), FakeLauncher::new().with_probe(probe.clone()), probe)
    }

    pub fn with(store: Arc<dyn TaskStore>, launcher: FakeLauncher, probe: FakeProbe) -> Self {
        init_tracing();
        let cfg = ConfigFileBuilder::new().with_workspace_root("/www").build();
        let fs = MockFileSystem::new();
        fs.add_file(UPLOAD, ">sp|P1\nMKVLAAGIV\n>sp|P2\nMSTNPKPQ\n");

        let submitter = Submitter::new(
            &cfg,
            Arc::new(launcher.clone()),
            store.clone(),
            Arc::new(fs.clone()),
        );
        let monitor = Monitor::new(&cfg, store.clone(), Arc::new(probe.clone()), Arc::new(fs.clone()));

        Self {
            cfg,
            fs,
            store,
            probe,
            launcher,
            submitter,
            monitor,
        }
    }

    pub fn request(&self, params: TaskParams) -> SubmitRequest {
        SubmitRequest {
            user: "alice".to_string(),
            run_name: "spike".to_string(),
            input_file: PathBuf::from(UPLOAD),
            params,
        }
    }
}
