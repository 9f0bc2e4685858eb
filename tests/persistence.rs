// tests/persistence.rs

mod common;
use crate::common::Harness;

use std::sync::Arc;

use epitrack::fs::{FileSystem, RealFileSystem};
use epitrack::model::TaskParams;
use epitrack::monitor::Monitor;
use epitrack::store::{FileTaskStore, TaskStore};
use epitrack::types::Status;
use epitrack_test_utils::builders::{ConfigFileBuilder, TaskBuilder};
use epitrack_test_utils::fakes::{FakeLauncher, FakeProbe, FlakyStore};
use epitrack_test_utils::fixtures::write_standard_results;

fn flaky_harness() -> (Harness, FlakyStore) {
    let store = FlakyStore::new();
    let probe = FakeProbe::new();
    let h = Harness::with(
        Arc::new(store.clone()),
        FakeLauncher::new().with_probe(probe.clone()),
        probe,
    );
    (h, store)
}

#[tokio::test]
async fn failed_completion_save_falls_back_to_failed() {
    let (h, store) = flaky_harness();
    let task = h.submitter.submit(h.request(TaskParams::default())).await.unwrap();
    write_standard_results(&h.fs, &task.work_dir, 3);
    h.probe.kill(task.pid().unwrap());
    store.fail_saves_with(Status::Completed);

    let summary = h.monitor.poll_once().await.unwrap();

    assert_eq!(summary.failed, 1);
    let saved = store.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(saved.status(), Status::Failed);
    assert!(saved.epitopes.is_empty());
    assert!(saved.failure.unwrap().contains("could not persist results"));
}

#[tokio::test]
async fn unsavable_task_stays_running_for_the_next_cycle() {
    let (h, store) = flaky_harness();
    let task = h.submitter.submit(h.request(TaskParams::default())).await.unwrap();
    write_standard_results(&h.fs, &task.work_dir, 3);
    h.probe.kill(task.pid().unwrap());
    store.fail_all_saves();

    let summary = h.monitor.poll_once().await.unwrap();

    assert_eq!(summary.errors, 1);
    assert_eq!(
        store.find_by_id(task.id).await.unwrap().unwrap().status(),
        Status::Running
    );
}

#[tokio::test]
async fn file_store_survives_a_monitor_restart() {
    let tmp = tempfile::tempdir().unwrap();
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let cfg = ConfigFileBuilder::new()
        .with_file_store(tmp.path().join("tasks"))
        .build();

    let work_dir = tmp.path().join("alice/run_1");
    let task = TaskBuilder::new(&work_dir).pid(77).build();
    let store = FileTaskStore::new(fs.clone(), tmp.path().join("tasks"));
    store.save(task.clone()).await.unwrap();

    let probe = FakeProbe::new();
    probe.spawn(77);

    // First monitor: still running.
    let first = Monitor::new(&cfg, Arc::new(store.clone()), Arc::new(probe.clone()), fs.clone());
    assert_eq!(first.poll_once().await.unwrap().still_running, 1);
    drop(first);

    // The process ends while nothing is watching.
    write_standard_results(fs.as_ref(), &work_dir, 2);
    probe.kill(77);

    // A fresh monitor over a fresh store handle picks the task up from disk.
    let reopened = FileTaskStore::new(fs.clone(), tmp.path().join("tasks"));
    let second = Monitor::new(&cfg, Arc::new(reopened.clone()), Arc::new(probe), fs);
    assert_eq!(second.poll_once().await.unwrap().completed, 1);

    let done = reopened.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(done.status(), Status::Completed);
    assert_eq!(done.proteome_size, Some(2));
    assert_eq!(done.epitopes.len(), 2);
}

#[tokio::test]
async fn listing_by_user_only_returns_their_tasks() {
    let h = Harness::new();
    for user in ["alice", "bob", "alice"] {
        let mut req = h.request(TaskParams::default());
        req.user = user.to_string();
        req.run_name = format!("{user}-run");
        h.submitter.submit(req).await.unwrap();
    }

    let alice = h.store.find_all_by_user("alice").await.unwrap();
    assert_eq!(alice.len(), 2);
    assert!(alice.iter().all(|t| t.user == "alice"));
    assert_eq!(h.store.find_all().await.unwrap().len(), 3);
}
