// src/store/file.rs

//! One pretty-printed JSON document per task: `<root>/<task id>.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::{EpitrackError, Result};
use crate::fs::FileSystem;
use crate::model::{Task, TaskId};
use crate::types::Status;

use super::{StoreFuture, TaskStore, sort_tasks};

#[derive(Debug, Clone)]
pub struct FileTaskStore {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
}

impl FileTaskStore {
    pub fn new(fs: Arc<dyn FileSystem>, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    fn doc_path(&self, id: TaskId) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    fn read_doc(&self, path: &Path) -> Result<Task> {
        let raw = self
            .fs
            .read_to_string(path)
            .map_err(|e| EpitrackError::Persistence(format!("{e:#}")))?;
        serde_json::from_str(&raw)
            .map_err(|e| EpitrackError::Persistence(format!("decoding {}: {e}", path.display())))
    }

    /// Write to `<id>.json.tmp` and rename over `<id>.json`, so a crash
    /// mid-save leaves the previous document intact.
    fn write_doc(&self, task: &Task) -> Result<()> {
        let json = serde_json::to_vec_pretty(task)
            .map_err(|e| EpitrackError::Persistence(format!("encoding task {}: {e}", task.id)))?;
        let path = self.doc_path(task.id);
        let tmp = path.with_extension("json.tmp");
        self.fs
            .write(&tmp, &json)
            .and_then(|()| self.fs.rename(&tmp, &path))
            .map_err(|e| EpitrackError::Persistence(format!("{e:#}")))?;
        debug!(task_id = %task.id, path = ?path, "task saved");
        Ok(())
    }

    /// Every readable task document. Undecodable documents are skipped with
    /// a warning so one bad file cannot stall the monitor.
    fn load_all(&self) -> Result<Vec<Task>> {
        if !self.fs.is_dir(&self.root) {
            return Ok(Vec::new());
        }
        let entries = self
            .fs
            .read_dir(&self.root)
            .map_err(|e| EpitrackError::Persistence(format!("{e:#}")))?;

        let mut tasks = Vec::new();
        for path in entries {
            if path.extension().is_none_or(|ext| ext != "json") || !self.fs.is_file(&path) {
                continue;
            }
            match self.read_doc(&path) {
                Ok(task) => tasks.push(task),
                Err(e) => warn!(path = ?path, error = %e, "skipping unreadable task document"),
            }
        }
        sort_tasks(&mut tasks);
        Ok(tasks)
    }

    fn select(&self, keep: impl Fn(&Task) -> bool) -> Result<Vec<Task>> {
        Ok(self.load_all()?.into_iter().filter(|t| keep(t)).collect())
    }
}

impl TaskStore for FileTaskStore {
    fn find_all_by_status(&self, status: Status) -> StoreFuture<'_, Vec<Task>> {
        Box::pin(async move { self.select(|t| t.status() == status) })
    }

    fn save(&self, task: Task) -> StoreFuture<'_, Task> {
        Box::pin(async move {
            self.write_doc(&task)?;
            Ok(task)
        })
    }

    fn find_by_id(&self, id: TaskId) -> StoreFuture<'_, Option<Task>> {
        Box::pin(async move {
            let path = self.doc_path(id);
            if !self.fs.is_file(&path) {
                return Ok(None);
            }
            self.read_doc(&path).map(Some)
        })
    }

    fn find_all_by_user<'a>(&'a self, user: &'a str) -> StoreFuture<'a, Vec<Task>> {
        Box::pin(async move { self.select(|t| t.user == user) })
    }

    fn find_all(&self) -> StoreFuture<'_, Vec<Task>> {
        Box::pin(async move { self.load_all() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::model::TaskParams;

    fn task(user: &str) -> Task {
        Task::running(
            user,
            "run",
            PathBuf::from("/www/x"),
            PathBuf::from("/www/x/in.fasta"),
            TaskParams::default(),
            42,
        )
    }

    #[tokio::test]
    async fn tasks_round_trip_through_json_documents() {
        let fs = MockFileSystem::new();
        let store = FileTaskStore::new(Arc::new(fs.clone()), "/state/tasks");

        let saved = store.save(task("alice")).await.unwrap();
        let doc = fs
            .read_to_string(&PathBuf::from(format!("/state/tasks/{}.json", saved.id)))
            .unwrap();
        assert!(doc.contains("\"status\": \"RUNNING\""), "{doc}");

        let loaded = store.find_by_id(saved.id).await.unwrap();
        assert_eq!(loaded, Some(saved));
    }

    #[tokio::test]
    async fn empty_or_absent_root_lists_nothing() {
        let store = FileTaskStore::new(Arc::new(MockFileSystem::new()), "/state/tasks");
        assert!(store.find_all_by_status(Status::Running).await.unwrap().is_empty());
        assert_eq!(store.find_by_id(TaskId::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_documents_are_skipped() {
        let fs = MockFileSystem::new();
        fs.add_file("/state/tasks/garbage.json", "{ not json");
        fs.add_file("/state/tasks/notes.txt", "hello");
        let store = FileTaskStore::new(Arc::new(fs), "/state/tasks");
        store.save(task("bob")).await.unwrap();

        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].user, "bob");
    }

    #[tokio::test]
    async fn save_replaces_the_document_without_leaving_a_temp_file() {
        let fs = MockFileSystem::new();
        let store = FileTaskStore::new(Arc::new(fs.clone()), "/state/tasks");
        let mut saved = store.save(task("alice")).await.unwrap();

        saved.state.status = Status::Completed;
        store.save(saved.clone()).await.unwrap();

        let listed = fs.read_dir(Path::new("/state/tasks")).unwrap();
        assert_eq!(listed, vec![PathBuf::from(format!("/state/tasks/{}.json", saved.id))]);
        assert_eq!(store.find_by_id(saved.id).await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn interrupted_save_keeps_the_previous_document() {
        let fs = MockFileSystem::new();
        let store = FileTaskStore::new(Arc::new(fs.clone()), "/state/tasks");
        let saved = store.save(task("alice")).await.unwrap();

        // A save that died after writing the temp file but before the rename.
        fs.add_file(format!("/state/tasks/{}.json.tmp", saved.id), "{ \"id\": ");

        let running = store.find_all_by_status(Status::Running).await.unwrap();
        assert_eq!(running, vec![saved]);
    }
}
