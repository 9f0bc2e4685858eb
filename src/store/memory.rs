// src/store/memory.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::errors::{EpitrackError, Result};
use crate::model::{Task, TaskId};
use crate::types::Status;

use super::{StoreFuture, TaskStore, sort_tasks};

/// Non-durable store. Clones share the same tasks.
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskStore {
    tasks: Arc<Mutex<HashMap<TaskId, Task>>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn select(&self, keep: impl Fn(&Task) -> bool) -> Result<Vec<Task>> {
        let tasks = self
            .tasks
            .lock()
            .map_err(|_| EpitrackError::Persistence("task map lock poisoned".to_string()))?;
        let mut out: Vec<Task> = tasks.values().filter(|t| keep(t)).cloned().collect();
        sort_tasks(&mut out);
        Ok(out)
    }
}

impl TaskStore for MemoryTaskStore {
    fn find_all_by_status(&self, status: Status) -> StoreFuture<'_, Vec<Task>> {
        let result = self.select(|t| t.status() == status);
        Box::pin(async move { result })
    }

    fn save(&self, task: Task) -> StoreFuture<'_, Task> {
        let result = self
            .tasks
            .lock()
            .map_err(|_| EpitrackError::Persistence("task map lock poisoned".to_string()))
            .map(|mut tasks| {
                tasks.insert(task.id, task.clone());
                task
            });
        Box::pin(async move { result })
    }

    fn find_by_id(&self, id: TaskId) -> StoreFuture<'_, Option<Task>> {
        let result = self
            .tasks
            .lock()
            .map_err(|_| EpitrackError::Persistence("task map lock poisoned".to_string()))
            .map(|tasks| tasks.get(&id).cloned());
        Box::pin(async move { result })
    }

    fn find_all_by_user<'a>(&'a self, user: &'a str) -> StoreFuture<'a, Vec<Task>> {
        let result = self.select(|t| t.user == user);
        Box::pin(async move { result })
    }

    fn find_all(&self) -> StoreFuture<'_, Vec<Task>> {
        let result = self.select(|_| true);
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskParams;
    use std::path::PathBuf;

    fn task(user: &str, pid: u32) -> Task {
        Task::running(
            user,
            "run",
            PathBuf::from("/www/x"),
            PathBuf::from("/www/x/in.fasta"),
            TaskParams::default(),
            pid,
        )
    }

    #[tokio::test]
    async fn save_replaces_by_id() {
        let store = MemoryTaskStore::new();
        let mut t = store.save(task("alice", 1)).await.unwrap();
        t.state.status = Status::Completed;
        store.save(t.clone()).await.unwrap();

        assert!(store.find_all_by_status(Status::Running).await.unwrap().is_empty());
        assert_eq!(store.find_by_id(t.id).await.unwrap(), Some(t));
    }

    #[tokio::test]
    async fn filters_by_user() {
        let store = MemoryTaskStore::new();
        store.save(task("alice", 1)).await.unwrap();
        store.save(task("bob", 2)).await.unwrap();

        let alice = store.find_all_by_user("alice").await.unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].pid(), Some(1));
        assert_eq!(store.find_all().await.unwrap().len(), 2);
    }
}
