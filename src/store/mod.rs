// src/store/mod.rs

//! Persistent task storage.
//!
//! The store is the only record of a task's status. Nothing else in the
//! crate keeps a status map; the monitor re-reads RUNNING tasks from the
//! store on every cycle.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::model::{Task, TaskId};
use crate::types::{Status, StoreMode};

pub mod file;
pub mod memory;

pub use file::FileTaskStore;
pub use memory::MemoryTaskStore;

/// Boxed future returned by [`TaskStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Trait abstracting where tasks are persisted.
pub trait TaskStore: Send + Sync + fmt::Debug {
    /// Every task currently in `status`, oldest first.
    fn find_all_by_status(&self, status: Status) -> StoreFuture<'_, Vec<Task>>;

    /// Insert or replace `task` by id and return what was stored.
    fn save(&self, task: Task) -> StoreFuture<'_, Task>;

    fn find_by_id(&self, id: TaskId) -> StoreFuture<'_, Option<Task>>;

    /// Every task submitted by `user`, oldest first.
    fn find_all_by_user<'a>(&'a self, user: &'a str) -> StoreFuture<'a, Vec<Task>>;

    /// Every task, oldest first.
    fn find_all(&self) -> StoreFuture<'_, Vec<Task>>;
}

/// Oldest first, ties broken by id so listings are stable.
pub(crate) fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

/// Build the store selected by `[store]`.
pub fn build_store(cfg: &ConfigFile, fs: Arc<dyn FileSystem>) -> Arc<dyn TaskStore> {
    match cfg.store.mode {
        StoreMode::Memory => Arc::new(MemoryTaskStore::new()),
        StoreMode::File => Arc::new(FileTaskStore::new(fs, PathBuf::from(&cfg.store.path))),
    }
}
