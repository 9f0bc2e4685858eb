// src/monitor/reporter.rs

//! Final status transitions for terminated tasks.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::errors::Result;
use crate::ingest::IngestionResult;
use crate::model::Task;
use crate::store::TaskStore;
use crate::types::Status;

/// Moves tasks out of RUNNING and persists them.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    store: Arc<dyn TaskStore>,
}

impl StatusReporter {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Mark `task` COMPLETED with its ingested records and save it.
    ///
    /// If that save fails, the task is saved as FAILED instead. If that
    /// fails too, the error is returned and the store still holds the task
    /// as RUNNING.
    pub async fn complete(&self, task: Task, result: IngestionResult) -> Result<Task> {
        let mut done = task.clone();
        done.state.status = Status::Completed;
        done.finished_at = Some(Utc::now());
        done.proteome_size = Some(result.proteome_size);
        done.failure = None;
        done.epitopes = result.epitopes;

        match self.store.save(done).await {
            Ok(saved) => {
                info!(
                    task_id = %saved.id,
                    epitopes = saved.epitopes.len(),
                    proteome_size = result.proteome_size,
                    "task completed"
                );
                Ok(saved)
            }
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "saving completed task failed; marking it failed");
                self.fail(task, &format!("could not persist results: {e}")).await
            }
        }
    }

    /// Mark `task` FAILED, dropping any records it carried, and save it.
    pub async fn fail(&self, mut task: Task, reason: &str) -> Result<Task> {
        let id = task.id;
        task.state.status = Status::Failed;
        task.finished_at = Some(Utc::now());
        task.proteome_size = None;
        task.failure = Some(reason.to_string());
        task.epitopes.clear();

        match self.store.save(task).await {
            Ok(saved) => {
                info!(task_id = %id, reason, "task failed");
                Ok(saved)
            }
            Err(e) => {
                error!(task_id = %id, error = %e, "could not persist failed task; it stays RUNNING");
                Err(e)
            }
        }
    }
}
