// src/model/mod.rs

//! Domain types: tasks and the records ingested from their output.

pub mod method;
pub mod records;
pub mod task;

pub use method::Method;
pub use records::{
    AntigenicityScores, Attachable, BlastHitRecord, EpitopeRecord, Ordinal, TopologyRecord,
};
pub use task::{BlastParams, Proteome, Task, TaskId, TaskParams, TaskStatus};
