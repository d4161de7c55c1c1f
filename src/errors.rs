// src/errors.rs

//! Crate-wide error types.

use thiserror::Error;
use uuid::Uuid;

use crate::monitor::{EntityKind, Status};

/// Failure raised by an [`Operation`](crate::exec::Operation).
///
/// Opaque to the engine: it only ever looks at the root of the cause chain.
pub type OperationError = anyhow::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error(transparent)]
    TaskExecution(#[from] TaskExecutionError),

    #[error("Input slot violation on task '{task}': producer '{producer}' is not an empty predecessor slot")]
    SlotViolation { task: String, producer: String },

    #[error("Invalid state transition for {kind} {id}: {from} -> {to}")]
    InvalidTransition {
        kind: EntityKind,
        id: Uuid,
        from: Status,
        to: Status,
    },

    #[error("Subgraph '{subgraph}' cannot make progress; pending tasks: {pending:?}")]
    SubgraphStalled {
        subgraph: String,
        pending: Vec<String>,
    },

    #[error("Subgraph '{subgraph}' aborted: {reason}")]
    SubgraphAborted { subgraph: String, reason: String },

    #[error("No Tokio runtime available to dispatch subgraphs")]
    NoRuntime,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A task's operation failed (or panicked) while being processed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Exception while processing task [ {task} / {monitor_id} ] -> {cause}")]
pub struct TaskExecutionError {
    pub task: String,
    pub monitor_id: Uuid,
    /// Root cause of the underlying failure.
    pub cause: String,
}

impl TaskExecutionError {
    /// Build from an operation failure, keeping only the innermost cause.
    pub fn from_operation(task: &str, monitor_id: Uuid, err: &OperationError) -> Self {
        Self {
            task: task.to_string(),
            monitor_id,
            cause: err.root_cause().to_string(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;
