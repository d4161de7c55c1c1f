// src/monitor/mod.rs

//! Lifecycle tracking for every schedulable entity.
//!
//! - [`Monitor`] holds the status, timestamps and rank of one entity.
//! - [`snapshot`] turns monitors into a nested, serialisable tree.
//! - [`notify`] defines the `Notifier` boundary used to publish state changes.

pub mod notify;
pub mod snapshot;

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::{PipelineError, Result};

pub use notify::{JsonLinesSink, Notifier, NoopNotifier, SnapshotSink};
pub use snapshot::MonitorSnapshot;

/// Kind of entity a monitor is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Pipeline,
    Subgraph,
    Task,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Pipeline => "pipeline",
            EntityKind::Subgraph => "subgraph",
            EntityKind::Task => "task",
        };
        f.write_str(s)
    }
}

/// Lifecycle status.
///
/// Only `New -> Running -> {Done | InError}` is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    New,
    Running,
    Done,
    InError,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Done | Status::InError)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::New => "NEW",
            Status::Running => "RUNNING",
            Status::Done => "DONE",
            Status::InError => "IN_ERROR",
        };
        f.write_str(s)
    }
}

/// State holder for one pipeline, subgraph or task run.
#[derive(Debug, Clone)]
pub struct Monitor {
    id: Uuid,
    kind: EntityKind,
    status: Status,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    /// Distance from the terminal task along the traversal that discovered
    /// this entity. Terminal task is 1. Informational only.
    rank: u32,
}

impl Monitor {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            status: Status::New,
            start_time: None,
            end_time: None,
            rank: 0,
        }
    }

    pub fn with_rank(kind: EntityKind, rank: u32) -> Self {
        Self {
            rank,
            ..Self::new(kind)
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// Elapsed milliseconds between start and end, once both are known.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }

    pub fn to_running(&mut self) -> Result<()> {
        self.transition(Status::New, Status::Running)?;
        self.start_time = Some(Utc::now());
        Ok(())
    }

    pub fn to_done(&mut self) -> Result<()> {
        self.transition(Status::Running, Status::Done)?;
        self.end_time = Some(Utc::now());
        Ok(())
    }

    pub fn to_error(&mut self) -> Result<()> {
        self.transition(Status::Running, Status::InError)?;
        self.end_time = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, expected: Status, to: Status) -> Result<()> {
        if self.status != expected {
            return Err(PipelineError::InvalidTransition {
                kind: self.kind,
                id: self.id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
///
/// Monitors and slots stay meaningful after an operation panic, which the
/// engine already reports as a task failure.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
