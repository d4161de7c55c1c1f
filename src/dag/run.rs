// src/dag/run.rs

//! Execution-scoped state of one task inside one subgraph.
//!
//! The task graph itself is shared and read-only; every subgraph that reaches
//! a task gets its own [`TaskRun`] holding the input slots and the monitor for
//! that execution. Two subgraphs running the same ancestor concurrently never
//! touch each other's slots.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::dag::task::{Task, TaskId};
use crate::errors::{PipelineError, Result, TaskExecutionError};
use crate::monitor::{EntityKind, Monitor, MonitorSnapshot, Notifier, lock};
use crate::stream::DataStream;

/// One slot per predecessor, in predecessor order.
#[derive(Debug)]
pub struct InputSlots<T> {
    slots: Vec<(TaskId, Option<DataStream<T>>)>,
}

impl<T> InputSlots<T> {
    pub fn for_task(task: &Task<T>) -> Self {
        Self {
            slots: task.predecessors().iter().map(|p| (p.id(), None)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Fill the slot owned by `producer`. Returns `false` when `producer` is
    /// not a predecessor or its slot is already filled.
    pub fn fill(&mut self, producer: TaskId, stream: DataStream<T>) -> bool {
        match self.slots.iter_mut().find(|(id, _)| *id == producer) {
            Some((_, slot @ None)) => {
                *slot = Some(stream);
                true
            }
            _ => false,
        }
    }

    pub fn all_filled(&self) -> bool {
        self.slots.iter().all(|(_, s)| s.is_some())
    }

    /// Streams in predecessor order, if every slot is filled.
    pub fn streams(&self) -> Option<Vec<DataStream<T>>> {
        self.slots.iter().map(|(_, s)| s.clone()).collect()
    }
}

/// A task as executed by one particular subgraph.
pub struct TaskRun<T> {
    task: Arc<Task<T>>,
    slots: Mutex<InputSlots<T>>,
    monitor: Mutex<Monitor>,
}

impl<T> TaskRun<T> {
    pub fn new(task: Arc<Task<T>>, rank: u32) -> Self {
        let slots = InputSlots::for_task(&task);
        Self {
            task,
            slots: Mutex::new(slots),
            monitor: Mutex::new(Monitor::with_rank(EntityKind::Task, rank)),
        }
    }

    pub fn task(&self) -> &Arc<Task<T>> {
        &self.task
    }

    pub fn id(&self) -> TaskId {
        self.task.id()
    }

    pub fn name(&self) -> &str {
        self.task.name()
    }

    pub fn monitor(&self) -> Monitor {
        lock(&self.monitor).clone()
    }

    pub fn has_all_inputs_ready(&self) -> bool {
        lock(&self.slots).all_filled()
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot::capture(self.name(), &lock(&self.monitor), Vec::new())
    }
}

impl<T: Send + 'static> TaskRun<T> {
    /// Store the stream produced by `producer` in its input slot.
    ///
    /// Injecting from a non-predecessor, or twice from the same one, is a
    /// programming error and aborts the owning subgraph.
    pub fn inject_result(&self, producer: &Task<T>, stream: DataStream<T>) -> Result<()> {
        if !lock(&self.slots).fill(producer.id(), stream) {
            return Err(PipelineError::SlotViolation {
                task: self.name().to_string(),
                producer: producer.name().to_string(),
            });
        }
        debug!(task = %self.name(), producer = %producer.name(), "input injected");
        Ok(())
    }

    /// Process the task with its collected inputs.
    ///
    /// Callers check [`has_all_inputs_ready`](Self::has_all_inputs_ready)
    /// first; the engine never processes a run with missing inputs.
    pub fn process(
        &self,
        notifier: &dyn Notifier,
    ) -> std::result::Result<DataStream<T>, TaskExecutionError> {
        let inputs = lock(&self.slots).streams().unwrap_or_default();
        self.task.process(inputs, &self.monitor, notifier)
    }
}
