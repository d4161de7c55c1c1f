// src/dag/task.rs

//! Task nodes and their dependency wiring.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, RwLock, Weak};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{OperationError, PipelineError, Result, TaskExecutionError};
use crate::exec::{Operation, SharedOperation};
use crate::monitor::{Monitor, Notifier, lock};
use crate::stream::DataStream;

/// Stable identity of a task within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(Uuid);

impl TaskId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A named node wrapping one [`Operation`].
///
/// Topology is fixed at construction: predecessors are given up front and the
/// new task registers itself as a successor of each of them. Tasks are always
/// handled through `Arc` because they are shared by every subgraph that
/// reaches them.
pub struct Task<T> {
    id: TaskId,
    name: String,
    operation: SharedOperation<T>,
    /// Order is significant: it fixes the position of each input stream.
    predecessors: Vec<Arc<Task<T>>>,
    /// Held weakly so dependents do not keep each other alive in a cycle
    /// with their predecessors.
    successors: RwLock<Vec<Weak<Task<T>>>>,
}

impl<T: Send + 'static> Task<T> {
    /// Create a task and wire it below `predecessors`.
    ///
    /// Fails with [`PipelineError::Configuration`] if the name is blank or a
    /// predecessor is listed twice. Nothing is wired when construction fails.
    pub fn new(
        name: impl Into<String>,
        operation: impl Operation<T> + 'static,
        predecessors: Vec<Arc<Task<T>>>,
    ) -> Result<Arc<Self>> {
        Self::with_shared_operation(name, Arc::new(operation), predecessors)
    }

    pub fn builder(name: impl Into<String>) -> TaskBuilder<T> {
        TaskBuilder::new(name)
    }

    pub fn with_shared_operation(
        name: impl Into<String>,
        operation: SharedOperation<T>,
        predecessors: Vec<Arc<Task<T>>>,
    ) -> Result<Arc<Self>> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "a task has to be named".to_string(),
            ));
        }

        for (i, pred) in predecessors.iter().enumerate() {
            if predecessors[..i].iter().any(|p| p.id == pred.id) {
                return Err(PipelineError::Configuration(format!(
                    "task '{}' lists predecessor '{}' more than once",
                    name, pred.name
                )));
            }
        }

        let task = Arc::new(Self {
            id: TaskId::generate(),
            name,
            operation,
            predecessors,
            successors: RwLock::new(Vec::new()),
        });

        for pred in task.predecessors.iter() {
            pred.successors
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(Arc::downgrade(&task));
        }

        debug!(
            task = %task.name,
            predecessors = task.predecessors.len(),
            "task created"
        );

        Ok(task)
    }

    /// Run the wrapped operation, driving `monitor` through its lifecycle and
    /// notifying after every transition.
    ///
    /// A panicking operation is reported like a failing one.
    pub fn process(
        &self,
        inputs: Vec<DataStream<T>>,
        monitor: &Mutex<Monitor>,
        notifier: &dyn Notifier,
    ) -> std::result::Result<DataStream<T>, TaskExecutionError> {
        let monitor_id = {
            let mut m = lock(monitor);
            if let Err(err) = m.to_running() {
                return Err(TaskExecutionError::from_operation(
                    &self.name,
                    m.id(),
                    &OperationError::new(err),
                ));
            }
            m.id()
        };
        notifier.notify_state_change();

        debug_assert_eq!(inputs.len(), self.predecessors.len());

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.operation.process(inputs)))
            .unwrap_or_else(|payload| Err(OperationError::msg(panic_message(payload.as_ref()))));

        match outcome {
            Ok(stream) => {
                if let Err(err) = lock(monitor).to_done() {
                    warn!(task = %self.name, error = %err, "monitor transition rejected");
                }
                notifier.notify_state_change();
                Ok(stream)
            }
            Err(err) => {
                if let Err(transition) = lock(monitor).to_error() {
                    warn!(task = %self.name, error = %transition, "monitor transition rejected");
                }
                notifier.notify_state_change();
                let failure = TaskExecutionError::from_operation(&self.name, monitor_id, &err);
                warn!(task = %self.name, error = %failure, "task failed");
                Err(failure)
            }
        }
    }
}

impl<T> Task<T> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn predecessors(&self) -> &[Arc<Task<T>>] {
        &self.predecessors
    }

    /// Live successors, in the order they were constructed.
    pub fn successors(&self) -> Vec<Arc<Task<T>>> {
        self.successors
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    pub fn is_initial(&self) -> bool {
        self.predecessors.is_empty()
    }

    pub fn is_terminal(&self) -> bool {
        self.successors
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .all(|s| s.strong_count() == 0)
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preds: Vec<&str> = self.predecessors.iter().map(|p| p.name()).collect();
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("predecessors", &preds)
            .finish_non_exhaustive()
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("operation panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("operation panicked: {s}")
    } else {
        "operation panicked".to_string()
    }
}

/// Incremental construction of a [`Task`].
///
/// ```ignore
/// let d = Task::builder("D").operation(sum).after(&a).after(&b).build()?;
/// ```
pub struct TaskBuilder<T> {
    name: String,
    operation: Option<SharedOperation<T>>,
    predecessors: Vec<Arc<Task<T>>>,
}

impl<T: Send + 'static> TaskBuilder<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operation: None,
            predecessors: Vec::new(),
        }
    }

    pub fn operation(mut self, operation: impl Operation<T> + 'static) -> Self {
        self.operation = Some(Arc::new(operation));
        self
    }

    pub fn shared_operation(mut self, operation: SharedOperation<T>) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Append one predecessor; its output becomes the next input position.
    pub fn after(mut self, predecessor: &Arc<Task<T>>) -> Self {
        self.predecessors.push(Arc::clone(predecessor));
        self
    }

    pub fn build(self) -> Result<Arc<Task<T>>> {
        let operation = self.operation.ok_or_else(|| {
            PipelineError::Configuration(format!(
                "task '{}' should wrap an operation, but the operation is missing",
                self.name
            ))
        })?;
        Task::with_shared_operation(self.name, operation, self.predecessors)
    }
}
