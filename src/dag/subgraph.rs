// src/dag/subgraph.rs

//! Staged, data-driven execution of one subgraph.
//!
//! A subgraph is the ancestor closure of one terminal ("ending") task. It is
//! executed in three stages:
//!
//! 1. starting tasks (no predecessors) are processed with no inputs and their
//!    streams injected into member successors;
//! 2. any pending, non-ending task whose slots are all filled is processed and
//!    its stream injected further, until only the ending task is pending;
//! 3. the ending task is processed and its stream drained; the drained
//!    elements are the subgraph's result. A panic raised while draining is
//!    reported as a failure of the ending task.
//!
//! Operations return lazy streams, so stages advance on slot occupancy rather
//! than on completed computation. Nothing is evaluated before stage 3.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::dag::run::TaskRun;
use crate::dag::task::{Task, TaskId, panic_message};
use crate::engine::CompletionHandle;
use crate::errors::{OperationError, PipelineError, Result, TaskExecutionError};
use crate::monitor::{EntityKind, Monitor, MonitorSnapshot, Notifier, lock};
use crate::stream::DataStream;

pub struct Subgraph<T> {
    name: String,
    runs: Vec<TaskRun<T>>,
    index: HashMap<TaskId, usize>,
    starting: Vec<usize>,
    ending: usize,
    monitor: Mutex<Monitor>,
}

impl<T: Send + 'static> Subgraph<T> {
    /// Build a subgraph from its ending task and its ranked members.
    ///
    /// The ending task is added with rank 1 if `members` does not contain it.
    pub fn new(ending_task: Arc<Task<T>>, members: Vec<(Arc<Task<T>>, u32)>) -> Self {
        let mut runs: Vec<TaskRun<T>> = Vec::with_capacity(members.len() + 1);
        let mut index: HashMap<TaskId, usize> = HashMap::new();

        for (task, rank) in members {
            if index.contains_key(&task.id()) {
                continue;
            }
            index.insert(task.id(), runs.len());
            runs.push(TaskRun::new(task, rank));
        }

        let ending = match index.get(&ending_task.id()) {
            Some(&i) => i,
            None => {
                index.insert(ending_task.id(), runs.len());
                runs.push(TaskRun::new(ending_task, 1));
                runs.len() - 1
            }
        };

        let starting = runs
            .iter()
            .enumerate()
            .filter(|(_, r)| r.task().is_initial())
            .map(|(i, _)| i)
            .collect();

        let mut names: Vec<&str> = runs.iter().map(|r| r.name()).collect();
        names.sort_unstable();
        let name = names.join(",");

        Self {
            name,
            runs,
            index,
            starting,
            ending,
            monitor: Mutex::new(Monitor::new(EntityKind::Subgraph)),
        }
    }

    /// Dispatch this subgraph onto the current Tokio runtime.
    pub fn execute(self: &Arc<Self>, notifier: Arc<dyn Notifier>) -> Result<CompletionHandle<T>> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| PipelineError::NoRuntime)?;
        let subgraph = Arc::clone(self);
        let join = runtime.spawn(async move { subgraph.run(notifier.as_ref()).await });
        Ok(CompletionHandle::new(self.name.clone(), join))
    }

    /// Execute all three stages in the current task.
    pub async fn run(&self, notifier: &dyn Notifier) -> Result<Vec<T>> {
        lock(&self.monitor).to_running()?;
        notifier.notify_state_change();
        info!(subgraph = %self.name, tasks = self.runs.len(), "processing subgraph");

        let outcome = self.run_stages(notifier).await;

        {
            let mut monitor = lock(&self.monitor);
            match &outcome {
                Ok(items) => {
                    info!(
                        subgraph = %self.name,
                        items = items.len(),
                        "finished processing subgraph"
                    );
                    monitor.to_done()?;
                }
                Err(err) => {
                    error!(subgraph = %self.name, error = %err, "subgraph failed");
                    monitor.to_error()?;
                }
            }
        }
        notifier.notify_state_change();

        outcome
    }

    async fn run_stages(&self, notifier: &dyn Notifier) -> Result<Vec<T>> {
        let mut pending = self.process_starting_tasks(notifier)?;
        self.process_intermediate_tasks(&mut pending, notifier)?;
        self.process_ending_task(notifier).await
    }

    fn process_starting_tasks(&self, notifier: &dyn Notifier) -> Result<BTreeSet<usize>> {
        info!(
            subgraph = %self.name,
            count = self.starting.len(),
            "processing starting tasks"
        );

        let mut pending = BTreeSet::new();
        for &i in &self.starting {
            // An isolated task is both starting and ending; stage 3 handles it.
            if i == self.ending {
                pending.insert(i);
                continue;
            }
            let run = &self.runs[i];
            let stream = run.process(notifier)?;
            self.propagate(run, stream, &mut pending)?;
        }
        Ok(pending)
    }

    fn process_intermediate_tasks(
        &self,
        pending: &mut BTreeSet<usize>,
        notifier: &dyn Notifier,
    ) -> Result<()> {
        info!(
            subgraph = %self.name,
            pending = pending.len(),
            "processing intermediate tasks"
        );

        while !self.only_ending_task_remains(pending) {
            let ready: Vec<usize> = pending
                .iter()
                .copied()
                .filter(|&i| i != self.ending && !self.runs[i].task().is_terminal())
                .filter(|&i| self.runs[i].has_all_inputs_ready())
                .collect();

            if ready.is_empty() {
                return Err(PipelineError::SubgraphStalled {
                    subgraph: self.name.clone(),
                    pending: pending
                        .iter()
                        .map(|&i| self.runs[i].name().to_string())
                        .collect(),
                });
            }

            for i in ready {
                let run = &self.runs[i];
                debug!(subgraph = %self.name, task = %run.name(), "all inputs ready; activating");
                let stream = run.process(notifier)?;
                self.propagate(run, stream, pending)?;
                pending.remove(&i);
            }
        }
        Ok(())
    }

    async fn process_ending_task(&self, notifier: &dyn Notifier) -> Result<Vec<T>> {
        let run = &self.runs[self.ending];
        info!(subgraph = %self.name, task = %run.name(), "processing ending task");

        if !run.has_all_inputs_ready() {
            return Err(PipelineError::SubgraphStalled {
                subgraph: self.name.clone(),
                pending: vec![run.name().to_string()],
            });
        }

        let stream = run.process(notifier)?;
        match AssertUnwindSafe(stream.collect()).catch_unwind().await {
            Ok(items) => Ok(items),
            Err(payload) => {
                let cause = OperationError::msg(panic_message(payload.as_ref()));
                let failure =
                    TaskExecutionError::from_operation(run.name(), run.monitor().id(), &cause);
                warn!(
                    subgraph = %self.name,
                    task = %run.name(),
                    error = %failure,
                    "ending stream panicked while draining"
                );
                Err(failure.into())
            }
        }
    }

    /// Inject `stream` into every successor of `producer` that belongs to this
    /// subgraph and mark those successors pending.
    fn propagate(
        &self,
        producer: &TaskRun<T>,
        stream: DataStream<T>,
        pending: &mut BTreeSet<usize>,
    ) -> Result<()> {
        for successor in producer.task().successors() {
            let Some(&i) = self.index.get(&successor.id()) else {
                continue;
            };
            self.runs[i].inject_result(producer.task(), stream.clone())?;
            pending.insert(i);
        }
        Ok(())
    }

    fn only_ending_task_remains(&self, pending: &BTreeSet<usize>) -> bool {
        pending.len() == 1 && pending.contains(&self.ending)
    }
}

impl<T> Subgraph<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn runs(&self) -> &[TaskRun<T>] {
        &self.runs
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Arc<Task<T>>> {
        self.runs.iter().map(|r| r.task())
    }

    pub fn starting_tasks(&self) -> impl Iterator<Item = &Arc<Task<T>>> {
        self.starting.iter().map(|&i| self.runs[i].task())
    }

    pub fn ending_task(&self) -> &Arc<Task<T>> {
        self.runs[self.ending].task()
    }

    pub fn contains(&self, task: &Task<T>) -> bool {
        self.index.contains_key(&task.id())
    }

    /// Execution state of `task` in this subgraph.
    pub fn run_of(&self, task: &Task<T>) -> Option<&TaskRun<T>> {
        self.index.get(&task.id()).map(|&i| &self.runs[i])
    }

    pub fn monitor(&self) -> Monitor {
        lock(&self.monitor).clone()
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        let children = self.runs.iter().map(|r| r.snapshot()).collect();
        MonitorSnapshot::capture(&self.name, &lock(&self.monitor), children)
    }
}

impl<T> fmt::Debug for Subgraph<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subgraph")
            .field("name", &self.name)
            .field("ending", &self.runs[self.ending].name())
            .finish_non_exhaustive()
    }
}
