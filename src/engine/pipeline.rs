// src/engine/pipeline.rs

//! Top-level scheduler: decomposes the task set and dispatches every
//! subgraph concurrently.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, RwLock, Weak};

use tracing::{info, trace, warn};

use crate::dag::{Decomposer, Subgraph, Task, TerminalDecomposer};
use crate::engine::CompletionHandle;
use crate::errors::{PipelineError, Result};
use crate::monitor::{EntityKind, Monitor, MonitorSnapshot, Notifier, SnapshotSink, lock};

/// Shared part of a pipeline, reachable (weakly) from its notifier.
struct PipelineState<T> {
    name: String,
    tasks: Vec<Arc<Task<T>>>,
    monitor: Mutex<Monitor>,
    subgraphs: RwLock<Vec<Arc<Subgraph<T>>>>,
}

impl<T> PipelineState<T> {
    fn subgraphs(&self) -> Vec<Arc<Subgraph<T>>> {
        self.subgraphs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn snapshot(&self) -> MonitorSnapshot {
        let children = self.subgraphs().iter().map(|s| s.snapshot()).collect();
        MonitorSnapshot::capture(&self.name, &lock(&self.monitor), children)
    }
}

/// Notifier handed to subgraphs and tasks of one pipeline. Each notification
/// captures the whole pipeline tree and publishes it to the sink.
struct PipelineNotifier<T> {
    state: Weak<PipelineState<T>>,
    sink: Option<Arc<dyn SnapshotSink>>,
}

impl<T: Send + 'static> Notifier for PipelineNotifier<T> {
    fn notify_state_change(&self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        trace!(pipeline = %state.name, "state changed");
        if let Some(sink) = &self.sink {
            sink.publish(state.snapshot());
        }
    }
}

/// Owns a task set and runs it.
///
/// ```ignore
/// let pipeline = Pipeline::new("demo", vec![a, b, c, d, e, f])?;
/// let handles = pipeline.execute()?;
/// for (name, handle) in handles {
///     println!("{name}: {:?}", handle.await?);
/// }
/// ```
pub struct Pipeline<T> {
    state: Arc<PipelineState<T>>,
    decomposer: Box<dyn Decomposer<T>>,
    sink: Option<Arc<dyn SnapshotSink>>,
}

impl<T: Send + 'static> Pipeline<T> {
    /// Create a pipeline over `tasks` with the default [`TerminalDecomposer`].
    ///
    /// Duplicate task handles are ignored.
    pub fn new(name: impl Into<String>, tasks: Vec<Arc<Task<T>>>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "a pipeline has to be named".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let tasks: Vec<Arc<Task<T>>> = tasks
            .into_iter()
            .filter(|t| seen.insert(t.id()))
            .collect();

        Ok(Self {
            state: Arc::new(PipelineState {
                name,
                tasks,
                monitor: Mutex::new(Monitor::new(EntityKind::Pipeline)),
                subgraphs: RwLock::new(Vec::new()),
            }),
            decomposer: Box::new(TerminalDecomposer),
            sink: None,
        })
    }

    pub fn with_decomposer(mut self, decomposer: impl Decomposer<T> + 'static) -> Self {
        self.decomposer = Box::new(decomposer);
        self
    }

    /// Publish a full snapshot to `sink` after every state change.
    pub fn with_sink(mut self, sink: impl SnapshotSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Decompose the task set and dispatch every subgraph.
    ///
    /// Returns as soon as everything is dispatched: the pipeline is then
    /// `Done` even though its subgraphs may still be running. Await the
    /// returned handles to observe each subgraph's outcome. Task failures
    /// never make this call fail; only misuse does (second call, no runtime).
    pub fn execute(&self) -> Result<HashMap<String, CompletionHandle<T>>> {
        tokio::runtime::Handle::try_current().map_err(|_| PipelineError::NoRuntime)?;

        let notifier: Arc<dyn Notifier> = Arc::new(PipelineNotifier {
            state: Arc::downgrade(&self.state),
            sink: self.sink.clone(),
        });

        lock(&self.state.monitor).to_running()?;
        notifier.notify_state_change();

        let subgraphs: Vec<Arc<Subgraph<T>>> = self
            .decomposer
            .decompose(&self.state.tasks)
            .into_iter()
            .map(Arc::new)
            .collect();

        *self
            .state
            .subgraphs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = subgraphs.clone();

        info!(
            pipeline = %self.state.name,
            subgraphs = subgraphs.len(),
            "dispatching subgraphs"
        );

        let mut handles = HashMap::with_capacity(subgraphs.len());
        for subgraph in &subgraphs {
            let handle = subgraph.execute(Arc::clone(&notifier))?;
            if handles.insert(subgraph.name().to_string(), handle).is_some() {
                warn!(
                    pipeline = %self.state.name,
                    subgraph = %subgraph.name(),
                    "duplicate subgraph name; earlier handle replaced"
                );
            }
        }

        lock(&self.state.monitor).to_done()?;
        notifier.notify_state_change();

        Ok(handles)
    }
}

impl<T> Pipeline<T> {
    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn tasks(&self) -> &[Arc<Task<T>>] {
        &self.state.tasks
    }

    /// Subgraphs computed by the last `execute` call (empty before).
    pub fn subgraphs(&self) -> Vec<Arc<Subgraph<T>>> {
        self.state.subgraphs()
    }

    pub fn monitor(&self) -> Monitor {
        lock(&self.state.monitor).clone()
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        self.state.snapshot()
    }
}

impl<T> fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.state.name)
            .field("tasks", &self.state.tasks.len())
            .finish_non_exhaustive()
    }
}
