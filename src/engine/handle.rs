// src/engine/handle.rs

//! Completion handle returned for every dispatched subgraph.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::errors::{PipelineError, Result};

/// Resolves once the subgraph's ending stream has been drained.
///
/// - `Ok(items)`: every element produced by the ending task.
/// - `Err(PipelineError::TaskExecution(..))`: the first task that failed.
/// - `Err(PipelineError::SubgraphAborted { .. })`: the spawned unit itself
///   panicked or was cancelled.
pub struct CompletionHandle<T> {
    subgraph: String,
    inner: JoinHandle<Result<Vec<T>>>,
}

impl<T> CompletionHandle<T> {
    pub(crate) fn new(subgraph: String, inner: JoinHandle<Result<Vec<T>>>) -> Self {
        Self { subgraph, inner }
    }

    /// Name of the subgraph this handle belongs to.
    pub fn subgraph(&self) -> &str {
        &self.subgraph
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

impl<T> Future for CompletionHandle<T> {
    type Output = Result<Vec<T>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.inner).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(join_err)) => Poll::Ready(Err(PipelineError::SubgraphAborted {
                subgraph: self.subgraph.clone(),
                reason: join_err.to_string(),
            })),
        }
    }
}

impl<T> fmt::Debug for CompletionHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionHandle")
            .field("subgraph", &self.subgraph)
            .field("finished", &self.inner.is_finished())
            .finish()
    }
}
