// src/exec/operation.rs

//! The `Operation` capability.

use std::sync::Arc;

use crate::errors::OperationError;
use crate::stream::DataStream;

/// A pure transformation from ordered input streams to one output stream.
///
/// The engine always passes exactly one input per predecessor of the owning
/// task, in predecessor order. Initial tasks receive an empty vector.
///
/// Any closure `Fn(Vec<DataStream<T>>) -> Result<DataStream<T>, OperationError>`
/// is an operation.
pub trait Operation<T>: Send + Sync {
    fn process(&self, inputs: Vec<DataStream<T>>) -> Result<DataStream<T>, OperationError>;
}

impl<T, F> Operation<T> for F
where
    F: Fn(Vec<DataStream<T>>) -> Result<DataStream<T>, OperationError> + Send + Sync,
{
    fn process(&self, inputs: Vec<DataStream<T>>) -> Result<DataStream<T>, OperationError> {
        self(inputs)
    }
}

/// Operations are shared by every task (and subgraph) that uses them.
pub type SharedOperation<T> = Arc<dyn Operation<T>>;

/// Pin a closure to the operation signature so its argument and error types
/// are inferred at the call site.
///
/// ```ignore
/// let double = operation_fn(|inputs: Vec<DataStream<i64>>| Ok(inputs[0].map(|x| x * 2)));
/// ```
pub fn operation_fn<T, F>(f: F) -> F
where
    F: Fn(Vec<DataStream<T>>) -> Result<DataStream<T>, OperationError> + Send + Sync,
{
    f
}
