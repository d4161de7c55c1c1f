#![allow(dead_code)]

use std::error::Error;
use std::sync::Arc;

use pipedag::dag::Task;
use pipedag::exec::BuiltinOperation;

pub use pipedag_test_utils::{init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;

/// Initial task emitting `values`.
pub fn source(name: &str, values: &[i64]) -> Arc<Task<i64>> {
    Task::new(
        name,
        BuiltinOperation::Just {
            values: values.to_vec(),
        },
        vec![],
    )
    .expect("source task should build")
}

/// Element-wise sum of `preds`.
pub fn sum(name: &str, preds: &[&Arc<Task<i64>>]) -> Arc<Task<i64>> {
    Task::new(
        name,
        BuiltinOperation::Sum,
        preds.iter().map(|p| Arc::clone(p)).collect(),
    )
    .expect("sum task should build")
}

pub fn names(tasks: &[Arc<Task<i64>>]) -> Vec<String> {
    tasks.iter().map(|t| t.name().to_string()).collect()
}
