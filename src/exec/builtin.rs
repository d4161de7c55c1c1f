// src/exec/builtin.rs

//! Built-in integer operations, selectable from a pipeline file:
//!
//! ```toml
//! [task.A]
//! op = { kind = "range", start = 1, count = 3 }
//!
//! [task.D]
//! op = { kind = "sum" }
//! after = ["A", "B"]
//! ```

use std::fmt;

use anyhow::{anyhow, bail};
use futures::stream::{self, StreamExt};
use serde::Deserialize;

use crate::errors::OperationError;
use crate::exec::Operation;
use crate::stream::DataStream;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuiltinOperation {
    /// `count` consecutive integers starting at `start`.
    Range { start: i64, count: u64 },
    /// Fixed list of values.
    Just { values: Vec<i64> },
    /// `value`, `count` times.
    Repeat { value: i64, count: u64 },
    /// Element-wise sum of all inputs (shortest input wins).
    Sum,
    /// Element-wise product of all inputs (shortest input wins).
    Product,
    /// Inputs one after the other, in `after` order.
    Concat,
    /// Multiply every element of the single input.
    Scale { factor: i64 },
    /// Add `delta` to every element of the single input.
    Offset { delta: i64 },
    /// Always fails with `message`.
    Fail { message: String },
}

impl BuiltinOperation {
    pub fn kind(&self) -> &'static str {
        match self {
            BuiltinOperation::Range { .. } => "range",
            BuiltinOperation::Just { .. } => "just",
            BuiltinOperation::Repeat { .. } => "repeat",
            BuiltinOperation::Sum => "sum",
            BuiltinOperation::Product => "product",
            BuiltinOperation::Concat => "concat",
            BuiltinOperation::Scale { .. } => "scale",
            BuiltinOperation::Offset { .. } => "offset",
            BuiltinOperation::Fail { .. } => "fail",
        }
    }

    /// Whether this operation can be fed `count` input streams.
    pub fn accepts_inputs(&self, count: usize) -> bool {
        match self {
            BuiltinOperation::Range { .. }
            | BuiltinOperation::Just { .. }
            | BuiltinOperation::Repeat { .. } => count == 0,
            BuiltinOperation::Sum | BuiltinOperation::Product | BuiltinOperation::Concat => {
                count >= 1
            }
            BuiltinOperation::Scale { .. } | BuiltinOperation::Offset { .. } => count == 1,
            BuiltinOperation::Fail { .. } => true,
        }
    }

    fn single_input(&self, inputs: Vec<DataStream<i64>>) -> Result<DataStream<i64>, OperationError> {
        let count = inputs.len();
        let mut inputs = inputs.into_iter();
        match (inputs.next(), inputs.next()) {
            (Some(input), None) => Ok(input),
            _ => bail!("{} expects exactly one input, got {}", self.kind(), count),
        }
    }

    fn fold_inputs(
        &self,
        inputs: Vec<DataStream<i64>>,
        combine: fn(i64, i64) -> i64,
    ) -> Result<DataStream<i64>, OperationError> {
        let mut inputs = inputs.into_iter();
        let first = inputs
            .next()
            .ok_or_else(|| anyhow!("{} expects at least one input", self.kind()))?;
        Ok(inputs.fold(first, |acc, next| acc.zip_with(&next, combine)))
    }
}

impl Operation<i64> for BuiltinOperation {
    fn process(&self, inputs: Vec<DataStream<i64>>) -> Result<DataStream<i64>, OperationError> {
        match self {
            BuiltinOperation::Range { start, count } => {
                let start = *start;
                let end = start
                    .checked_add_unsigned(*count)
                    .ok_or_else(|| anyhow!("range {start}+{count} overflows i64"))?;
                Ok(DataStream::iter(start..end))
            }
            BuiltinOperation::Just { values } => Ok(DataStream::iter(values.clone())),
            BuiltinOperation::Repeat { value, count } => {
                let value = *value;
                let count = usize::try_from(*count)?;
                Ok(DataStream::from_fn(move || stream::repeat(value).take(count)))
            }
            BuiltinOperation::Sum => self.fold_inputs(inputs, |a, b| a.wrapping_add(b)),
            BuiltinOperation::Product => self.fold_inputs(inputs, |a, b| a.wrapping_mul(b)),
            BuiltinOperation::Concat => {
                let mut inputs = inputs.into_iter();
                let first = inputs
                    .next()
                    .ok_or_else(|| anyhow!("concat expects at least one input"))?;
                Ok(inputs.fold(first, |acc, next| acc.chain(&next)))
            }
            BuiltinOperation::Scale { factor } => {
                let factor = *factor;
                Ok(self.single_input(inputs)?.map(move |x| x.wrapping_mul(factor)))
            }
            BuiltinOperation::Offset { delta } => {
                let delta = *delta;
                Ok(self.single_input(inputs)?.map(move |x| x.wrapping_add(delta)))
            }
            BuiltinOperation::Fail { message } => Err(anyhow!("{message}")),
        }
    }
}

impl fmt::Display for BuiltinOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuiltinOperation::Range { start, count } => write!(f, "range(start={start}, count={count})"),
            BuiltinOperation::Just { values } => write!(f, "just({values:?})"),
            BuiltinOperation::Repeat { value, count } => write!(f, "repeat(value={value}, count={count})"),
            BuiltinOperation::Scale { factor } => write!(f, "scale(factor={factor})"),
            BuiltinOperation::Offset { delta } => write!(f, "offset(delta={delta})"),
            BuiltinOperation::Fail { message } => write!(f, "fail({message:?})"),
            other => f.write_str(other.kind()),
        }
    }
}
