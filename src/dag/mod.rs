// src/dag/mod.rs

//! Task graph model, decomposition and subgraph execution.
//!
//! - [`task`] holds task nodes and their predecessor/successor wiring.
//! - [`run`] holds the per-subgraph execution state of a task (input slots,
//!   monitor).
//! - [`decomposer`] partitions a task set into subgraphs.
//! - [`subgraph`] contains the staged execution engine.

pub mod decomposer;
pub mod run;
pub mod subgraph;
pub mod task;

pub use decomposer::{Decomposer, TerminalDecomposer, ancestor_closure};
pub use run::{InputSlots, TaskRun};
pub use subgraph::Subgraph;
pub use task::{Task, TaskBuilder, TaskId};
