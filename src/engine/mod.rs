// src/engine/mod.rs

//! Orchestration engine.
//!
//! The [`Pipeline`] owns the task set, runs the decomposer and dispatches one
//! Tokio task per subgraph; each dispatch yields a [`CompletionHandle`].

pub mod handle;
pub mod pipeline;

pub use handle::CompletionHandle;
pub use pipeline::Pipeline;
