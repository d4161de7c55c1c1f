// src/exec/mod.rs

//! Operation layer.
//!
//! - [`operation`] defines the `Operation` capability that every task wraps.
//! - [`builtin`] provides the integer operations available to TOML pipelines.

pub mod builtin;
pub mod operation;

pub use builtin::BuiltinOperation;
pub use operation::{Operation, SharedOperation, operation_fn};
