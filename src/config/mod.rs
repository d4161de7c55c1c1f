// src/config/mod.rs

//! Pipeline definition files.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a definition from disk (`loader.rs`).
//! - Validate references, arities and acyclicity (`validate.rs`).
//! - Turn a validated definition into wired tasks (`build.rs`).

pub mod build;
pub mod loader;
pub mod model;
pub mod validate;

pub use build::build_tasks;
pub use loader::{load_and_validate, load_from_path, parse_str};
pub use model::{ConfigFile, PipelineSection, TaskConfig};
pub use validate::{topological_order, validate_config};
