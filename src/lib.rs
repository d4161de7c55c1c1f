// src/lib.rs

//! Concurrent execution of a DAG of stream-processing tasks.
//!
//! A [`Task`] wraps an [`Operation`] that turns its predecessors' lazy
//! [`DataStream`]s into one output stream. A [`Pipeline`] splits its tasks
//! into one [`Subgraph`] per terminal task and runs every subgraph on its own
//! Tokio task; each returned [`CompletionHandle`] resolves to the elements of
//! that subgraph's terminal stream.

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod monitor;
pub mod stream;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, build_tasks, load_and_validate};

pub use crate::dag::{Decomposer, Subgraph, Task, TaskBuilder, TerminalDecomposer};
pub use crate::engine::{CompletionHandle, Pipeline};
pub use crate::errors::{OperationError, PipelineError, TaskExecutionError};
pub use crate::exec::{BuiltinOperation, Operation, operation_fn};
pub use crate::monitor::{
    EntityKind, JsonLinesSink, Monitor, MonitorSnapshot, Notifier, SnapshotSink, Status,
};
pub use crate::stream::DataStream;

/// High-level entry point used by `main.rs`.
///
/// Loads the pipeline file, builds its tasks, executes the pipeline and waits
/// for every subgraph. Results are printed one line per subgraph unless
/// `--snapshots` is set, in which case stdout carries the snapshots only.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("failed to load pipeline file {}", config_path.display()))?;

    if args.dry_run {
        print_dry_run(&cfg)?;
        return Ok(());
    }

    let tasks = build_tasks(&cfg)?;
    let mut pipeline = Pipeline::new(cfg.pipeline.name.clone(), tasks)?;
    if args.snapshots {
        pipeline = pipeline.with_sink(JsonLinesSink::stdout());
    }

    let mut handles: Vec<_> = pipeline.execute()?.into_iter().collect();
    handles.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut failed = 0usize;
    for (name, handle) in handles {
        match handle.await {
            Ok(items) => {
                info!(subgraph = %name, items = items.len(), "subgraph completed");
                if !args.snapshots {
                    println!("{name}: {items:?}");
                }
            }
            Err(err) => {
                error!(subgraph = %name, error = %err, "subgraph failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} subgraph(s) of pipeline '{}' failed", pipeline.name());
    }
    Ok(())
}

/// Print the tasks and the subgraph each terminal task would run.
fn print_dry_run(cfg: &ConfigFile) -> Result<()> {
    println!("pipedag dry-run");
    println!("  pipeline.name = {}", cfg.pipeline.name);
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        println!("      op: {}", task.op);
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
    }

    let tasks = build_tasks(cfg)?;
    let subgraphs = TerminalDecomposer.decompose(&tasks);
    println!();
    println!("subgraphs ({}):", subgraphs.len());
    for subgraph in &subgraphs {
        println!("  - {} (ends at {})", subgraph.name(), subgraph.ending_task().name());
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
