// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `pipedag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pipedag",
    version,
    about = "Run a DAG of stream-processing tasks, one concurrent subgraph per terminal task.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline file (TOML).
    ///
    /// Default: `Pipeline.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Pipeline.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PIPEDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the tasks and their subgraphs, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Write a JSON monitor snapshot to stdout after every state change.
    #[arg(long)]
    pub snapshots: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
