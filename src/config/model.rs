// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::exec::BuiltinOperation;

/// Top-level pipeline definition as read from a TOML file.
///
/// ```toml
/// [pipeline]
/// name = "sums"
///
/// [task.A]
/// op = { kind = "range", start = 1, count = 3 }
///
/// [task.B]
/// op = { kind = "repeat", value = 1, count = 3 }
///
/// [task.D]
/// op = { kind = "sum" }
/// after = ["A", "B"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// `[pipeline]` section.
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    #[serde(default = "default_pipeline_name")]
    pub name: String,
}

fn default_pipeline_name() -> String {
    "pipeline".to_string()
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            name: default_pipeline_name(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Operation wrapped by the task.
    pub op: BuiltinOperation,

    /// Producers feeding this task. The order here is the order in which
    /// their streams are passed to `op`.
    #[serde(default)]
    pub after: Vec<String>,
}
