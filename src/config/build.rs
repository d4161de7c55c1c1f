// src/config/build.rs

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::model::ConfigFile;
use crate::config::validate::topological_order;
use crate::dag::Task;
use crate::errors::{PipelineError, Result};

/// Construct the tasks described by `cfg`.
///
/// Tasks are created in topological order so each one can be wired below
/// its already-built predecessors. The order of `after` becomes the order of
/// the operation's input streams. Expects a validated file.
pub fn build_tasks(cfg: &ConfigFile) -> Result<Vec<Arc<Task<i64>>>> {
    let order = topological_order(cfg)?;
    let mut built: HashMap<&str, Arc<Task<i64>>> = HashMap::with_capacity(order.len());
    let mut tasks = Vec::with_capacity(order.len());

    for name in order {
        let task_cfg = cfg.task.get(name).ok_or_else(|| {
            PipelineError::Configuration(format!("task '{name}' disappeared from the pipeline file"))
        })?;

        let predecessors = task_cfg
            .after
            .iter()
            .map(|dep| {
                built.get(dep.as_str()).cloned().ok_or_else(|| {
                    PipelineError::Configuration(format!(
                        "task '{name}' has unknown dependency '{dep}' in `after`"
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let task = Task::new(name, task_cfg.op.clone(), predecessors)?;
        debug!(task = %name, op = %task_cfg.op, "task built from pipeline file");

        built.insert(name, Arc::clone(&task));
        tasks.push(task);
    }

    Ok(tasks)
}
