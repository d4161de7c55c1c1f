// src/config/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::ConfigFile;
use crate::errors::{PipelineError, Result};

/// Run semantic validation against a loaded pipeline file.
///
/// This checks:
/// - the pipeline is named and has at least one task
/// - every `after` entry refers to another existing task, at most once
/// - every operation is fed a number of inputs it accepts
/// - the task graph has no cycles
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_pipeline_section(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_arity(cfg)?;
    topological_order(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &ConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(PipelineError::Configuration(
            "pipeline file must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_pipeline_section(cfg: &ConfigFile) -> Result<()> {
    if cfg.pipeline.name.trim().is_empty() {
        return Err(PipelineError::Configuration(
            "[pipeline].name must not be blank".to_string(),
        ));
    }
    if let Some(name) = cfg.task.keys().find(|name| name.trim().is_empty()) {
        return Err(PipelineError::Configuration(format!(
            "task name {name:?} must not be blank"
        )));
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &ConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        let mut seen = HashSet::new();
        for dep in task.after.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(PipelineError::Configuration(format!(
                    "task '{name}' has unknown dependency '{dep}' in `after`"
                )));
            }
            if dep == name {
                return Err(PipelineError::Configuration(format!(
                    "task '{name}' cannot depend on itself in `after`"
                )));
            }
            if !seen.insert(dep.as_str()) {
                return Err(PipelineError::Configuration(format!(
                    "task '{name}' lists '{dep}' more than once in `after`"
                )));
            }
        }
    }
    Ok(())
}

fn validate_arity(cfg: &ConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if !task.op.accepts_inputs(task.after.len()) {
            return Err(PipelineError::Configuration(format!(
                "task '{}': operation '{}' cannot take {} input(s)",
                name,
                task.op.kind(),
                task.after.len()
            )));
        }
    }
    Ok(())
}

/// Task names ordered so that every task comes after all of its `after`
/// entries.
///
/// Edge direction is dep -> task: `[task.B] after = ["A"]` adds A -> B.
pub fn topological_order(cfg: &ConfigFile) -> Result<Vec<&str>> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    toposort(&graph, None).map_err(|cycle| {
        PipelineError::DagCycle(format!(
            "cycle detected in task graph involving task '{}'",
            cycle.node_id()
        ))
    })
}
