// src/dag/decomposer.rs

//! Partitioning of a task set into independently executable subgraphs.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::dag::subgraph::Subgraph;
use crate::dag::task::{Task, TaskId};

/// Strategy that turns the full task set into subgraphs.
///
/// The default is [`TerminalDecomposer`]; a pipeline can be given another
/// one with `Pipeline::with_decomposer`.
pub trait Decomposer<T>: Send + Sync {
    fn decompose(&self, tasks: &[Arc<Task<T>>]) -> Vec<Subgraph<T>>;
}

/// One subgraph per terminal task, holding that task and all its ancestors.
///
/// Ranks come from a depth-first walk over predecessor edges starting at the
/// terminal task (rank 1). Every path is walked, and a task reachable through
/// several paths keeps the rank of the *last* visit.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalDecomposer;

impl<T: Send + 'static> Decomposer<T> for TerminalDecomposer {
    fn decompose(&self, tasks: &[Arc<Task<T>>]) -> Vec<Subgraph<T>> {
        let subgraphs: Vec<Subgraph<T>> = tasks
            .iter()
            .filter(|t| t.is_terminal())
            .map(|terminal| {
                let closure = ancestor_closure(terminal);
                Subgraph::new(Arc::clone(terminal), closure)
            })
            .collect();

        info!(
            tasks = tasks.len(),
            subgraphs = subgraphs.len(),
            "task set decomposed"
        );
        subgraphs
    }
}

/// Ancestor closure of `terminal` (terminal included), in discovery order,
/// with each task's final rank.
///
/// The walk recurses once per path, not once per task: cost is exponential in
/// the number of stacked diamonds and stack depth follows the longest chain.
/// Memoising visited tasks would change which visit is last and so the ranks.
pub fn ancestor_closure<T>(terminal: &Arc<Task<T>>) -> Vec<(Arc<Task<T>>, u32)> {
    let mut order: Vec<Arc<Task<T>>> = Vec::new();
    let mut ranks: HashMap<TaskId, u32> = HashMap::new();
    visit(terminal, 0, &mut order, &mut ranks);

    debug!(
        terminal = %terminal.name(),
        members = order.len(),
        "ancestor closure computed"
    );

    order
        .into_iter()
        .map(|task| {
            let rank = ranks.get(&task.id()).copied().unwrap_or(1);
            (task, rank)
        })
        .collect()
}

fn visit<T>(
    task: &Arc<Task<T>>,
    depth: u32,
    order: &mut Vec<Arc<Task<T>>>,
    ranks: &mut HashMap<TaskId, u32>,
) {
    let rank = depth + 1;
    if ranks.insert(task.id(), rank).is_none() {
        order.push(Arc::clone(task));
    }
    for pred in task.predecessors() {
        visit(pred, rank, order, ranks);
    }
}
