// tests/property_decomposer.rs

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use proptest::prelude::*;
use pipedag::dag::{Decomposer, Task, TerminalDecomposer};
use pipedag::engine::Pipeline;
use pipedag::exec::BuiltinOperation;

// Acyclic by construction: task N may only depend on tasks 0..N-1.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..4),
            num_tasks,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, potential)| {
                    let deps: BTreeSet<usize> = if i == 0 {
                        BTreeSet::new()
                    } else {
                        potential.into_iter().map(|d| d % i).collect()
                    };
                    deps.into_iter().collect()
                })
                .collect()
        })
    })
}

/// Sources emit `[1]`, every other task sums its inputs. The single output
/// element of a task therefore counts the source-to-task paths.
fn build(deps: &[Vec<usize>]) -> Vec<Arc<Task<i64>>> {
    let mut tasks: Vec<Arc<Task<i64>>> = Vec::with_capacity(deps.len());
    for (i, preds) in deps.iter().enumerate() {
        let name = format!("t{i:02}");
        let predecessors: Vec<_> = preds.iter().map(|&p| Arc::clone(&tasks[p])).collect();
        let task = if predecessors.is_empty() {
            Task::new(name, BuiltinOperation::Just { values: vec![1] }, predecessors)
        } else {
            Task::new(name, BuiltinOperation::Sum, predecessors)
        }
        .expect("generated task should build");
        tasks.push(task);
    }
    tasks
}

fn ancestors(deps: &[Vec<usize>], of: usize, acc: &mut HashSet<usize>) {
    if acc.insert(of) {
        for &p in &deps[of] {
            ancestors(deps, p, acc);
        }
    }
}

fn paths(deps: &[Vec<usize>], of: usize) -> i64 {
    if deps[of].is_empty() {
        1
    } else {
        deps[of].iter().map(|&p| paths(deps, p)).sum()
    }
}

fn terminals(deps: &[Vec<usize>]) -> Vec<usize> {
    (0..deps.len())
        .filter(|&i| !deps.iter().any(|d| d.contains(&i)))
        .collect()
}

proptest! {
    #[test]
    fn one_subgraph_per_terminal_holding_its_ancestors(deps in dag_strategy(10)) {
        let tasks = build(&deps);
        let subgraphs = TerminalDecomposer.decompose(&tasks);
        let terminal_ids = terminals(&deps);

        prop_assert_eq!(subgraphs.len(), terminal_ids.len());

        for (sg, &t) in subgraphs.iter().zip(terminal_ids.iter()) {
            prop_assert_eq!(sg.ending_task().name(), tasks[t].name());

            let mut expected = HashSet::new();
            ancestors(&deps, t, &mut expected);
            let members: HashSet<usize> = (0..tasks.len())
                .filter(|&i| sg.contains(&tasks[i]))
                .collect();
            prop_assert_eq!(members, expected);

            prop_assert_eq!(sg.run_of(&tasks[t]).map(|r| r.monitor().rank()), Some(1));
            for run in sg.runs() {
                prop_assert!(run.monitor().rank() >= 1);
            }
        }
    }

    #[test]
    fn every_subgraph_resolves_to_its_path_count(deps in dag_strategy(8)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");

        let tasks = build(&deps);
        let pipeline = Pipeline::new("prop", tasks.clone()).expect("pipeline");

        let results = runtime.block_on(async {
            let mut out = Vec::new();
            for (_, handle) in pipeline.execute().expect("execute") {
                let name = handle.subgraph().to_string();
                out.push((name, handle.await.expect("subgraph succeeds")));
            }
            out
        });

        prop_assert_eq!(results.len(), terminals(&deps).len());
        for t in terminals(&deps) {
            let sg = pipeline
                .subgraphs()
                .into_iter()
                .find(|s| s.ending_task().name() == tasks[t].name())
                .expect("subgraph for terminal");
            let (_, items) = results
                .iter()
                .find(|(name, _)| name == sg.name())
                .expect("result for subgraph");
            prop_assert_eq!(items, &vec![paths(&deps, t)]);
        }
    }
}
