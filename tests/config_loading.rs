// tests/config_loading.rs

mod common;

use std::io::Write;

use common::{TestResult, init_tracing, with_timeout};
use pipedag::config::{build_tasks, load_and_validate, parse_str, validate_config};
use pipedag::engine::Pipeline;
use pipedag::errors::PipelineError;
use pipedag::exec::BuiltinOperation;
use pipedag_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> Result<NamedTempFile, std::io::Error> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{contents}")?;
    Ok(file)
}

#[tokio::test]
async fn diamond_file_runs_end_to_end() -> TestResult {
    init_tracing();

    let file = write_config(
        r#"
[pipeline]
name = "diamond"

[task.A]
op = { kind = "just", values = [1, 2, 3] }

[task.B]
op = { kind = "repeat", value = 1, count = 3 }

[task.C]
op = { kind = "repeat", value = 1, count = 3 }

[task.D]
op = { kind = "sum" }
after = ["A", "B"]

[task.E]
op = { kind = "sum" }
after = ["B", "C"]

[task.F]
op = { kind = "sum" }
after = ["D", "E"]
"#,
    )?;

    let cfg = load_and_validate(file.path())?;
    assert_eq!(cfg.pipeline.name, "diamond");
    assert_eq!(cfg.task.len(), 6);

    let tasks = build_tasks(&cfg)?;
    let pipeline = Pipeline::new(cfg.pipeline.name.clone(), tasks)?;
    let mut handles = pipeline.execute()?;
    let out = with_timeout(handles.remove("A,B,C,D,E,F").expect("one subgraph")).await?;
    assert_eq!(out, vec![4, 5, 6]);
    Ok(())
}

#[tokio::test]
async fn after_order_is_input_order() -> TestResult {
    let cfg = parse_str(
        r#"
[task.first]
op = { kind = "just", values = [1] }

[task.second]
op = { kind = "just", values = [2] }

[task.joined]
op = { kind = "concat" }
after = ["second", "first"]
"#,
    )?;
    validate_config(&cfg)?;

    let tasks = build_tasks(&cfg)?;
    let joined = tasks
        .iter()
        .find(|t| t.name() == "joined")
        .expect("joined task built");
    let preds: Vec<&str> = joined.predecessors().iter().map(|p| p.name()).collect();
    assert_eq!(preds, vec!["second", "first"]);

    let pipeline = Pipeline::new(cfg.pipeline.name.clone(), tasks)?;
    assert_eq!(pipeline.name(), "pipeline");
    for (_, handle) in pipeline.execute()? {
        assert_eq!(with_timeout(handle).await?, vec![2, 1]);
    }
    Ok(())
}

#[test]
fn dag_cycle_returns_structured_error() -> TestResult {
    let file = write_config(
        r#"
[task.A]
op = { kind = "sum" }
after = ["B"]

[task.B]
op = { kind = "sum" }
after = ["A"]
"#,
    )?;

    match load_and_validate(file.path()) {
        Err(PipelineError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains('A') || msg.contains('B'));
        }
        other => panic!("Expected DagCycle error, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn unknown_dependency_returns_config_error() -> TestResult {
    let file = write_config(
        r#"
[task.A]
op = { kind = "scale", factor = 2 }
after = ["NonExistent"]
"#,
    )?;

    match load_and_validate(file.path()) {
        Err(PipelineError::Configuration(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("NonExistent"));
        }
        other => panic!("Expected Configuration error, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn self_and_duplicate_dependencies_are_rejected() -> TestResult {
    let self_dep = ConfigFileBuilder::new()
        .with_task("A", TaskConfigBuilder::sum().after("A").build())
        .build();
    match validate_config(&self_dep) {
        Err(PipelineError::Configuration(msg)) => assert!(msg.contains("itself")),
        other => panic!("Expected Configuration error, got: {other:?}"),
    }

    let duplicate = ConfigFileBuilder::new()
        .with_task("A", TaskConfigBuilder::range(0, 3).build())
        .with_task("B", TaskConfigBuilder::sum().after("A").after("A").build())
        .build();
    match validate_config(&duplicate) {
        Err(PipelineError::Configuration(msg)) => assert!(msg.contains("more than once")),
        other => panic!("Expected Configuration error, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn empty_pipeline_is_rejected() -> TestResult {
    let cfg = ConfigFileBuilder::new().named("empty").build();
    assert!(matches!(
        validate_config(&cfg),
        Err(PipelineError::Configuration(_))
    ));
    Ok(())
}

#[test]
fn operation_arity_is_checked() -> TestResult {
    let source_with_input = ConfigFileBuilder::new()
        .with_task("A", TaskConfigBuilder::range(0, 2).build())
        .with_task("B", TaskConfigBuilder::just(&[1]).after("A").build())
        .build();
    match validate_config(&source_with_input) {
        Err(PipelineError::Configuration(msg)) => {
            assert!(msg.contains("'B'"));
            assert!(msg.contains("just"));
        }
        other => panic!("Expected Configuration error, got: {other:?}"),
    }

    let sum_without_input = ConfigFileBuilder::new()
        .with_task("S", TaskConfigBuilder::sum().build())
        .build();
    assert!(validate_config(&sum_without_input).is_err());
    Ok(())
}

#[test]
fn unknown_operation_kind_is_a_toml_error() -> TestResult {
    let result = parse_str(
        r#"
[task.A]
op = { kind = "teleport" }
"#,
    );
    assert!(matches!(result, Err(PipelineError::Toml(_))));
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() -> TestResult {
    let dir = tempfile::tempdir()?;
    let result = load_and_validate(dir.path().join("Pipeline.toml"));
    assert!(matches!(result, Err(PipelineError::Io(_))));
    Ok(())
}

#[test]
fn operations_deserialize_with_their_parameters() -> TestResult {
    let cfg = parse_str(
        r#"
[task.src]
op = { kind = "range", start = -2, count = 4 }

[task.shift]
op = { kind = "offset", delta = 10 }
after = ["src"]

[task.oops]
op = { kind = "fail", message = "nope" }
"#,
    )?;

    assert_eq!(
        cfg.task["src"].op,
        BuiltinOperation::Range { start: -2, count: 4 }
    );
    assert_eq!(cfg.task["shift"].op, BuiltinOperation::Offset { delta: 10 });
    assert_eq!(
        cfg.task["oops"].op,
        BuiltinOperation::Fail {
            message: "nope".to_string()
        }
    );
    assert_eq!(cfg.task["shift"].after, vec!["src".to_string()]);
    Ok(())
}
