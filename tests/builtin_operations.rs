// tests/builtin_operations.rs

use std::error::Error;

use futures::StreamExt;
use pipedag::exec::{BuiltinOperation, Operation};
use pipedag::stream::DataStream;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn repeat_is_produced_on_demand() -> TestResult {
    let op = BuiltinOperation::Repeat {
        value: 7,
        count: u64::MAX >> 1,
    };

    let stream = op.process(vec![])?;
    let head: Vec<i64> = stream.subscribe().take(3).collect().await;
    assert_eq!(head, vec![7, 7, 7]);
    Ok(())
}

#[tokio::test]
async fn repeat_yields_exactly_count_items_per_subscription() -> TestResult {
    let stream = BuiltinOperation::Repeat { value: -1, count: 4 }.process(vec![])?;
    assert_eq!(stream.collect().await, vec![-1, -1, -1, -1]);
    assert_eq!(stream.collect().await, vec![-1, -1, -1, -1]);
    Ok(())
}

#[tokio::test]
async fn sum_stops_at_shortest_input() -> TestResult {
    let out = BuiltinOperation::Sum.process(vec![
        DataStream::iter(vec![1, 2, 3]),
        DataStream::iter(vec![10, 20]),
    ])?;
    assert_eq!(out.collect().await, vec![11, 22]);
    Ok(())
}

#[test]
fn scale_rejects_wrong_input_count() {
    let err = BuiltinOperation::Scale { factor: 2 }
        .process(vec![])
        .expect_err("scale needs one input");
    assert!(err.to_string().contains("exactly one input"));
}
