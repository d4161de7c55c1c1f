//! Operations and sinks that record what the engine did with them.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use pipedag::errors::OperationError;
use pipedag::exec::Operation;
use pipedag::monitor::{MonitorSnapshot, SnapshotSink};
use pipedag::stream::DataStream;

/// Emits a fixed list of values (ignoring inputs) and counts invocations.
#[derive(Clone)]
pub struct CountingSource {
    values: Vec<i64>,
    calls: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(values: &[i64]) -> Self {
        Self {
            values: values.to_vec(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter; stays valid after the operation is moved into a task.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Operation<i64> for CountingSource {
    fn process(&self, _inputs: Vec<DataStream<i64>>) -> Result<DataStream<i64>, OperationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DataStream::iter(self.values.clone()))
    }
}

/// Element-wise sum of all inputs that counts invocations.
#[derive(Clone, Default)]
pub struct CountingSum {
    calls: Arc<AtomicUsize>,
}

impl CountingSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Operation<i64> for CountingSum {
    fn process(&self, inputs: Vec<DataStream<i64>>) -> Result<DataStream<i64>, OperationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut inputs = inputs.into_iter();
        let first = inputs
            .next()
            .ok_or_else(|| anyhow!("sum needs at least one input"))?;
        Ok(inputs.fold(first, |acc, next| acc.zip_with(&next, |a, b| a + b)))
    }
}

/// Always fails with `message` wrapped under an outer context, so tests can
/// check that only the root cause is reported.
#[derive(Clone)]
pub struct FailingOperation {
    message: String,
    calls: Arc<AtomicUsize>,
}

impl FailingOperation {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Operation<i64> for FailingOperation {
    fn process(&self, _inputs: Vec<DataStream<i64>>) -> Result<DataStream<i64>, OperationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("{}", self.message).context("operation wrapper failed"))
    }
}

/// Snapshot sink that keeps every published snapshot.
#[derive(Clone, Default)]
pub struct RecordingSink {
    snapshots: Arc<Mutex<Vec<MonitorSnapshot>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<MonitorSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<MonitorSnapshot> {
        self.snapshots.lock().unwrap().last().cloned()
    }
}

impl SnapshotSink for RecordingSink {
    fn publish(&self, snapshot: MonitorSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot);
    }
}

/// In-memory writer whose contents stay readable after it is handed to a sink.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
