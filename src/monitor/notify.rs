// src/monitor/notify.rs

//! State-change notification boundary.
//!
//! Tasks, subgraphs and the pipeline call [`Notifier::notify_state_change`]
//! right after every monitor transition. The notifier is handed to them as an
//! explicit execution argument; there is no process-wide broadcaster.
//!
//! The pipeline's own notifier captures a [`MonitorSnapshot`] of the whole
//! tree and forwards it to a [`SnapshotSink`].

use std::io::Write;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::warn;

use crate::monitor::{MonitorSnapshot, lock};

/// Invoked synchronously after each monitor transition. No payload: the
/// observer reads the current state itself.
pub trait Notifier: Send + Sync {
    fn notify_state_change(&self);
}

/// Notifier that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify_state_change(&self) {}
}

/// Receives full pipeline snapshots.
pub trait SnapshotSink: Send + Sync {
    fn publish(&self, snapshot: MonitorSnapshot);
}

impl SnapshotSink for mpsc::UnboundedSender<MonitorSnapshot> {
    fn publish(&self, snapshot: MonitorSnapshot) {
        // Receiver gone means nobody is observing anymore.
        let _ = self.send(snapshot);
    }
}

/// Writes one JSON document per snapshot, newline separated.
pub struct JsonLinesSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl SnapshotSink for JsonLinesSink {
    fn publish(&self, snapshot: MonitorSnapshot) {
        let line = match serde_json::to_string(&snapshot) {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "failed to serialise snapshot");
                return;
            }
        };

        let mut writer = lock(&self.writer);
        if let Err(err) = writeln!(writer, "{line}").and_then(|_| writer.flush()) {
            warn!(error = %err, "failed to write snapshot");
        }
    }
}
