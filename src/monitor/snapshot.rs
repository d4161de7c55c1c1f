// src/monitor/snapshot.rs

//! Nested, read-only projection of monitor state for external observers.
//!
//! Shape: pipeline -> its subgraphs -> their task runs. This is the only
//! contract exporters rely on; the wire format is up to them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::monitor::{EntityKind, Monitor, Status};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorSnapshot {
    pub id: Uuid,
    pub name: String,
    pub kind: EntityKind,
    pub status: Status,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub rank: u32,
    pub children: Vec<MonitorSnapshot>,
}

impl MonitorSnapshot {
    pub fn capture(name: &str, monitor: &Monitor, children: Vec<MonitorSnapshot>) -> Self {
        Self {
            id: monitor.id(),
            name: name.to_string(),
            kind: monitor.kind(),
            status: monitor.status(),
            start_time: monitor.start_time(),
            end_time: monitor.end_time(),
            duration_ms: monitor.duration_ms(),
            rank: monitor.rank(),
            children,
        }
    }

    /// Depth-first search for a descendant (or self) by name.
    pub fn find(&self, name: &str) -> Option<&MonitorSnapshot> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }
}
