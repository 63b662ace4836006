// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scaling history and monitor snapshot persistence.

use crate::atomic::{read_json, write_json_atomic, StoreError};
use crate::paths::TeamPaths;
use omx_core::{MonitorSnapshot, ScalingEvent};

/// FIFO eviction bound for `scaling-history.json`.
pub const SCALING_HISTORY_CAP: usize = 100;

/// Append-only-with-eviction scaling event log.
#[derive(Clone)]
pub struct ScalingHistory {
    paths: TeamPaths,
}

impl ScalingHistory {
    pub fn new(paths: TeamPaths) -> Self {
        Self { paths }
    }

    pub fn append(&self, event: ScalingEvent) -> Result<(), StoreError> {
        let mut events = self.read();
        events.push(event);
        if events.len() > SCALING_HISTORY_CAP {
            let excess = events.len() - SCALING_HISTORY_CAP;
            events.drain(..excess);
        }
        write_json_atomic(&self.paths.scaling_history(), &events)
    }

    pub fn read(&self) -> Vec<ScalingEvent> {
        read_json(&self.paths.scaling_history()).unwrap_or_default()
    }

    /// Most recent applied scale action (recommendations don't count for
    /// cooldown).
    pub fn last_applied(&self) -> Option<ScalingEvent> {
        self.read()
            .into_iter()
            .rev()
            .find(|e| !matches!(e.action, omx_core::ScalingAction::Recommendation))
    }
}

/// `monitor.snapshot.json` persistence.
#[derive(Clone)]
pub struct SnapshotStore {
    paths: TeamPaths,
}

impl SnapshotStore {
    pub fn new(paths: TeamPaths) -> Self {
        Self { paths }
    }

    pub fn write(&self, snapshot: &MonitorSnapshot) -> Result<(), StoreError> {
        write_json_atomic(&self.paths.monitor_snapshot(), snapshot)
    }

    pub fn read(&self) -> Option<MonitorSnapshot> {
        read_json(&self.paths.monitor_snapshot())
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
