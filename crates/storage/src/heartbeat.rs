// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat file CRUD (`workers/<name>/heartbeat.json`).

use crate::atomic::{read_json, write_json_atomic, StoreError};
use crate::paths::TeamPaths;
use chrono::{DateTime, Utc};
use omx_core::{Heartbeat, WorkerName};

#[derive(Clone)]
pub struct HeartbeatStore {
    paths: TeamPaths,
}

impl HeartbeatStore {
    pub fn new(paths: TeamPaths) -> Self {
        Self { paths }
    }

    pub fn write(&self, worker: &WorkerName, heartbeat: &Heartbeat) -> Result<(), StoreError> {
        write_json_atomic(&self.paths.worker_heartbeat(worker), heartbeat)
    }

    pub fn read(&self, worker: &WorkerName) -> Option<Heartbeat> {
        read_json(&self.paths.worker_heartbeat(worker))
    }

    /// Record one observed output event. A missing heartbeat file is left
    /// missing; turns only count for bootstrapped workers.
    pub fn record_turn(&self, worker: &WorkerName, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let Some(mut heartbeat) = self.read(worker) else {
            return Ok(false);
        };
        heartbeat.record_turn(now);
        self.write(worker, &heartbeat)?;
        Ok(true)
    }

    /// Flip `alive` off, preserving the rest of the record for
    /// post-mortem reporting. Kept until cleanup removes the subtree.
    pub fn mark_dead(&self, worker: &WorkerName) -> Result<bool, StoreError> {
        let Some(mut heartbeat) = self.read(worker) else {
            return Ok(false);
        };
        if !heartbeat.alive {
            return Ok(false);
        }
        heartbeat.alive = false;
        self.write(worker, &heartbeat)?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
