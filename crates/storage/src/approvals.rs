// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan approval decisions (`approvals/<task_id>.json`).
//!
//! Written by the leader when the team policy requires plan approval;
//! the monitor surfaces fresh decisions as `approval_decision` events.

use crate::atomic::{read_json, write_json_atomic, StoreError};
use crate::paths::TeamPaths;
use chrono::{DateTime, Utc};
use omx_core::TaskId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub task_id: TaskId,
    pub decision: ApprovalDecision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub decided_by: String,
    pub decided_at: DateTime<Utc>,
    /// Set once the monitor has emitted the matching event
    #[serde(default)]
    pub announced: bool,
}

#[derive(Clone)]
pub struct ApprovalStore {
    paths: TeamPaths,
}

impl ApprovalStore {
    pub fn new(paths: TeamPaths) -> Self {
        Self { paths }
    }

    pub fn write(&self, record: &ApprovalRecord) -> Result<(), StoreError> {
        write_json_atomic(&self.paths.approval(&record.task_id), record)
    }

    pub fn read(&self, task_id: &TaskId) -> Option<ApprovalRecord> {
        read_json(&self.paths.approval(task_id))
    }

    /// Decisions the monitor has not yet surfaced.
    pub fn unannounced(&self) -> Vec<ApprovalRecord> {
        let Ok(entries) = std::fs::read_dir(self.paths.approvals_dir()) else {
            return Vec::new();
        };
        let mut records: Vec<ApprovalRecord> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| read_json(&e.path()))
            .filter(|r: &ApprovalRecord| !r.announced)
            .collect();
        records.sort_by(|a, b| a.decided_at.cmp(&b.decided_at));
        records
    }

    /// Flip the announced flag after the event is written.
    pub fn mark_announced(&self, task_id: &TaskId) -> Result<bool, StoreError> {
        let Some(mut record) = self.read(task_id) else {
            return Ok(false);
        };
        if record.announced {
            return Ok(false);
        }
        record.announced = true;
        self.write(&record)?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "approvals_tests.rs"]
mod tests;
