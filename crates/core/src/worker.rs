// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker identity, status, and heartbeat records.

use crate::id::{TaskId, WorkerName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted identity of a worker (`workers/<name>/identity.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerIdentity {
    pub name: WorkerName,
    /// Monotone within the team; never reused after removal
    pub index: u32,
    /// Agent type slug (e.g. "executor")
    pub role: String,
    /// Transport slot address, recorded once the slot exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
}

/// Observable state of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Idle,
    Working,
    Blocked,
    Done,
    Failed,
    Draining,
    Unknown,
}

impl WorkerState {
    /// States that satisfy the graceful-shutdown gate.
    pub fn is_inactive(self) -> bool {
        matches!(
            self,
            WorkerState::Idle | WorkerState::Done | WorkerState::Failed
        )
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerState::Idle => write!(f, "idle"),
            WorkerState::Working => write!(f, "working"),
            WorkerState::Blocked => write!(f, "blocked"),
            WorkerState::Done => write!(f, "done"),
            WorkerState::Failed => write!(f, "failed"),
            WorkerState::Draining => write!(f, "draining"),
            WorkerState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Persisted worker status (`workers/<name>/status.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub state: WorkerState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl WorkerStatus {
    pub fn idle(updated_at: DateTime<Utc>) -> Self {
        Self {
            state: WorkerState::Idle,
            current_task_id: None,
            reason: None,
            updated_at,
        }
    }

    pub fn failed(reason: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            state: WorkerState::Failed,
            current_task_id: None,
            reason: Some(reason.into()),
            updated_at,
        }
    }
}

/// Per-worker liveness file (`workers/<name>/heartbeat.json`).
///
/// Created at bootstrap, refreshed on every observed output event, and
/// preserved with `alive = false` after process death until cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heartbeat {
    pub pid: i32,
    pub last_turn_at: DateTime<Utc>,
    pub turn_count: u64,
    pub alive: bool,
}

impl Heartbeat {
    pub fn new(pid: i32, now: DateTime<Utc>) -> Self {
        Self {
            pid,
            last_turn_at: now,
            turn_count: 0,
            alive: true,
        }
    }

    /// Record one observed input/output event from the worker process.
    pub fn record_turn(&mut self, now: DateTime<Utc>) {
        self.turn_count += 1;
        self.last_turn_at = now;
        self.alive = true;
    }

    /// Whether the heartbeat has gone silent for longer than `ceiling_ms`.
    pub fn is_stale(&self, now: DateTime<Utc>, ceiling_ms: u64) -> bool {
        let age = now.signed_duration_since(self.last_turn_at);
        age.num_milliseconds() > ceiling_ms as i64
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
