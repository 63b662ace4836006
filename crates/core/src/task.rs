// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task records and the claim lease.

use crate::id::{TaskId, WorkerName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a task through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Blocked,
}

impl TaskStatus {
    /// Completed and failed tasks never leave their state through normal
    /// worker operations (only an administrative `update` can).
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Blocked => write!(f, "blocked"),
        }
    }
}

/// A leased reservation of a task by a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskClaim {
    pub token: String,
    pub worker: WorkerName,
    pub acquired_at: DateTime<Utc>,
    pub lease_expires_at: DateTime<Utc>,
}

impl TaskClaim {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.lease_expires_at < now
    }
}

/// A unit of work distributed to the team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub subject: String,
    pub description: String,
    pub status: TaskStatus,
    /// Hint that completing this task is expected to modify the codebase
    #[serde(default)]
    pub requires_code_change: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<WorkerName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<TaskId>,
    /// Optimistic-concurrency token; bumps on every persisted mutation
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim: Option<TaskClaim>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(
        id: TaskId,
        subject: impl Into<String>,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            subject: subject.into(),
            description: description.into(),
            status: TaskStatus::Pending,
            requires_code_change: false,
            owner: None,
            result: None,
            error: None,
            depends_on: Vec::new(),
            version: 1,
            claim: None,
            created_at,
            completed_at: None,
        }
    }

    pub fn with_depends_on(mut self, deps: Vec<TaskId>) -> Self {
        self.depends_on = deps;
        self
    }

    pub fn with_requires_code_change(mut self, requires: bool) -> Self {
        self.requires_code_change = requires;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Invariant check: a task holds a claim iff it is in progress.
    pub fn claim_is_consistent(&self) -> bool {
        (self.status == TaskStatus::InProgress) == self.claim.is_some()
    }

    /// Whether a worker-driven transition from the current status to
    /// `target` is legal. Administrative corrections bypass this.
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self.status, target),
            (Pending, InProgress)
                | (InProgress, Completed)
                | (InProgress, Failed)
                | (InProgress, Pending)
                | (Pending, Blocked)
                | (InProgress, Blocked)
        )
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
