// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only team event records.

use crate::id::{EventId, MessageId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TaskCompleted,
    WorkerIdle,
    WorkerStopped,
    MessageReceived,
    ShutdownAck,
    ApprovalDecision,
    TeamLeaderNudge,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::TaskCompleted => write!(f, "task_completed"),
            EventKind::WorkerIdle => write!(f, "worker_idle"),
            EventKind::WorkerStopped => write!(f, "worker_stopped"),
            EventKind::MessageReceived => write!(f, "message_received"),
            EventKind::ShutdownAck => write!(f, "shutdown_ack"),
            EventKind::ApprovalDecision => write!(f, "approval_decision"),
            EventKind::TeamLeaderNudge => write!(f, "team_leader_nudge"),
        }
    }
}

/// One line in `events.ndjson`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamEvent {
    pub event_id: EventId,
    pub team: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TeamEvent {
    pub fn new(
        event_id: EventId,
        team: impl Into<String>,
        kind: EventKind,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id,
            team: team.into(),
            kind,
            worker: None,
            task_id: None,
            message_id: None,
            reason: None,
            created_at,
        }
    }

    pub fn with_worker(mut self, worker: impl Into<String>) -> Self {
        self.worker = Some(worker.into());
        self
    }

    pub fn with_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    pub fn with_message(mut self, message_id: MessageId) -> Self {
        self.message_id = Some(message_id);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
