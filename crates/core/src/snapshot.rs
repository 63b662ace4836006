// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The monitor's most recent reconciled view of a team.

use crate::id::WorkerName;
use crate::phase::{PhaseTransition, TeamPhase};
use crate::scaling::Recommendation;
use crate::task::{Task, TaskStatus};
use crate::worker::WorkerState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Task tally by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub pending: u32,
    pub blocked: u32,
    pub in_progress: u32,
    pub completed: u32,
    pub failed: u32,
}

impl TaskCounts {
    pub fn tally<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut counts = Self::default();
        for task in tasks {
            match task.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::Blocked => counts.blocked += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> u32 {
        self.pending + self.blocked + self.in_progress + self.completed + self.failed
    }

    pub fn all_terminal(&self) -> bool {
        self.pending == 0 && self.blocked == 0 && self.in_progress == 0 && self.total() > 0
    }

    /// The parseable status line. Downstream automation matches these
    /// tokens exactly; do not reorder or rename them.
    pub fn status_line(&self) -> String {
        format!(
            "tasks: pending={} blocked={} in_progress={} completed={} failed={}",
            self.pending, self.blocked, self.in_progress, self.completed, self.failed
        )
    }
}

/// Consecutive-identical-recommendation tracking across ticks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationStreak {
    pub key: String,
    pub count: u32,
}

/// Persisted at `monitor.snapshot.json` after every tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub team: String,
    pub phase: TeamPhase,
    pub task_counts: TaskCounts,
    /// Worker name → last reconciled state
    pub workers: BTreeMap<WorkerName, WorkerState>,
    #[serde(default)]
    pub dead_workers: Vec<WorkerName>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub phase_log: Vec<PhaseTransition>,
    #[serde(default)]
    pub recommendation_streak: RecommendationStreak,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_nudge_at: Option<DateTime<Utc>>,
    /// Wall time the last tick took
    pub tick_ms: u64,
    pub updated_at: DateTime<Utc>,
}

impl MonitorSnapshot {
    pub fn initial(team: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            team: team.into(),
            phase: TeamPhase::Start,
            task_counts: TaskCounts::default(),
            workers: BTreeMap::new(),
            dead_workers: Vec::new(),
            recommendations: Vec::new(),
            phase_log: Vec::new(),
            recommendation_streak: RecommendationStreak::default(),
            last_nudge_at: None,
            tick_ms: 0,
            updated_at: now,
        }
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
