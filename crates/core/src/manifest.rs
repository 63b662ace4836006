// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The authoritative per-team manifest.

use crate::id::{TaskId, WorkerName};
use crate::scaling::ScalingPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current manifest schema version.
pub const MANIFEST_SCHEMA_VERSION: u32 = 2;

/// Hard ceiling on workers per team. The scaling policy's `max_workers`
/// is clamped to this on load.
pub const ABSOLUTE_MAX_WORKERS: u32 = 20;

/// Identity of the coordinator process that owns the team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderIdentity {
    pub session_id: String,
    pub worker_id: String,
    pub role: String,
}

/// How worker slots are presented to the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    SplitPane,
    #[default]
    Auto,
}

/// Team-level behavioral policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamPolicy {
    #[serde(default)]
    pub delegation_only: bool,
    #[serde(default)]
    pub plan_approval_required: bool,
    #[serde(default = "default_true")]
    pub cleanup_requires_all_workers_inactive: bool,
    #[serde(default)]
    pub display_mode: DisplayMode,
    #[serde(default)]
    pub nested_teams_allowed: bool,
    #[serde(default = "default_true")]
    pub one_team_per_leader_session: bool,
}

fn default_true() -> bool {
    true
}

impl Default for TeamPolicy {
    fn default() -> Self {
        Self {
            delegation_only: false,
            plan_approval_required: false,
            cleanup_requires_all_workers_inactive: true,
            display_mode: DisplayMode::Auto,
            nested_teams_allowed: false,
            one_team_per_leader_session: true,
        }
    }
}

/// Permission posture inherited from the leader at team start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionsSnapshot {
    pub approval_mode: String,
    pub sandbox_mode: String,
    pub network_access: bool,
}

/// Resource floor/ceiling for scale-up decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub max_cpu_percent: f64,
    pub min_free_mem_mb: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_cpu_percent: 80.0,
            min_free_mem_mb: 512,
        }
    }
}

/// One worker as recorded on the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerEntry {
    pub name: WorkerName,
    pub index: u32,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
}

/// The per-team manifest (`manifest.v2.json`).
///
/// `next_task_id` and `next_worker_index` are allocated by mutating the
/// manifest in a single atomic rewrite, so both counters are non-decreasing
/// across every successful write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamManifest {
    pub schema_version: u32,
    pub team: String,
    pub task_description: String,
    pub leader: LeaderIdentity,
    #[serde(default)]
    pub policy: TeamPolicy,
    #[serde(default)]
    pub permissions: PermissionsSnapshot,
    /// Opaque transport session handle
    pub session: String,
    pub worker_count: u32,
    pub workers: Vec<WorkerEntry>,
    pub initial_worker_count: u32,
    pub active_worker_count: u32,
    #[serde(default)]
    pub draining_workers: Vec<WorkerName>,
    #[serde(default)]
    pub scaling: ScalingPolicy,
    #[serde(default)]
    pub resource_limits: ResourceLimits,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader_pane: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hud_pane: Option<String>,
    pub next_task_id: u64,
    pub next_worker_index: u32,
    /// Optimistic-concurrency token for manifest writes
    #[serde(default)]
    pub revision: u64,
    pub created_at: DateTime<Utc>,
}

impl TeamManifest {
    pub fn new(
        team: impl Into<String>,
        task_description: impl Into<String>,
        leader: LeaderIdentity,
        session: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            schema_version: MANIFEST_SCHEMA_VERSION,
            team: team.into(),
            task_description: task_description.into(),
            leader,
            policy: TeamPolicy::default(),
            permissions: PermissionsSnapshot::default(),
            session: session.into(),
            worker_count: 0,
            workers: Vec::new(),
            initial_worker_count: 0,
            active_worker_count: 0,
            draining_workers: Vec::new(),
            scaling: ScalingPolicy::default(),
            resource_limits: ResourceLimits::default(),
            leader_pane: None,
            hud_pane: None,
            next_task_id: 1,
            next_worker_index: 1,
            revision: 0,
            created_at,
        }
    }

    /// Allocate the next task id, advancing the counter.
    ///
    /// The caller must persist the manifest in the same write window as
    /// the task file it creates.
    pub fn alloc_task_id(&mut self) -> TaskId {
        let id = TaskId::new(self.next_task_id.to_string());
        self.next_task_id += 1;
        id
    }

    /// Allocate the next worker index and canonical name.
    ///
    /// Indexes are never reused, including after remove+add cycles.
    pub fn alloc_worker(&mut self, role: impl Into<String>) -> WorkerEntry {
        let index = self.next_worker_index;
        self.next_worker_index += 1;
        let entry = WorkerEntry {
            name: WorkerName::for_index(index),
            index,
            role: role.into(),
            slot: None,
        };
        self.workers.push(entry.clone());
        self.worker_count = self.workers.len() as u32;
        self.active_worker_count += 1;
        entry
    }

    /// Drop a worker from the roster (scale-down removal). Counters are
    /// left untouched so the index is never handed out again.
    pub fn remove_worker(&mut self, name: &WorkerName) -> Option<WorkerEntry> {
        let pos = self.workers.iter().position(|w| &w.name == name)?;
        let entry = self.workers.remove(pos);
        self.worker_count = self.workers.len() as u32;
        self.active_worker_count = self.active_worker_count.saturating_sub(1);
        self.draining_workers.retain(|n| n != name);
        entry.into()
    }

    pub fn worker(&self, name: &WorkerName) -> Option<&WorkerEntry> {
        self.workers.iter().find(|w| &w.name == name)
    }

    pub fn worker_mut(&mut self, name: &WorkerName) -> Option<&mut WorkerEntry> {
        self.workers.iter_mut().find(|w| &w.name == name)
    }

    pub fn is_draining(&self, name: &WorkerName) -> bool {
        self.draining_workers.contains(name)
    }

    pub fn mark_draining(&mut self, name: WorkerName) {
        if !self.draining_workers.contains(&name) {
            self.draining_workers.push(name);
        }
    }

    /// The agent type the first worker was started with; scale-up without
    /// an explicit type inherits it.
    pub fn original_role(&self) -> Option<&str> {
        self.workers
            .iter()
            .min_by_key(|w| w.index)
            .map(|w| w.role.as_str())
    }

    /// Enforce load-time invariants that serde alone cannot.
    pub fn clamp(&mut self) {
        if self.scaling.max_workers > ABSOLUTE_MAX_WORKERS {
            self.scaling.max_workers = ABSOLUTE_MAX_WORKERS;
        }
        if self.scaling.min_workers == 0 {
            self.scaling.min_workers = 1;
        }
    }

    /// Addresses that cleanup must never target.
    pub fn protected_addresses(&self) -> Vec<&str> {
        self.leader_pane
            .iter()
            .chain(self.hud_pane.iter())
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
