// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task CRUD, claim leases, dependency readiness, and lease expiry.

use crate::atomic::{read_json, write_json_atomic, StoreError};
use crate::manifest::{ManifestError, ManifestStore};
use crate::paths::TeamPaths;
use chrono::{DateTime, Duration, Utc};
use omx_core::{IdGen, Task, TaskClaim, TaskId, TaskStatus, WorkerName};
use std::collections::HashSet;

/// Input for task creation.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub subject: String,
    pub description: String,
    pub depends_on: Vec<TaskId>,
    pub requires_code_change: bool,
}

/// Result of a claim attempt.
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    Claimed { task: Task, token: String },
    NotFound,
    /// Task exists but is not pending (and holds no live claim)
    WrongStatus { status: TaskStatus },
    /// Already claimed by another worker, or lost the write race twice
    Conflict { holder: Option<WorkerName> },
    BlockedDependency { unmet: Vec<TaskId> },
    /// The claiming worker is draining and must not take new work
    DrainingWorker,
}

/// Result of a voluntary claim release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    NotFound,
    TokenMismatch,
}

/// Result of a terminal transition.
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    Transitioned { task: Task },
    NotFound,
    TokenMismatch,
    WrongStatus { status: TaskStatus },
}

/// Result of an administrative update.
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    Updated { task: Task },
    NotFound,
    VersionConflict,
}

/// General-purpose field patch for `update`.
///
/// `owner`, `result`, and `error` distinguish "leave alone" (`None`) from
/// "clear" (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub subject: Option<String>,
    pub description: Option<String>,
    /// Unrestricted status override, for administrative correction
    pub status: Option<TaskStatus>,
    pub owner: Option<Option<WorkerName>>,
    pub result: Option<Option<String>>,
    pub error: Option<Option<String>>,
    pub depends_on: Option<Vec<TaskId>>,
}

/// Dependency readiness of one task. Pure data; computing it never
/// mutates anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
    pub ready: bool,
    pub unmet: Vec<TaskId>,
}

/// Filesystem task store (`tasks/<id>.json`).
#[derive(Clone)]
pub struct TaskStore {
    paths: TeamPaths,
}

impl TaskStore {
    pub fn new(paths: TeamPaths) -> Self {
        Self { paths }
    }

    /// Create a task, allocating its id from the manifest counter in the
    /// same write window. Dependencies are not validated here; a task may
    /// reference a sibling created later in the same bootstrap batch.
    pub fn create(
        &self,
        manifests: &ManifestStore,
        spec: NewTask,
        now: DateTime<Utc>,
    ) -> Result<Task, ManifestError> {
        let (_, id) = manifests.mutate(|m| m.alloc_task_id())?;
        let task = Task::new(id, spec.subject, spec.description, now)
            .with_depends_on(spec.depends_on)
            .with_requires_code_change(spec.requires_code_change);
        write_json_atomic(&self.paths.task(&task.id), &task).map_err(ManifestError::Store)?;
        Ok(task)
    }

    pub fn get(&self, id: &TaskId) -> Option<Task> {
        read_json(&self.paths.task(id))
    }

    /// All tasks, ordered by numeric id.
    pub fn list(&self) -> Vec<Task> {
        let Ok(entries) = std::fs::read_dir(self.paths.tasks_dir()) else {
            return Vec::new();
        };
        let mut tasks: Vec<Task> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .filter_map(|e| read_json(&e.path()))
            .collect();
        tasks.sort_by_key(|t| (t.id.as_u64().unwrap_or(u64::MAX), t.id.clone()));
        tasks
    }

    /// Attempt to claim a pending task for `worker`.
    ///
    /// Optimistic concurrency: read, mutate in memory, write if the
    /// persisted version is unchanged; one retry, then conflict.
    pub fn claim<G: IdGen>(
        &self,
        id: &TaskId,
        worker: &WorkerName,
        draining: &[WorkerName],
        idgen: &G,
        now: DateTime<Utc>,
        lease_ms: u64,
    ) -> Result<ClaimOutcome, StoreError> {
        if draining.contains(worker) {
            return Ok(ClaimOutcome::DrainingWorker);
        }
        for _attempt in 0..2 {
            let Some(task) = self.get(id) else {
                return Ok(ClaimOutcome::NotFound);
            };
            match task.status {
                TaskStatus::Pending => {}
                TaskStatus::InProgress => {
                    return Ok(ClaimOutcome::Conflict {
                        holder: task.claim.map(|c| c.worker),
                    });
                }
                status => return Ok(ClaimOutcome::WrongStatus { status }),
            }
            let readiness = self.readiness(&task);
            if !readiness.ready {
                return Ok(ClaimOutcome::BlockedDependency {
                    unmet: readiness.unmet,
                });
            }

            let token = idgen.next();
            let mut claimed = task.clone();
            claimed.status = TaskStatus::InProgress;
            claimed.owner = Some(worker.clone());
            claimed.claim = Some(TaskClaim {
                token: token.clone(),
                worker: worker.clone(),
                acquired_at: now,
                lease_expires_at: now + Duration::milliseconds(lease_ms as i64),
            });
            claimed.version += 1;

            if self.write_if_version(&claimed, task.version)? {
                return Ok(ClaimOutcome::Claimed {
                    task: claimed,
                    token,
                });
            }
        }
        let holder = self.get(id).and_then(|t| t.claim).map(|c| c.worker);
        Ok(ClaimOutcome::Conflict { holder })
    }

    /// Voluntarily yield a claim, returning the task to pending.
    pub fn release(
        &self,
        id: &TaskId,
        token: &str,
        _now: DateTime<Utc>,
    ) -> Result<ReleaseOutcome, StoreError> {
        let Some(task) = self.get(id) else {
            return Ok(ReleaseOutcome::NotFound);
        };
        let Some(claim) = &task.claim else {
            return Ok(ReleaseOutcome::TokenMismatch);
        };
        if claim.token != token {
            return Ok(ReleaseOutcome::TokenMismatch);
        }
        let mut released = task.clone();
        released.status = TaskStatus::Pending;
        released.claim = None;
        released.owner = None;
        released.version += 1;
        write_json_atomic(&self.paths.task(id), &released)?;
        Ok(ReleaseOutcome::Released)
    }

    /// Move an in-progress task to completed or failed. Requires the
    /// claim token; non-terminal changes go through [`TaskStore::update`].
    pub fn transition(
        &self,
        id: &TaskId,
        token: &str,
        target: TaskStatus,
        result: Option<String>,
        error: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, StoreError> {
        debug_assert!(target.is_terminal());
        let Some(task) = self.get(id) else {
            return Ok(TransitionOutcome::NotFound);
        };
        if task.status != TaskStatus::InProgress {
            return Ok(TransitionOutcome::WrongStatus {
                status: task.status,
            });
        }
        let token_matches = task.claim.as_ref().is_some_and(|c| c.token == token);
        if !token_matches {
            return Ok(TransitionOutcome::TokenMismatch);
        }
        let mut done = task.clone();
        done.status = target;
        done.claim = None;
        done.completed_at = Some(now);
        if result.is_some() {
            done.result = result;
        }
        if error.is_some() {
            done.error = error;
        }
        done.version += 1;
        write_json_atomic(&self.paths.task(id), &done)?;
        Ok(TransitionOutcome::Transitioned { task: done })
    }

    /// Administrative field patch under optimistic concurrency.
    pub fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<UpdateOutcome, StoreError> {
        for _attempt in 0..2 {
            let Some(task) = self.get(id) else {
                return Ok(UpdateOutcome::NotFound);
            };
            let mut updated = task.clone();
            if let Some(subject) = &patch.subject {
                updated.subject = subject.clone();
            }
            if let Some(description) = &patch.description {
                updated.description = description.clone();
            }
            if let Some(status) = patch.status {
                updated.status = status;
                if !matches!(status, TaskStatus::InProgress) {
                    updated.claim = None;
                }
            }
            if let Some(owner) = &patch.owner {
                updated.owner = owner.clone();
            }
            if let Some(result) = &patch.result {
                updated.result = result.clone();
            }
            if let Some(error) = &patch.error {
                updated.error = error.clone();
            }
            if let Some(deps) = &patch.depends_on {
                updated.depends_on = deps.clone();
            }
            updated.version += 1;
            if self.write_if_version(&updated, task.version)? {
                return Ok(UpdateOutcome::Updated { task: updated });
            }
        }
        Ok(UpdateOutcome::VersionConflict)
    }

    /// A task is ready iff every dependency resolves to a completed task.
    /// Missing dependencies count as unmet.
    pub fn readiness(&self, task: &Task) -> Readiness {
        let unmet: Vec<TaskId> = task
            .depends_on
            .iter()
            .filter(|dep| {
                self.get(dep)
                    .map(|t| t.status != TaskStatus::Completed)
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        Readiness {
            ready: unmet.is_empty(),
            unmet,
        }
    }

    /// Rewrite expired in-progress tasks back to pending, but only when
    /// the claim holder is observed dead. Returns the ids swept.
    pub fn sweep_expired(
        &self,
        now: DateTime<Utc>,
        dead_workers: &HashSet<WorkerName>,
    ) -> Result<Vec<TaskId>, StoreError> {
        let mut swept = Vec::new();
        for task in self.list() {
            if task.status != TaskStatus::InProgress {
                continue;
            }
            let Some(claim) = &task.claim else {
                continue;
            };
            if !claim.is_expired(now) || !dead_workers.contains(&claim.worker) {
                continue;
            }
            let mut reset = task.clone();
            reset.status = TaskStatus::Pending;
            reset.claim = None;
            reset.owner = None;
            reset.version += 1;
            write_json_atomic(&self.paths.task(&reset.id), &reset)?;
            swept.push(reset.id);
        }
        Ok(swept)
    }

    /// Write `task` only if the persisted version still matches
    /// `expected`. Returns whether the write happened.
    fn write_if_version(&self, task: &Task, expected: u64) -> Result<bool, StoreError> {
        let current = self.get(&task.id).map(|t| t.version);
        if current != Some(expected) {
            return Ok(false);
        }
        write_json_atomic(&self.paths.task(&task.id), task)?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
