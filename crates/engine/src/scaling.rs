// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scaling engine: resource-gated scale-up, drain-based scale-down,
//! and the pure recommendation function.

use crate::error::RuntimeError;
use crate::resources::{self, workers_allowed};
use crate::runtime::TeamRuntime;
use omx_adapters::{Spawner, Transport};
use omx_core::{
    Clock, IdGen, Recommendation, ResourceSnapshot, ScaleDirection, ScalingAction, ScalingEvent,
    ScalingPolicy, ScalingTrigger, TaskCounts, TaskStatus, TeamManifest, WorkerName, WorkerState,
    WorkerStatus,
};
use omx_storage::LockError;
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Inputs to the recommendation function.
pub struct RecommendInput<'a> {
    pub counts: &'a TaskCounts,
    pub active_workers: u32,
    /// How long each currently idle worker has been idle
    pub idle_ages: &'a [Duration],
    pub policy: &'a ScalingPolicy,
}

/// Pure function of the reconciled view: suggest scale-up when the
/// pending backlog outruns the team, scale-down when enough workers sit
/// idle past the idle-timeout.
pub fn recommend(input: &RecommendInput<'_>) -> Option<Recommendation> {
    let active = input.active_workers;
    if active == 0 {
        return None;
    }
    let pending = input.counts.pending as f64;
    let up_ratio = pending / active as f64;
    if up_ratio > input.policy.scale_up_threshold {
        let want = (pending / input.policy.scale_up_threshold).ceil() as u32;
        let count = want.saturating_sub(active).max(1);
        return Some(Recommendation {
            direction: ScaleDirection::Up,
            count,
            reason: format!(
                "pending/active {:.2} exceeds {:.2}",
                up_ratio, input.policy.scale_up_threshold
            ),
            high_confidence: false,
        });
    }

    let idle = input.idle_ages.len() as u32;
    let down_ratio = idle as f64 / active as f64;
    if down_ratio > input.policy.scale_down_threshold {
        let idle_floor = Duration::from_millis(input.policy.idle_timeout_ms);
        if idle > 0 && input.idle_ages.iter().all(|age| *age >= idle_floor) {
            let keep = (active as f64 * input.policy.scale_down_threshold).ceil() as u32;
            let count = idle.saturating_sub(keep).max(1);
            return Some(Recommendation {
                direction: ScaleDirection::Down,
                count,
                reason: format!(
                    "idle/active {:.2} exceeds {:.2}",
                    down_ratio, input.policy.scale_down_threshold
                ),
                high_confidence: false,
            });
        }
    }
    None
}

/// Result of a scale-up attempt.
#[derive(Debug)]
pub enum ScaleUpOutcome {
    Applied { added: Vec<WorkerName> },
    CeilingReached { max_workers: u32 },
    CooldownActive,
    ResourceDenied { reason: String },
    LockBusy,
}

/// Result of a scale-down request.
#[derive(Debug)]
pub enum ScaleDownOutcome {
    /// Selected workers are draining; removal happens as their claims
    /// reach terminal states
    Draining { workers: Vec<WorkerName> },
    FloorReached { min_workers: u32 },
    NoCandidates,
    LockBusy,
}

/// Which workers a scale-down targets.
#[derive(Debug, Clone)]
pub enum ScaleDownSelection {
    Count(u32),
    Named(WorkerName),
}

impl<T: Transport, S: Spawner, C: Clock, G: IdGen> TeamRuntime<T, S, C, G> {
    /// Add `k` workers to the running team, gated by ceiling, cooldown,
    /// and a cheap resource sample, all under the scaling lock.
    pub async fn scale_up(
        &self,
        k: u32,
        agent_type: Option<String>,
        trigger: ScalingTrigger,
    ) -> Result<ScaleUpOutcome, RuntimeError> {
        let manifest = self.require_manifest()?;
        let k = k.max(1);

        if manifest.active_worker_count + k > manifest.scaling.max_workers {
            return Ok(ScaleUpOutcome::CeilingReached {
                max_workers: manifest.scaling.max_workers,
            });
        }
        let cooldown = Duration::from_millis(manifest.scaling.cooldown_ms);
        if !self.cooldown_elapsed(cooldown) {
            return Ok(ScaleUpOutcome::CooldownActive);
        }

        let sample = resources::sample();
        if let Some(sample) = &sample {
            let cpu_percent = resources::cpu_percent(sample.cpu_load_1m);
            if cpu_percent > manifest.resource_limits.max_cpu_percent {
                return Ok(ScaleUpOutcome::ResourceDenied {
                    reason: format!(
                        "cpu load {:.0}% exceeds {:.0}%",
                        cpu_percent, manifest.resource_limits.max_cpu_percent
                    ),
                });
            }
            let allowed = workers_allowed(
                sample,
                &manifest.resource_limits,
                manifest.scaling.per_worker_mem_mb,
            );
            if allowed < k {
                return Ok(ScaleUpOutcome::ResourceDenied {
                    reason: format!(
                        "free memory allows {} new workers, {} requested",
                        allowed, k
                    ),
                });
            }
        }

        let guard = match self.scaling_lock.acquire(self.clock.now_utc()) {
            Ok((guard, _stolen)) => guard,
            Err(LockError::Busy { .. }) => return Ok(ScaleUpOutcome::LockBusy),
            Err(LockError::Io(e)) => return Err(RuntimeError::Store(e.into())),
            Err(LockError::Serialize(e)) => return Err(RuntimeError::Store(e.into())),
        };

        // Scale-up without an explicit agent type inherits the team's
        // original one
        let role = agent_type
            .or_else(|| manifest.original_role().map(str::to_string))
            .unwrap_or_else(|| "executor".to_string());

        let cancel = CancellationToken::new();
        let mut added = Vec::new();
        for _ in 0..k {
            match self
                .bootstrap_worker(&manifest.session, &role, &cancel)
                .await?
            {
                crate::bootstrap::BootstrapOutcome::Ready { worker, .. } => added.push(worker),
                crate::bootstrap::BootstrapOutcome::ReadyTimeout { worker } => {
                    tracing::warn!(team = %self.team, %worker, "scale-up worker failed readiness");
                }
            }
        }

        self.append_scaling_event(
            ScalingAction::ScaleUp,
            trigger,
            Some(added.len() as u32),
            None,
            format!("scale-up by {} ({})", k, role),
            sample,
        )?;
        guard.release();

        Ok(ScaleUpOutcome::Applied { added })
    }

    /// Mark scale-down candidates as draining. Candidates are idle
    /// first, never holding an in-progress claim, largest index first;
    /// the active count never goes below the configured floor.
    pub async fn begin_scale_down(
        &self,
        k: u32,
        trigger: ScalingTrigger,
    ) -> Result<ScaleDownOutcome, RuntimeError> {
        let manifest = self.require_manifest()?;
        let candidates = self.select_drain_candidates(&manifest, k.max(1));
        if candidates.is_empty() {
            let floor = manifest.scaling.min_workers;
            return Ok(if manifest.active_worker_count <= floor {
                ScaleDownOutcome::FloorReached {
                    min_workers: floor,
                }
            } else {
                ScaleDownOutcome::NoCandidates
            });
        }
        self.mark_draining(&candidates, trigger).await?;
        Ok(ScaleDownOutcome::Draining {
            workers: candidates,
        })
    }

    /// Drain one specific worker by name.
    pub async fn begin_scale_down_named(
        &self,
        name: &WorkerName,
        trigger: ScalingTrigger,
    ) -> Result<ScaleDownOutcome, RuntimeError> {
        let manifest = self.require_manifest()?;
        if manifest.worker(name).is_none() {
            return Err(RuntimeError::WorkerNotFound(name.to_string()));
        }
        if manifest.active_worker_count <= manifest.scaling.min_workers {
            return Ok(ScaleDownOutcome::FloorReached {
                min_workers: manifest.scaling.min_workers,
            });
        }
        self.mark_draining(std::slice::from_ref(name), trigger)
            .await?;
        Ok(ScaleDownOutcome::Draining {
            workers: vec![name.clone()],
        })
    }

    /// Begin a scale-down and pump drain progress until the selected
    /// workers are removed or `wait` runs out. Returns the removed set.
    pub async fn scale_down_and_wait(
        &self,
        selection: ScaleDownSelection,
        trigger: ScalingTrigger,
        wait: Duration,
    ) -> Result<(ScaleDownOutcome, Vec<WorkerName>), RuntimeError> {
        let outcome = match &selection {
            ScaleDownSelection::Count(k) => self.begin_scale_down(*k, trigger).await?,
            ScaleDownSelection::Named(name) => {
                self.begin_scale_down_named(name, trigger).await?
            }
        };
        let ScaleDownOutcome::Draining { workers } = &outcome else {
            return Ok((outcome, Vec::new()));
        };
        let targets: HashSet<WorkerName> = workers.iter().cloned().collect();

        let deadline = std::time::Instant::now() + wait;
        let mut removed = Vec::new();
        loop {
            let manifest = self.require_manifest()?;
            let live: HashSet<String> = self
                .transport
                .list_slots(&manifest.session)
                .await
                .unwrap_or_default()
                .into_iter()
                .collect();
            for worker in self.advance_drains(&manifest, &live).await? {
                if targets.contains(&worker) {
                    removed.push(worker);
                }
            }
            if removed.len() == targets.len() || std::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        Ok((outcome, removed))
    }

    /// One step of drain progress, called from the monitor tick and from
    /// [`TeamRuntime::scale_down_and_wait`]:
    /// request shutdown once the worker holds no in-progress claim, kill
    /// and remove on a fresh accept ack, warn when the drain exceeds its
    /// budget (never force-kill).
    pub(crate) async fn advance_drains(
        &self,
        manifest: &TeamManifest,
        live_slots: &HashSet<String>,
    ) -> Result<Vec<WorkerName>, RuntimeError> {
        let mut removed = Vec::new();
        let now = self.clock.now_utc();
        for name in manifest.draining_workers.clone() {
            if self.worker_holds_claim(&name) {
                self.warn_slow_drain(&name, now)?;
                continue;
            }
            let request = match self.signals.read_request(&name) {
                Some(request) => request,
                None => {
                    let requested_at =
                        self.signals.request_shutdown(&name, "leader", now)?;
                    tracing::info!(team = %self.team, worker = %name, "drain shutdown requested");
                    omx_core::ShutdownRequest {
                        requested_by: "leader".into(),
                        requested_at,
                    }
                }
            };
            let Some(ack) = self.signals.read_ack_with_min(&name, request.requested_at) else {
                self.warn_slow_drain(&name, now)?;
                continue;
            };
            if ack.status == omx_core::AckStatus::Reject {
                tracing::warn!(
                    team = %self.team,
                    worker = %name,
                    reason = ack.reason.as_deref().unwrap_or(""),
                    "drain shutdown rejected"
                );
                continue;
            }

            // Kill under the same target rules as cleanup: the slot must
            // be known to the manifest AND live in the session
            let slot = manifest.worker(&name).and_then(|w| w.slot.clone());
            if let Some(address) = slot {
                let protected = manifest.protected_addresses();
                if live_slots.contains(&address) && !protected.contains(&address.as_str()) {
                    self.transport
                        .kill_slot(&address, self.config.kill_grace)
                        .await?;
                }
            }

            self.workers.remove(&name)?;
            self.manifests.mutate(|m| {
                m.remove_worker(&name);
            })?;
            self.append_scaling_event(
                ScalingAction::ScaleDown,
                ScalingTrigger::Manual,
                None,
                Some(1),
                format!("worker {} drained and removed", name),
                resources::sample(),
            )?;
            removed.push(name);
        }
        Ok(removed)
    }

    pub(crate) fn cooldown_elapsed(&self, cooldown: Duration) -> bool {
        match self.history.last_applied() {
            Some(event) => {
                let elapsed = self
                    .clock
                    .now_utc()
                    .signed_duration_since(event.timestamp)
                    .num_milliseconds();
                elapsed >= cooldown.as_millis() as i64
            }
            None => true,
        }
    }

    fn select_drain_candidates(&self, manifest: &TeamManifest, k: u32) -> Vec<WorkerName> {
        let floor = manifest.scaling.min_workers;
        let removable = manifest
            .active_worker_count
            .saturating_sub(manifest.draining_workers.len() as u32)
            .saturating_sub(floor);
        let budget = removable.min(k) as usize;
        if budget == 0 {
            return Vec::new();
        }

        let mut candidates: Vec<(bool, u32, WorkerName)> = manifest
            .workers
            .iter()
            .filter(|w| !manifest.is_draining(&w.name))
            .filter(|w| !self.worker_holds_claim(&w.name))
            .map(|w| {
                let idle = self
                    .workers
                    .read_status(&w.name)
                    .map(|s| s.state == WorkerState::Idle)
                    .unwrap_or(false);
                (idle, w.index, w.name.clone())
            })
            .collect();
        // Idle first, then largest index (LIFO)
        candidates.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
        candidates
            .into_iter()
            .take(budget)
            .map(|(_, _, name)| name)
            .collect()
    }

    async fn mark_draining(
        &self,
        names: &[WorkerName],
        trigger: ScalingTrigger,
    ) -> Result<(), RuntimeError> {
        let now = self.clock.now_utc();
        self.manifests.mutate(|m| {
            for name in names {
                m.mark_draining(name.clone());
            }
        })?;
        for name in names {
            let current_task = self
                .workers
                .read_status(name)
                .and_then(|s| s.current_task_id);
            self.workers.write_status(
                name,
                &WorkerStatus {
                    state: WorkerState::Draining,
                    current_task_id: current_task,
                    reason: None,
                    updated_at: now,
                },
            )?;
            tracing::info!(team = %self.team, worker = %name, ?trigger, "worker draining");
        }
        Ok(())
    }

    /// Whether a worker currently holds an in-progress claim.
    fn worker_holds_claim(&self, name: &WorkerName) -> bool {
        self.tasks.list().iter().any(|t| {
            t.status == TaskStatus::InProgress
                && t.claim.as_ref().map(|c| &c.worker) == Some(name)
        })
    }

    /// A drain that outlives its budget gets one warning entry in the
    /// scaling history; it is never force-killed.
    fn warn_slow_drain(
        &self,
        name: &WorkerName,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), RuntimeError> {
        let Some(status) = self.workers.read_status(name) else {
            return Ok(());
        };
        if status.state != WorkerState::Draining || status.reason.is_some() {
            return Ok(());
        }
        let age = now.signed_duration_since(status.updated_at).num_milliseconds();
        if age < self.config.drain_timeout.as_millis() as i64 {
            return Ok(());
        }
        tracing::warn!(team = %self.team, worker = %name, "drain exceeded timeout");
        self.workers.write_status(
            name,
            &WorkerStatus {
                reason: Some("drain_timeout".into()),
                ..status
            },
        )?;
        self.append_scaling_event(
            ScalingAction::Recommendation,
            ScalingTrigger::Auto,
            None,
            None,
            format!("drain timeout exceeded for {}", name),
            resources::sample(),
        )?;
        Ok(())
    }

    pub(crate) fn append_scaling_event(
        &self,
        action: ScalingAction,
        trigger: ScalingTrigger,
        workers_added: Option<u32>,
        workers_removed: Option<u32>,
        reason: String,
        sample: Option<crate::resources::ResourceSample>,
    ) -> Result<(), RuntimeError> {
        let manifest = self.manifests.load();
        let snapshot = self.snapshots.read();
        let resource_snapshot = ResourceSnapshot {
            cpu_load_1m: sample.as_ref().map(|s| s.cpu_load_1m).unwrap_or(0.0),
            free_mem_mb: sample.as_ref().map(|s| s.free_mem_mb).unwrap_or(0),
            active_workers: manifest.map(|m| m.active_worker_count).unwrap_or(0),
            pending_tasks: snapshot
                .as_ref()
                .map(|s| s.task_counts.pending)
                .unwrap_or(0),
            idle_workers: snapshot
                .map(|s| {
                    s.workers
                        .values()
                        .filter(|state| **state == WorkerState::Idle)
                        .count() as u32
                })
                .unwrap_or(0),
        };
        self.history.append(ScalingEvent {
            timestamp: self.clock.now_utc(),
            action,
            trigger,
            workers_added,
            workers_removed,
            reason,
            resource_snapshot,
        })?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "scaling_tests.rs"]
mod tests;
