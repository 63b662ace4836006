// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Graceful and forced shutdown, and crash-safe cleanup.

use crate::error::RuntimeError;
use crate::liveness::observed_dead;
use crate::runtime::TeamRuntime;
use omx_adapters::{Spawner, Transport};
use omx_core::{
    AckStatus, Clock, EventKind, IdGen, TaskStatus, TeamManifest, WorkerName, WorkerState,
};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

/// Kill-target bookkeeping for the structured summary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TargetsSummary {
    pub deduped_total: u32,
    pub killed: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExclusionSummary {
    pub leader: u32,
    pub hud: u32,
    /// Live addresses outside the team's known identity, never targeted
    pub foreign: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AckSummary {
    pub accepted: u32,
    pub rejected: u32,
    pub timed_out: u32,
}

/// Structured result of a shutdown/cleanup pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupSummary {
    pub targets: TargetsSummary,
    pub excluded: ExclusionSummary,
    pub acks: AckSummary,
    pub session_destroyed: bool,
    pub state_removed: bool,
}

/// How a shutdown request ended.
#[derive(Debug)]
pub enum ShutdownOutcome {
    Done(CleanupSummary),
    /// Graceful gate not satisfied; nothing was touched
    GateBlocked {
        busy_workers: Vec<WorkerName>,
        non_terminal_tasks: u32,
    },
    /// A worker explicitly rejected; nothing was killed
    Rejected {
        workers: Vec<(WorkerName, Option<String>)>,
    },
}

impl<T: Transport, S: Spawner, C: Clock, G: IdGen> TeamRuntime<T, S, C, G> {
    /// Shut the team down.
    ///
    /// Graceful mode checks the termination gate, runs the shutdown
    /// rendezvous, and refuses to kill anything if a worker rejects.
    /// Forced mode skips the gate and proceeds regardless of acks.
    pub async fn shutdown_team(
        &self,
        force: bool,
        preserve_state: bool,
    ) -> Result<ShutdownOutcome, RuntimeError> {
        let manifest = self.require_manifest()?;
        let now = self.clock.now_utc();

        if !force && manifest.policy.cleanup_requires_all_workers_inactive {
            let busy = self.busy_workers(&manifest);
            if !busy.is_empty() {
                let non_terminal = self
                    .tasks
                    .list()
                    .iter()
                    .filter(|t| !t.status.is_terminal())
                    .count() as u32;
                return Ok(ShutdownOutcome::GateBlocked {
                    busy_workers: busy,
                    non_terminal_tasks: non_terminal,
                });
            }
        }

        let live_slots: HashSet<String> = self
            .transport
            .list_slots(&manifest.session)
            .await
            .unwrap_or_default()
            .into_iter()
            .collect();

        // Rendezvous with every still-live worker
        let mut pending: Vec<(WorkerName, chrono::DateTime<chrono::Utc>)> = Vec::new();
        for entry in &manifest.workers {
            let heartbeat = self.heartbeats.read(&entry.name);
            let dead = observed_dead(
                heartbeat.as_ref(),
                entry.slot.as_deref(),
                &live_slots,
                now,
                self.config.inactivity_ceiling,
            );
            if dead {
                continue;
            }
            let requested_at = self.signals.request_shutdown(&entry.name, "leader", now)?;
            pending.push((entry.name.clone(), requested_at));
        }

        let mut acks = AckSummary::default();
        let mut rejected: Vec<(WorkerName, Option<String>)> = Vec::new();
        let deadline = std::time::Instant::now() + self.config.shutdown_grace;
        let mut outstanding = pending;
        while !outstanding.is_empty() && std::time::Instant::now() < deadline {
            let mut still_waiting = Vec::new();
            for (name, requested_at) in outstanding {
                match self.signals.read_ack_with_min(&name, requested_at) {
                    Some(ack) => {
                        self.append_event(
                            EventKind::ShutdownAck,
                            |e| {
                                let e = e.with_worker(name.as_str());
                                match ack.status {
                                    AckStatus::Accept => e.with_reason("accept"),
                                    AckStatus::Reject => e.with_reason("reject"),
                                }
                            },
                            self.clock.now_utc(),
                        )?;
                        match ack.status {
                            AckStatus::Accept => acks.accepted += 1,
                            AckStatus::Reject => {
                                acks.rejected += 1;
                                rejected.push((name, ack.reason));
                            }
                        }
                    }
                    None => still_waiting.push((name, requested_at)),
                }
            }
            outstanding = still_waiting;
            if !outstanding.is_empty() {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
        }
        acks.timed_out = outstanding.len() as u32;

        if !force && !rejected.is_empty() {
            return Ok(ShutdownOutcome::Rejected { workers: rejected });
        }

        let summary = self
            .kill_and_teardown(&manifest, &live_slots, acks, preserve_state)
            .await?;
        Ok(ShutdownOutcome::Done(summary))
    }

    /// Forced cleanup, safe after a crash: tolerates a missing session
    /// and half-written state, always removes the state subtree.
    pub async fn cleanup(&self) -> Result<CleanupSummary, RuntimeError> {
        let Some(manifest) = self.manifests.load() else {
            // No manifest: nothing addressable; just drop any leftovers
            let state_removed = self.paths.root().exists();
            if state_removed {
                std::fs::remove_dir_all(self.paths.root())
                    .map_err(omx_storage::StoreError::from)?;
            }
            return Ok(CleanupSummary {
                state_removed,
                ..Default::default()
            });
        };

        let live_slots: HashSet<String> = self
            .transport
            .list_slots(&manifest.session)
            .await
            .unwrap_or_default()
            .into_iter()
            .collect();
        self.kill_and_teardown(&manifest, &live_slots, AckSummary::default(), false)
            .await
    }

    /// The kill pass: targets are exactly
    /// `(known identity ∩ live session) − {leader, HUD}`, each killed
    /// once. Addresses outside that intersection are never touched.
    async fn kill_and_teardown(
        &self,
        manifest: &TeamManifest,
        live_slots: &HashSet<String>,
        acks: AckSummary,
        preserve_state: bool,
    ) -> Result<CleanupSummary, RuntimeError> {
        let mut known: BTreeSet<String> = manifest
            .workers
            .iter()
            .filter_map(|w| w.slot.clone())
            .collect();
        for name in self.workers.list() {
            if let Some(identity) = self.workers.read_identity(&name) {
                if let Some(slot) = identity.slot {
                    known.insert(slot);
                }
            }
        }

        let protected: HashSet<&str> = manifest
            .protected_addresses()
            .into_iter()
            .collect();

        let targets: Vec<String> = known
            .iter()
            .filter(|address| live_slots.contains(*address))
            .filter(|address| !protected.contains(address.as_str()))
            .cloned()
            .collect();
        let foreign = live_slots
            .iter()
            .filter(|address| !known.contains(*address))
            .filter(|address| !protected.contains(address.as_str()))
            .count() as u32;

        let mut killed = Vec::new();
        for address in &targets {
            self.transport
                .kill_slot(address, self.config.kill_grace)
                .await?;
            killed.push(address.clone());
        }

        let session_destroyed = self
            .transport
            .destroy_session(&manifest.session)
            .await
            .is_ok();

        let state_removed = if preserve_state {
            false
        } else {
            std::fs::remove_dir_all(self.paths.root())
                .map_err(omx_storage::StoreError::from)?;
            true
        };

        tracing::info!(
            team = %self.team,
            targets = targets.len(),
            foreign,
            session_destroyed,
            state_removed,
            "team torn down"
        );

        Ok(CleanupSummary {
            targets: TargetsSummary {
                deduped_total: targets.len() as u32,
                killed,
            },
            excluded: ExclusionSummary {
                leader: manifest.leader_pane.iter().count() as u32,
                hud: manifest.hud_pane.iter().count() as u32,
                foreign,
            },
            acks,
            session_destroyed,
            state_removed,
        })
    }

    /// Workers that block the graceful gate: anything not inactive,
    /// except draining workers that no longer hold a claim.
    fn busy_workers(&self, manifest: &TeamManifest) -> Vec<WorkerName> {
        let claims: HashSet<WorkerName> = self
            .tasks
            .list()
            .into_iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .filter_map(|t| t.claim.map(|c| c.worker))
            .collect();
        manifest
            .workers
            .iter()
            .filter(|entry| {
                let state = self
                    .workers
                    .read_status(&entry.name)
                    .map(|s| s.state)
                    .unwrap_or(WorkerState::Unknown);
                match state {
                    s if s.is_inactive() => false,
                    WorkerState::Draining => claims.contains(&entry.name),
                    _ => true,
                }
            })
            .map(|entry| entry.name.clone())
            .collect()
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
