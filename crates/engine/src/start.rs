// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Team start: manifest init, session create, sequential bootstraps.

use crate::bootstrap::BootstrapOutcome;
use crate::error::RuntimeError;
use crate::runtime::TeamRuntime;
use omx_adapters::{env, Spawner, Transport};
use omx_core::{
    Clock, IdGen, LeaderIdentity, MonitorSnapshot, PermissionsSnapshot, ScalingPolicy,
    TeamManifest, ABSOLUTE_MAX_WORKERS,
};
use omx_storage::{ensure_dir, NewTask};
use tokio_util::sync::CancellationToken;

/// One worker to start.
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    pub agent_type: String,
}

/// Everything `start_team` needs.
#[derive(Debug, Clone)]
pub struct StartSpec {
    pub task_description: String,
    pub workers: Vec<WorkerSpec>,
    pub tasks: Vec<NewTask>,
    pub leader: LeaderIdentity,
    pub permissions: PermissionsSnapshot,
    pub leader_pane: Option<String>,
    pub hud_pane: Option<String>,
}

impl<T: Transport, S: Spawner, C: Clock, G: IdGen> TeamRuntime<T, S, C, G> {
    /// Create the team: state root, manifest, transport session, initial
    /// tasks, then workers bootstrapped sequentially (cheaper failure
    /// diagnosis than parallel spawns).
    ///
    /// Infrastructure failures after the session exists roll everything
    /// back (session destroyed, state root removed). A worker that merely
    /// misses its readiness window is marked failed and the team
    /// continues.
    pub async fn start_team(
        &self,
        spec: StartSpec,
        cancel: &CancellationToken,
    ) -> Result<TeamManifest, RuntimeError> {
        validate_team_name(&self.team)?;
        if self.exists() {
            return Err(RuntimeError::TeamExists(self.team.clone()));
        }
        let worker_count = spec.workers.len() as u32;

        ensure_dir(self.paths.root())?;
        ensure_dir(&self.paths.tasks_dir())?;
        ensure_dir(&self.paths.workers_dir())?;
        ensure_dir(&self.paths.mailbox_dir())?;
        ensure_dir(&self.paths.approvals_dir())?;

        let session = self
            .transport
            .create_session(&self.team, &self.project_root)
            .await?;

        let result = self
            .start_inner(&spec, &session, worker_count, cancel)
            .await;
        match result {
            Ok(manifest) => Ok(manifest),
            Err(e) => {
                // Roll back: the session exists but the team is unusable
                tracing::error!(team = %self.team, error = %e, "start failed, rolling back");
                let _ = self.transport.destroy_session(&session).await;
                let _ = std::fs::remove_dir_all(self.paths.root());
                Err(e)
            }
        }
    }

    async fn start_inner(
        &self,
        spec: &StartSpec,
        session: &str,
        worker_count: u32,
        cancel: &CancellationToken,
    ) -> Result<TeamManifest, RuntimeError> {
        let now = self.clock.now_utc();

        let mut manifest = TeamManifest::new(
            self.team.clone(),
            spec.task_description.clone(),
            spec.leader.clone(),
            session,
            now,
        );
        manifest.permissions = spec.permissions.clone();
        manifest.initial_worker_count = worker_count;
        manifest.leader_pane = spec.leader_pane.clone();
        manifest.hud_pane = spec.hud_pane.clone();
        manifest.scaling = scaling_policy_from_env(self.config.auto_scale);
        manifest.resource_limits.max_cpu_percent = env::scale_max_cpu_percent();
        manifest.resource_limits.min_free_mem_mb = env::scale_min_free_mem_mb();
        self.manifests.init(&manifest)?;

        // Tasks first so bootstrap can list them in each inbox
        for task in &spec.tasks {
            self.tasks.create(&self.manifests, task.clone(), now)?;
        }

        for worker in &spec.workers {
            match self
                .bootstrap_worker(session, &worker.agent_type, cancel)
                .await?
            {
                BootstrapOutcome::Ready { worker, slot } => {
                    tracing::info!(team = %self.team, %worker, slot, "worker ready");
                }
                BootstrapOutcome::ReadyTimeout { worker } => {
                    tracing::warn!(team = %self.team, %worker, "worker failed readiness, continuing");
                }
            }
        }

        self.snapshots
            .write(&MonitorSnapshot::initial(&self.team, now))?;

        self.require_manifest()
    }
}

fn scaling_policy_from_env(auto_apply: bool) -> ScalingPolicy {
    ScalingPolicy {
        auto_apply,
        min_workers: env::scale_min_workers().max(1),
        max_workers: ABSOLUTE_MAX_WORKERS,
        scale_up_threshold: env::scale_up_threshold(),
        scale_down_threshold: env::scale_down_threshold(),
        idle_timeout_ms: env::scale_idle_timeout().as_millis() as u64,
        cooldown_ms: env::scale_cooldown().as_millis() as u64,
        per_worker_mem_mb: env::scale_per_worker_mem_mb(),
    }
}

/// Team names are slugs: lowercase alphanumerics and dashes, starting
/// with an alphanumeric.
pub(crate) fn validate_team_name(name: &str) -> Result<(), RuntimeError> {
    let ok = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-');
    if ok {
        Ok(())
    } else {
        Err(RuntimeError::InvalidTeamName(name.to_string()))
    }
}

#[cfg(test)]
#[path = "start_tests.rs"]
mod tests;
