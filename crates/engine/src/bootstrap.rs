// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker bootstrap: identity, slot, heartbeat, inbox, readiness.

use crate::error::RuntimeError;
use crate::runtime::TeamRuntime;
use omx_adapters::{SlotSpec, SpawnConfig, Spawner, Transport};
use omx_core::{
    Clock, EventId, EventKind, Heartbeat, IdGen, Task, TeamEvent, WorkerIdentity, WorkerName,
    WorkerStatus,
};
use omx_storage::ensure_dir;
use tokio_util::sync::CancellationToken;

/// How a single worker bootstrap ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Worker reached its interactive prompt and was triggered
    Ready { worker: WorkerName, slot: String },
    /// Worker never became ready; marked failed, team continues
    ReadyTimeout { worker: WorkerName },
}

impl<T: Transport, S: Spawner, C: Clock, G: IdGen> TeamRuntime<T, S, C, G> {
    /// Bootstrap one worker into the team session.
    ///
    /// Steps, in order: allocate name/index on the manifest; create the
    /// worker directory with identity and an empty signal file; add a
    /// transport slot and record its address; write heartbeat and idle
    /// status; write the inbox overlay; send the spawner command and wait
    /// for readiness; trigger initial inbox consumption.
    pub async fn bootstrap_worker(
        &self,
        session: &str,
        agent_type: &str,
        cancel: &CancellationToken,
    ) -> Result<BootstrapOutcome, RuntimeError> {
        let now = self.clock.now_utc();

        // 1. Allocate identity on the manifest (single atomic rewrite)
        let (_, entry) = self
            .manifests
            .mutate(|m| m.alloc_worker(agent_type.to_string()))?;
        let name = entry.name.clone();
        tracing::info!(team = %self.team, worker = %name, agent_type, "bootstrapping worker");

        // 2. Worker directory, identity, empty signal file
        ensure_dir(&self.paths.worker_dir(&name))?;
        let mut identity = WorkerIdentity {
            name: name.clone(),
            index: entry.index,
            role: agent_type.to_string(),
            slot: None,
        };
        self.workers.write_identity(&identity)?;
        std::fs::write(self.paths.shutdown_request(&name), b"").map_err(omx_storage::StoreError::from)?;

        // 3. Transport slot; the spawner command is sent as text below,
        // so the slot starts as a plain login shell
        let spawn_cfg = self.spawn_config(&name, agent_type);
        let slot_spec = SlotSpec {
            title: name.to_string(),
            cwd: self.project_root.clone(),
            command: String::new(),
            env: self.spawner.build_env(&spawn_cfg),
        };
        let address = self.transport.add_slot(session, &slot_spec).await?;
        identity.slot = Some(address.clone());
        self.workers.write_identity(&identity)?;
        self.manifests.mutate(|m| {
            if let Some(w) = m.worker_mut(&name) {
                w.slot = Some(address.clone());
            }
        })?;

        // 4. Heartbeat and status
        let pid = self.transport.slot_pid(&address).await.unwrap_or(None);
        self.heartbeats
            .write(&name, &Heartbeat::new(pid.unwrap_or(0), now))?;
        self.workers.write_status(&name, &WorkerStatus::idle(now))?;

        // 5. Inbox: instructions overlay plus this worker's initial tasks
        let pending = self.tasks.list();
        let inbox = render_inbox(&self.team, &name, agent_type, &pending);
        self.workers.write_inbox(&name, &inbox)?;

        // 6. Launch the CLI and wait for its prompt
        let command = self.spawner.build_command(&spawn_cfg);
        self.transport.send_text(&address, &command).await?;
        self.transport.send_trigger(&address).await?;

        if !self.wait_ready(&address, cancel).await? {
            tracing::warn!(team = %self.team, worker = %name, "worker never became ready");
            self.workers.write_status(
                &name,
                &WorkerStatus::failed("ready_timeout", self.clock.now_utc()),
            )?;
            self.events.append(
                &TeamEvent::new(
                    EventId::new(self.idgen.next()),
                    &self.team,
                    EventKind::WorkerStopped,
                    self.clock.now_utc(),
                )
                .with_worker(name.as_str())
                .with_reason("ready_timeout"),
            )?;
            return Ok(BootstrapOutcome::ReadyTimeout { worker: name });
        }

        // 7. Nudge the CLI to consume its inbox
        self.transport.send_trigger(&address).await?;

        Ok(BootstrapOutcome::Ready {
            worker: name,
            slot: address,
        })
    }

    pub(crate) fn spawn_config(&self, worker: &WorkerName, agent_type: &str) -> SpawnConfig {
        let mut cfg = SpawnConfig::new(
            self.team.clone(),
            worker.to_string(),
            self.project_root.clone(),
        );
        cfg.agent_type = agent_type.to_string();
        cfg.shell_rc = self.config.shell_rc.clone();
        cfg.inherited_args = self.config.inherited_args.clone();
        cfg.model_override = self.config.model_override.clone();
        cfg
    }

    /// Re-capture every `ready_poll` until the spawner reports the CLI
    /// at its prompt, up to `ready_timeout`. Returns whether it made it.
    async fn wait_ready(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, RuntimeError> {
        let deadline = std::time::Instant::now() + self.config.ready_timeout;
        loop {
            if cancel.is_cancelled() {
                return Err(RuntimeError::Cancelled);
            }
            if let Ok(capture) = self.transport.capture(address, 50).await {
                if self.spawner.is_ready(&capture) {
                    return Ok(true);
                }
            }
            if std::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(self.config.ready_poll).await;
        }
    }
}

/// The inbox overlay: how to participate in the team, plus the initial
/// task list (ids and subjects only; full bodies stay in the task store).
pub(crate) fn render_inbox(
    team: &str,
    worker: &WorkerName,
    role: &str,
    tasks: &[Task],
) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Team inbox — {}/{}\n\n", team, worker));
    out.push_str(&format!(
        "You are `{}`, a {} on team `{}`.\n\n",
        worker, role, team
    ));
    out.push_str("## Protocol\n\n");
    out.push_str(&format!(
        "- Team state lives under `.omx/state/team/{}/`.\n",
        team
    ));
    out.push_str(
        "- Claim exactly one pending task at a time; work it to completion \
         before claiming another.\n",
    );
    out.push_str(&format!(
        "- Report progress and questions by appending to your teammates' \
         mailboxes under `mailbox/`; your own inbox is `mailbox/{}.json`.\n",
        worker
    ));
    out.push_str(&format!(
        "- When `workers/{}/shutdown-request.json` appears, finish the \
         current step, write the ack file beside it, and exit.\n\n",
        worker
    ));
    out.push_str("## Initial tasks\n\n");
    if tasks.is_empty() {
        out.push_str("(none yet — watch the task store)\n");
    } else {
        for task in tasks {
            out.push_str(&format!("- [ ] {}: {}\n", task.id, task.subject));
        }
    }
    out
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
