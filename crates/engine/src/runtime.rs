// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The composition root: one `TeamRuntime` per team, generic over the
//! transport, spawner, clock, and id generator.

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use omx_adapters::{Spawner, Transport};
use omx_core::{Clock, IdGen, SystemClock, TeamManifest, UuidIdGen};
use omx_storage::{
    ApprovalStore, EventLog, HeartbeatStore, Mailbox, ManifestStore, ScalingHistory, ScalingLock,
    SignalStore, SnapshotStore, TaskStore, TeamPaths, WorkerStore,
};
use std::path::PathBuf;

/// Per-team runtime. Cheap to clone; all state lives on disk under the
/// team state root, in-memory state is limited to adapter handles.
#[derive(Clone)]
pub struct TeamRuntime<T: Transport, S: Spawner, C: Clock = SystemClock, G: IdGen = UuidIdGen> {
    pub(crate) project_root: PathBuf,
    pub(crate) team: String,
    pub(crate) transport: T,
    pub(crate) spawner: S,
    pub(crate) clock: C,
    pub(crate) idgen: G,
    pub(crate) config: RuntimeConfig,
    pub(crate) paths: TeamPaths,
    pub(crate) manifests: ManifestStore,
    pub(crate) tasks: TaskStore,
    pub(crate) mailbox: Mailbox,
    pub(crate) events: EventLog,
    pub(crate) heartbeats: HeartbeatStore,
    pub(crate) signals: SignalStore,
    pub(crate) workers: WorkerStore,
    pub(crate) history: ScalingHistory,
    pub(crate) snapshots: SnapshotStore,
    pub(crate) approvals: ApprovalStore,
    pub(crate) scaling_lock: ScalingLock,
}

impl<T: Transport, S: Spawner> TeamRuntime<T, S> {
    /// Production wiring: system clock, UUID ids, env-derived config.
    pub fn new(project_root: PathBuf, team: impl Into<String>, transport: T, spawner: S) -> Self {
        Self::with_parts(
            project_root,
            team,
            transport,
            spawner,
            SystemClock,
            UuidIdGen,
            RuntimeConfig::from_env(),
        )
    }
}

impl<T: Transport, S: Spawner, C: Clock, G: IdGen> TeamRuntime<T, S, C, G> {
    pub fn with_parts(
        project_root: PathBuf,
        team: impl Into<String>,
        transport: T,
        spawner: S,
        clock: C,
        idgen: G,
        config: RuntimeConfig,
    ) -> Self {
        let team = team.into();
        let paths = TeamPaths::new(&project_root, &team);
        Self {
            manifests: ManifestStore::new(paths.clone()),
            tasks: TaskStore::new(paths.clone()),
            mailbox: Mailbox::new(paths.clone()),
            events: EventLog::new(paths.clone(), team.clone()),
            heartbeats: HeartbeatStore::new(paths.clone()),
            signals: SignalStore::new(paths.clone()),
            workers: WorkerStore::new(paths.clone()),
            history: ScalingHistory::new(paths.clone()),
            snapshots: SnapshotStore::new(paths.clone()),
            approvals: ApprovalStore::new(paths.clone()),
            scaling_lock: ScalingLock::new(paths.clone()),
            paths,
            project_root,
            team,
            transport,
            spawner,
            clock,
            idgen,
            config,
        }
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn paths(&self) -> &TeamPaths {
        &self.paths
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn tasks(&self) -> &omx_storage::TaskStore {
        &self.tasks
    }

    pub fn mailbox(&self) -> &omx_storage::Mailbox {
        &self.mailbox
    }

    pub fn events(&self) -> &omx_storage::EventLog {
        &self.events
    }

    pub fn snapshots(&self) -> &omx_storage::SnapshotStore {
        &self.snapshots
    }

    pub fn worker_store(&self) -> &omx_storage::WorkerStore {
        &self.workers
    }

    pub fn history(&self) -> &omx_storage::ScalingHistory {
        &self.history
    }

    /// Load the manifest or report the team missing.
    pub fn require_manifest(&self) -> Result<TeamManifest, RuntimeError> {
        self.manifests
            .load()
            .ok_or_else(|| RuntimeError::TeamNotFound(self.team.clone()))
    }

    /// Whether any state exists for this team.
    pub fn exists(&self) -> bool {
        self.manifests.load().is_some()
    }
}
