// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical path layout under the per-team state root.
//!
//! No other module builds team-relative paths by hand.

use omx_core::{TaskId, WorkerName};
use std::path::{Path, PathBuf};

/// Directory under the project root holding all team state.
pub const STATE_DIR: &str = ".omx/state/team";

/// Path accessors for one team's state subtree.
#[derive(Debug, Clone)]
pub struct TeamPaths {
    root: PathBuf,
}

impl TeamPaths {
    pub fn new(project_root: &Path, team: &str) -> Self {
        Self {
            root: project_root.join(STATE_DIR).join(team),
        }
    }

    /// The team state root itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> PathBuf {
        self.root.join("manifest.v2.json")
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join("tasks")
    }

    pub fn task(&self, id: &TaskId) -> PathBuf {
        self.tasks_dir().join(format!("{}.json", id))
    }

    pub fn workers_dir(&self) -> PathBuf {
        self.root.join("workers")
    }

    pub fn worker_dir(&self, name: &WorkerName) -> PathBuf {
        self.workers_dir().join(name.as_str())
    }

    pub fn worker_identity(&self, name: &WorkerName) -> PathBuf {
        self.worker_dir(name).join("identity.json")
    }

    pub fn worker_heartbeat(&self, name: &WorkerName) -> PathBuf {
        self.worker_dir(name).join("heartbeat.json")
    }

    pub fn worker_status(&self, name: &WorkerName) -> PathBuf {
        self.worker_dir(name).join("status.json")
    }

    pub fn worker_inbox(&self, name: &WorkerName) -> PathBuf {
        self.worker_dir(name).join("inbox.md")
    }

    pub fn shutdown_request(&self, name: &WorkerName) -> PathBuf {
        self.worker_dir(name).join("shutdown-request.json")
    }

    pub fn shutdown_ack(&self, name: &WorkerName) -> PathBuf {
        self.worker_dir(name).join("shutdown-ack.json")
    }

    pub fn mailbox_dir(&self) -> PathBuf {
        self.root.join("mailbox")
    }

    pub fn mailbox(&self, worker: &str) -> PathBuf {
        self.mailbox_dir().join(format!("{}.json", worker))
    }

    pub fn events(&self) -> PathBuf {
        self.root.join("events.ndjson")
    }

    pub fn approvals_dir(&self) -> PathBuf {
        self.root.join("approvals")
    }

    pub fn approval(&self, task_id: &TaskId) -> PathBuf {
        self.approvals_dir().join(format!("{}.json", task_id))
    }

    pub fn monitor_snapshot(&self) -> PathBuf {
        self.root.join("monitor.snapshot.json")
    }

    pub fn scaling_history(&self) -> PathBuf {
        self.root.join("scaling-history.json")
    }

    pub fn scaling_lock(&self) -> PathBuf {
        self.root.join("scaling.lock")
    }
}

/// List the team names that currently have a state subtree.
pub fn list_teams(project_root: &Path) -> Vec<String> {
    let dir = project_root.join(STATE_DIR);
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut teams: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    teams.sort();
    teams
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
