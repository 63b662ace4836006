// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker identity and status files.

use crate::atomic::{read_json, write_json_atomic, StoreError};
use crate::paths::TeamPaths;
use omx_core::{WorkerIdentity, WorkerName, WorkerStatus};

/// Access to `workers/<name>/{identity,status}.json`.
#[derive(Clone)]
pub struct WorkerStore {
    paths: TeamPaths,
}

impl WorkerStore {
    pub fn new(paths: TeamPaths) -> Self {
        Self { paths }
    }

    pub fn write_identity(&self, identity: &WorkerIdentity) -> Result<(), StoreError> {
        write_json_atomic(&self.paths.worker_identity(&identity.name), identity)
    }

    pub fn read_identity(&self, name: &WorkerName) -> Option<WorkerIdentity> {
        read_json(&self.paths.worker_identity(name))
    }

    pub fn write_status(&self, name: &WorkerName, status: &WorkerStatus) -> Result<(), StoreError> {
        write_json_atomic(&self.paths.worker_status(name), status)
    }

    pub fn read_status(&self, name: &WorkerName) -> Option<WorkerStatus> {
        read_json(&self.paths.worker_status(name))
    }

    pub fn write_inbox(&self, name: &WorkerName, content: &str) -> Result<(), StoreError> {
        let path = self.paths.worker_inbox(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn read_inbox(&self, name: &WorkerName) -> Option<String> {
        std::fs::read_to_string(self.paths.worker_inbox(name)).ok()
    }

    /// Worker directories present on disk, sorted by index.
    pub fn list(&self) -> Vec<WorkerName> {
        let Ok(entries) = std::fs::read_dir(self.paths.workers_dir()) else {
            return Vec::new();
        };
        let mut names: Vec<WorkerName> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .map(|e| WorkerName::new(e.file_name().to_string_lossy().into_owned()))
            .collect();
        names.sort_by_key(|n| n.index().unwrap_or(u32::MAX));
        names
    }

    /// Remove one worker's subtree (scale-down removal).
    pub fn remove(&self, name: &WorkerName) -> Result<(), StoreError> {
        let dir = self.paths.worker_dir(name);
        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        let _ = std::fs::remove_file(self.paths.mailbox(name.as_str()));
        Ok(())
    }
}

#[cfg(test)]
#[path = "workers_tests.rs"]
mod tests;
