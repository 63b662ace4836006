// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manifest persistence with optimistic concurrency.
//!
//! Counter allocations (`next_task_id`, `next_worker_index`) go through
//! [`ManifestStore::mutate`], which applies the change and rewrites the
//! whole manifest in one atomic rename, so the counters are non-decreasing
//! across every successful write.

use crate::atomic::{read_json, write_json_atomic, StoreError};
use crate::paths::TeamPaths;
use omx_core::TeamManifest;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("team manifest not found")]
    NotFound,
    #[error("manifest revision conflict after retry")]
    RevisionConflict,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Load/store/mutate for `manifest.v2.json`.
///
/// An in-process mutex serializes mutations from this process; the
/// revision check catches cross-process races (one retry, then error).
#[derive(Clone)]
pub struct ManifestStore {
    paths: TeamPaths,
    write_guard: Arc<Mutex<()>>,
}

impl ManifestStore {
    pub fn new(paths: TeamPaths) -> Self {
        Self {
            paths,
            write_guard: Arc::new(Mutex::new(())),
        }
    }

    /// Read the manifest, applying load-time clamps. `None` when absent
    /// or malformed.
    pub fn load(&self) -> Option<TeamManifest> {
        let mut manifest: TeamManifest = read_json(&self.paths.manifest())?;
        manifest.clamp();
        Some(manifest)
    }

    /// Persist a freshly constructed manifest (team start only).
    pub fn init(&self, manifest: &TeamManifest) -> Result<(), StoreError> {
        write_json_atomic(&self.paths.manifest(), manifest)
    }

    /// Read-modify-write under optimistic concurrency.
    ///
    /// `f` runs against the current manifest; the revision is bumped and
    /// the whole file rewritten atomically. If another writer slipped in
    /// between read and write, the mutation is re-applied once against the
    /// fresh state before giving up.
    pub fn mutate<R>(
        &self,
        mut f: impl FnMut(&mut TeamManifest) -> R,
    ) -> Result<(TeamManifest, R), ManifestError> {
        let _guard = self.write_guard.lock();
        for _attempt in 0..2 {
            let Some(snapshot) = self.load() else {
                return Err(ManifestError::NotFound);
            };
            let mut manifest = snapshot.clone();
            let result = f(&mut manifest);
            // Re-read to detect a cross-process write between load and here
            let current_revision = self.load().map(|m| m.revision);
            if current_revision != Some(snapshot.revision) {
                continue;
            }
            manifest.revision = snapshot.revision + 1;
            write_json_atomic(&self.paths.manifest(), &manifest).map_err(ManifestError::Store)?;
            return Ok((manifest, result));
        }
        Err(ManifestError::RevisionConflict)
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
