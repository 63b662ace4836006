// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-based advisory lock for scaling operations.

use crate::atomic::read_json;
use crate::paths::TeamPaths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A lock older than this may be stolen with a warning.
pub const LOCK_STALE_AFTER: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Error)]
pub enum LockError {
    #[error("scaling lock held by pid {pid} since {acquired_at}")]
    Busy {
        pid: u32,
        acquired_at: DateTime<Utc>,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct LockContent {
    pid: u32,
    acquired_at: DateTime<Utc>,
}

/// Holder of `scaling.lock`. Released on drop (best effort) or via
/// [`ScalingLockGuard::release`].
#[derive(Debug)]
pub struct ScalingLockGuard {
    path: PathBuf,
    released: bool,
}

impl ScalingLockGuard {
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if !self.released {
            self.released = true;
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

impl Drop for ScalingLockGuard {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Acquisition interface for `scaling.lock`.
#[derive(Clone)]
pub struct ScalingLock {
    paths: TeamPaths,
}

impl ScalingLock {
    pub fn new(paths: TeamPaths) -> Self {
        Self { paths }
    }

    /// Try to take the lock. A stale holder (older than
    /// [`LOCK_STALE_AFTER`]) is stolen with a warning; a live holder
    /// returns [`LockError::Busy`]. The boolean reports whether a stale
    /// lock was recovered.
    pub fn acquire(&self, now: DateTime<Utc>) -> Result<(ScalingLockGuard, bool), LockError> {
        let path = self.paths.scaling_lock();
        match self.try_create(&path, now) {
            Ok(guard) => Ok((guard, false)),
            Err(LockError::Busy { pid, acquired_at }) => {
                let age = now.signed_duration_since(acquired_at);
                if age.num_seconds() >= LOCK_STALE_AFTER.as_secs() as i64 {
                    tracing::warn!(
                        pid,
                        %acquired_at,
                        "stealing stale scaling lock"
                    );
                    let _ = std::fs::remove_file(&path);
                    let guard = self.try_create(&path, now)?;
                    Ok((guard, true))
                } else {
                    Err(LockError::Busy { pid, acquired_at })
                }
            }
            Err(e) => Err(e),
        }
    }

    fn try_create(
        &self,
        path: &std::path::Path,
        now: DateTime<Utc>,
    ) -> Result<ScalingLockGuard, LockError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(mut file) => {
                let content = LockContent {
                    pid: std::process::id(),
                    acquired_at: now,
                };
                file.write_all(&serde_json::to_vec(&content)?)?;
                Ok(ScalingLockGuard {
                    path: path.to_path_buf(),
                    released: false,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // A holder whose content is unreadable counts as stale-at-epoch
                let holder: Option<LockContent> = read_json(path);
                let (pid, acquired_at) = holder
                    .map(|c| (c.pid, c.acquired_at))
                    .unwrap_or((0, DateTime::<Utc>::MIN_UTC));
                Err(LockError::Busy { pid, acquired_at })
            }
            Err(e) => Err(LockError::Io(e)),
        }
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
