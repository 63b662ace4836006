// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-worker output watchers feeding the heartbeat updater.
//!
//! One lightweight task per worker polls its slot's capture tail; when
//! the tail changes, a turn event flows over a channel to a single
//! updater task that rewrites the heartbeat file. Cancellation tears the
//! whole pool down at the next suspension point.

use crate::runtime::TeamRuntime;
use omx_adapters::{Spawner, Transport};
use omx_core::{Clock, IdGen, WorkerName};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Capture poll cadence for turn detection.
const WATCH_POLL: Duration = Duration::from_secs(2);

/// Lines of capture hashed for change detection.
const WATCH_LINES: u32 = 30;

/// Handles for a team's running watchers.
pub struct WatcherPool {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl WatcherPool {
    /// Stop all watchers and wait for them to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

impl<T: Transport, S: Spawner, C: Clock, G: IdGen> TeamRuntime<T, S, C, G> {
    /// Start one watcher per current worker plus the heartbeat updater.
    ///
    /// The pool is static: workers added later get watchers from the
    /// next `spawn_watchers` call (the monitor CLI restarts the pool
    /// when the roster changes).
    pub fn spawn_watchers(&self, parent_cancel: &CancellationToken) -> WatcherPool {
        let cancel = parent_cancel.child_token();
        let (turn_tx, mut turn_rx) = mpsc::channel::<WorkerName>(64);

        let mut handles = Vec::new();

        // Single updater owns all heartbeat writes
        {
            let runtime = self.clone();
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        received = turn_rx.recv() => {
                            let Some(worker) = received else { return };
                            let now = runtime.clock.now_utc();
                            if let Err(e) = runtime.heartbeats.record_turn(&worker, now) {
                                tracing::warn!(team = %runtime.team, %worker, error = %e, "heartbeat update failed");
                            }
                        }
                    }
                }
            }));
        }

        let Some(manifest) = self.manifests.load() else {
            return WatcherPool { cancel, handles };
        };

        for entry in manifest.workers {
            let Some(address) = entry.slot else { continue };
            let runtime = self.clone();
            let cancel = cancel.clone();
            let tx = turn_tx.clone();
            let worker = entry.name.clone();
            handles.push(tokio::spawn(async move {
                let mut last_hash: Option<u64> = None;
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(WATCH_POLL) => {}
                    }
                    let Ok(capture) = runtime.transport.capture(&address, WATCH_LINES).await
                    else {
                        continue;
                    };
                    let mut hasher = DefaultHasher::new();
                    capture.hash(&mut hasher);
                    let hash = hasher.finish();
                    if last_hash.is_some_and(|h| h != hash) {
                        // Output moved since the last poll: one turn
                        if tx.send(worker.clone()).await.is_err() {
                            return;
                        }
                    }
                    last_hash = Some(hash);
                }
            }));
        }

        WatcherPool { cancel, handles }
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
