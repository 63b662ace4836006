// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shutdown request/ack rendezvous files.

use crate::atomic::{read_json, write_json_atomic, StoreError};
use crate::paths::TeamPaths;
use chrono::{DateTime, Utc};
use omx_core::{AckStatus, ShutdownAck, ShutdownRequest, WorkerName};

/// Access to `shutdown-request.json` / `shutdown-ack.json` per worker.
///
/// The request timestamp is written before any ack read begins, and a
/// reader must supply that timestamp so acks left over from a previous
/// run are never mistaken for an answer.
#[derive(Clone)]
pub struct SignalStore {
    paths: TeamPaths,
}

impl SignalStore {
    pub fn new(paths: TeamPaths) -> Self {
        Self { paths }
    }

    /// Write the shutdown request and return its timestamp for ack
    /// freshness checks.
    pub fn request_shutdown(
        &self,
        worker: &WorkerName,
        requested_by: &str,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, StoreError> {
        let request = ShutdownRequest {
            requested_by: requested_by.to_string(),
            requested_at: now,
        };
        write_json_atomic(&self.paths.shutdown_request(worker), &request)?;
        Ok(now)
    }

    pub fn read_request(&self, worker: &WorkerName) -> Option<ShutdownRequest> {
        read_json(&self.paths.shutdown_request(worker))
    }

    /// Worker-side answer. Overwrites any previous ack.
    pub fn write_ack(
        &self,
        worker: &WorkerName,
        status: AckStatus,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let ack = ShutdownAck {
            status,
            reason,
            updated_at: now,
        };
        write_json_atomic(&self.paths.shutdown_ack(worker), &ack)
    }

    /// The current ack, only if written at or after `min_updated_at`.
    pub fn read_ack_with_min(
        &self,
        worker: &WorkerName,
        min_updated_at: DateTime<Utc>,
    ) -> Option<ShutdownAck> {
        let ack: ShutdownAck = read_json(&self.paths.shutdown_ack(worker))?;
        ack.is_fresh(min_updated_at).then_some(ack)
    }

    /// Remove both rendezvous files (after the worker is gone).
    pub fn clear(&self, worker: &WorkerName) {
        let _ = std::fs::remove_file(self.paths.shutdown_request(worker));
        let _ = std::fs::remove_file(self.paths.shutdown_ack(worker));
    }
}

#[cfg(test)]
#[path = "signals_tests.rs"]
mod tests;
