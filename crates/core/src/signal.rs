// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shutdown request/ack rendezvous records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Written by the coordinator to `workers/<name>/shutdown-request.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownRequest {
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
}

/// Worker's answer to a shutdown request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    Accept,
    Reject,
}

/// Written by the worker to `workers/<name>/shutdown-ack.json` (overwritten
/// on every answer; a reader must check freshness against the request it
/// issued, or it may act on an ack left over from a previous run).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownAck {
    pub status: AckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ShutdownAck {
    pub fn accept(updated_at: DateTime<Utc>) -> Self {
        Self {
            status: AckStatus::Accept,
            reason: None,
            updated_at,
        }
    }

    pub fn reject(reason: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            status: AckStatus::Reject,
            reason: Some(reason.into()),
            updated_at,
        }
    }

    /// An ack answers a request only when written at or after it.
    pub fn is_fresh(&self, min_updated_at: DateTime<Utc>) -> bool {
        self.updated_at >= min_updated_at
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
