// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Filesystem-backed state for omx teams.
//!
//! Every persisted entity is a JSON file under the per-team state root;
//! all writes go through the atomic write-temp-then-rename primitive and
//! readers tolerate missing or malformed files by returning `None`.

mod approvals;
mod atomic;
mod events;
mod heartbeat;
mod history;
mod lock;
mod mailbox;
mod manifest;
mod paths;
mod signals;
mod tasks;
mod workers;

pub use approvals::{ApprovalDecision, ApprovalRecord, ApprovalStore};
pub use atomic::{append_line, ensure_dir, read_json, write_json_atomic, StoreError};
pub use events::EventLog;
pub use heartbeat::HeartbeatStore;
pub use history::{ScalingHistory, SnapshotStore, SCALING_HISTORY_CAP};
pub use lock::{LockError, ScalingLock, ScalingLockGuard, LOCK_STALE_AFTER};
pub use mailbox::Mailbox;
pub use manifest::{ManifestError, ManifestStore};
pub use paths::{list_teams, TeamPaths, STATE_DIR};
pub use signals::SignalStore;
pub use tasks::{
    ClaimOutcome, NewTask, Readiness, ReleaseOutcome, TaskPatch, TaskStore, TransitionOutcome,
    UpdateOutcome,
};
pub use workers::WorkerStore;
