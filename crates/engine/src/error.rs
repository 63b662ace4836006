// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the team runtime

use omx_adapters::TransportError;
use omx_storage::{ManifestError, StoreError};
use thiserror::Error;

/// Fatal (for the operation) runtime errors. Expected conditions — gate
/// blocked, claim conflict, resource denial — are outcome variants on
/// the respective operations, not errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("team not found: {0}")]
    TeamNotFound(String),
    #[error("team already exists: {0}")]
    TeamExists(String),
    #[error("invalid team name: {0}")]
    InvalidTeamName(String),
    #[error("worker not found: {0}")]
    WorkerNotFound(String),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("operation cancelled")]
    Cancelled,
}
