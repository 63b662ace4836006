// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic file primitives: write-temp-then-rename, tolerant reads.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors from mutating store operations. Reads never produce these;
/// absence and corruption both read as `None`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Create a directory (and parents) if it does not exist. Idempotent.
pub fn ensure_dir(path: &Path) -> Result<(), StoreError> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Serialize `value` and atomically replace `path` with it.
///
/// The temp file lives in the same directory as the target so the final
/// `rename` stays within one filesystem.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Read and parse a JSON file.
///
/// Missing files return `None`. Malformed content is treated as missing,
/// with a warning logged at most once per (type, minute) so a corrupt file
/// cannot flood the log from a polling loop.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn_rate_limited(std::any::type_name::<T>(), || {
                tracing::warn!(path = %path.display(), error = %e, "state file unreadable");
            });
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn_rate_limited(std::any::type_name::<T>(), || {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "malformed state file, treating as missing"
                );
            });
            None
        }
    }
}

/// Append one line (newline added) to an NDJSON-style file, creating it
/// if needed.
pub fn append_line(path: &Path, line: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}

static WARN_STAMPS: Mutex<Option<HashMap<&'static str, Instant>>> = Mutex::new(None);

const WARN_INTERVAL: Duration = Duration::from_secs(60);

fn warn_rate_limited(key: &'static str, warn: impl FnOnce()) {
    let mut stamps = WARN_STAMPS.lock();
    let map = stamps.get_or_insert_with(HashMap::new);
    let now = Instant::now();
    let due = map
        .get(key)
        .map(|last| now.duration_since(*last) >= WARN_INTERVAL)
        .unwrap_or(true);
    if due {
        map.insert(key, now);
        warn();
    }
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
