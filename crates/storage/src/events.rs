// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only NDJSON event log.

use crate::atomic::{append_line, StoreError};
use crate::paths::TeamPaths;
use omx_core::TeamEvent;
use std::io::BufRead;

/// `events.ndjson` access. Writers append; readers scan forward and
/// never block a writer.
#[derive(Clone)]
pub struct EventLog {
    paths: TeamPaths,
    team: String,
}

impl EventLog {
    pub fn new(paths: TeamPaths, team: impl Into<String>) -> Self {
        Self {
            paths,
            team: team.into(),
        }
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn append(&self, event: &TeamEvent) -> Result<(), StoreError> {
        let line = serde_json::to_string(event)?;
        append_line(&self.paths.events(), &line)
    }

    /// All events in write order, skipping unparseable lines.
    pub fn read_all(&self) -> Vec<TeamEvent> {
        let Ok(file) = std::fs::File::open(self.paths.events()) else {
            return Vec::new();
        };
        std::io::BufReader::new(file)
            .lines()
            .filter_map(|line| line.ok())
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(&line).ok())
            .collect()
    }

    /// The last `n` events in write order.
    pub fn tail(&self, n: usize) -> Vec<TeamEvent> {
        let mut events = self.read_all();
        let skip = events.len().saturating_sub(n);
        events.drain(..skip);
        events
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
