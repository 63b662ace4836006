// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake spawner for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{SpawnConfig, Spawner};

/// Spawner whose readiness is scripted.
///
/// With no marker, any capture reads as ready (the default for engine
/// tests that don't exercise the readiness wait). With a marker, only
/// captures containing it do.
#[derive(Clone, Default)]
pub struct FakeSpawner {
    ready_marker: Option<String>,
}

impl FakeSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Readiness requires `marker` in the capture.
    pub fn ready_on(marker: impl Into<String>) -> Self {
        Self {
            ready_marker: Some(marker.into()),
        }
    }
}

impl Spawner for FakeSpawner {
    fn build_command(&self, cfg: &SpawnConfig) -> String {
        format!("TEAM_WORKER={} exec fake-cli", cfg.team_worker())
    }

    fn is_ready(&self, capture: &str) -> bool {
        match &self.ready_marker {
            Some(marker) => capture.contains(marker),
            None => true,
        }
    }

    fn build_env(&self, cfg: &SpawnConfig) -> Vec<(String, String)> {
        vec![("TEAM_WORKER".to_string(), cfg.team_worker())]
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
