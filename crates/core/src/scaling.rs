// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scaling policy, events, and recommendations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-team scaling policy, persisted on the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingPolicy {
    /// Apply high-confidence recommendations without an operator
    #[serde(default)]
    pub auto_apply: bool,
    pub min_workers: u32,
    pub max_workers: u32,
    /// pending/active ratio above which scale-up is recommended
    pub scale_up_threshold: f64,
    /// idle/active ratio above which scale-down is recommended
    pub scale_down_threshold: f64,
    /// How long a worker must sit idle before it counts toward scale-down
    pub idle_timeout_ms: u64,
    /// Minimum spacing between applied scaling actions
    pub cooldown_ms: u64,
    /// Estimated memory footprint per worker, for the resource gate
    pub per_worker_mem_mb: u64,
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self {
            auto_apply: false,
            min_workers: 1,
            max_workers: crate::manifest::ABSOLUTE_MAX_WORKERS,
            scale_up_threshold: 3.0,
            scale_down_threshold: 0.5,
            idle_timeout_ms: 120_000,
            cooldown_ms: 60_000,
            per_worker_mem_mb: 200,
        }
    }
}

/// What a scaling-history entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingAction {
    ScaleUp,
    ScaleDown,
    Recommendation,
}

/// Who initiated the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingTrigger {
    Manual,
    Auto,
}

/// Point-in-time resource and workload numbers attached to scaling records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub cpu_load_1m: f64,
    pub free_mem_mb: u64,
    pub active_workers: u32,
    pub pending_tasks: u32,
    pub idle_workers: u32,
}

/// One entry in `scaling-history.json` (FIFO-evicted at 100 entries).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalingEvent {
    pub timestamp: DateTime<Utc>,
    pub action: ScalingAction,
    pub trigger: ScalingTrigger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers_added: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers_removed: Option<u32>,
    pub reason: String,
    pub resource_snapshot: ResourceSnapshot,
}

/// Which way a recommendation points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleDirection {
    Up,
    Down,
}

/// A structured scale suggestion emitted per monitor tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub direction: ScaleDirection,
    pub count: u32,
    pub reason: String,
    /// Set once the same recommendation held for 3 consecutive ticks
    #[serde(default)]
    pub high_confidence: bool,
}

impl Recommendation {
    /// Streak identity ignores the prose reason.
    pub fn streak_key(&self) -> String {
        format!("{:?}:{}", self.direction, self.count)
    }
}

#[cfg(test)]
#[path = "scaling_tests.rs"]
mod tests;
