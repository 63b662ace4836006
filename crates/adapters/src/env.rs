// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the omx runtime.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn parse_u64(var: &str) -> Option<u64> {
    std::env::var(var).ok().and_then(|s| s.parse().ok())
}

fn parse_f64(var: &str) -> Option<f64> {
    std::env::var(var).ok().and_then(|s| s.parse().ok())
}

fn parse_bool(var: &str) -> Option<bool> {
    match std::env::var(var).ok()?.as_str() {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Transport override: `1`/`tmux` forces the multiplexer, `0`/`process`
/// forces plain child processes. Unset or unrecognized → probe.
pub fn force_transport() -> Option<&'static str> {
    match std::env::var("OMX_FORCE_TRANSPORT").ok()?.as_str() {
        "1" | "tmux" => Some("tmux"),
        "0" | "process" => Some("process"),
        _ => None,
    }
}

/// Explicit model override for every spawned worker; beats inherited
/// leader flags.
pub fn model_override() -> Option<String> {
    std::env::var("OMX_MODEL").ok().filter(|s| !s.is_empty())
}

/// Shell rc file sourced before each worker CLI is exec'd.
pub fn shell_rc() -> Option<std::path::PathBuf> {
    std::env::var("OMX_SHELL_RC")
        .ok()
        .filter(|s| !s.is_empty())
        .map(std::path::PathBuf::from)
}

/// Worker readiness wait budget (default: 45s).
pub fn ready_timeout() -> Duration {
    parse_duration_ms("OMX_READY_TIMEOUT_MS").unwrap_or(Duration::from_secs(45))
}

/// Leader nudge threshold: team-wide inactivity before a
/// `team_leader_nudge` event (default: 120s).
pub fn leader_nudge() -> Duration {
    parse_duration_ms("OMX_LEADER_NUDGE_MS").unwrap_or(Duration::from_secs(120))
}

/// Task claim lease (default: 15m).
pub fn claim_lease() -> Duration {
    parse_duration_ms("OMX_CLAIM_LEASE_MS").unwrap_or(Duration::from_secs(900))
}

/// Shutdown ack grace budget (default: 15s).
pub fn shutdown_grace() -> Duration {
    parse_duration_ms("OMX_SHUTDOWN_GRACE_MS").unwrap_or(Duration::from_secs(15))
}

/// Scale-down drain budget before a warning event (default: 5m).
pub fn drain_timeout() -> Duration {
    parse_duration_ms("OMX_DRAIN_TIMEOUT_MS").unwrap_or(Duration::from_secs(300))
}

/// Whether auto-apply of scaling recommendations starts enabled.
pub fn auto_scale() -> bool {
    parse_bool("OMX_AUTO_SCALE").unwrap_or(false)
}

/// CPU ceiling for scale-up, in percent (default: 80).
pub fn scale_max_cpu_percent() -> f64 {
    parse_f64("OMX_SCALE_MAX_CPU_PERCENT").unwrap_or(80.0)
}

/// Free-memory floor for scale-up, in MB (default: 512).
pub fn scale_min_free_mem_mb() -> u64 {
    parse_u64("OMX_SCALE_MIN_FREE_MEM_MB").unwrap_or(512)
}

/// Cooldown between applied scaling actions (default: 60s).
pub fn scale_cooldown() -> Duration {
    parse_duration_ms("OMX_SCALE_COOLDOWN_MS").unwrap_or(Duration::from_secs(60))
}

/// pending/active ratio that triggers a scale-up recommendation
/// (default: 3.0).
pub fn scale_up_threshold() -> f64 {
    parse_f64("OMX_SCALE_UP_THRESHOLD").unwrap_or(3.0)
}

/// idle/active ratio that triggers a scale-down recommendation
/// (default: 0.5).
pub fn scale_down_threshold() -> f64 {
    parse_f64("OMX_SCALE_DOWN_THRESHOLD").unwrap_or(0.5)
}

/// How long a worker must be idle before counting toward scale-down
/// (default: 120s).
pub fn scale_idle_timeout() -> Duration {
    parse_duration_ms("OMX_SCALE_IDLE_TIMEOUT_MS").unwrap_or(Duration::from_secs(120))
}

/// Scale-down floor (default: 1).
pub fn scale_min_workers() -> u32 {
    parse_u64("OMX_SCALE_MIN_WORKERS").unwrap_or(1) as u32
}

/// Estimated memory per worker for the resource gate, in MB
/// (default: 200).
pub fn scale_per_worker_mem_mb() -> u64 {
    parse_u64("OMX_SCALE_PER_WORKER_MEM_MB").unwrap_or(200)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
