// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-demand resource sampling for scale-up gating.
//!
//! A cheap read of the 1-minute load average and available memory, not a
//! daemon. When the platform offers neither, sampling returns `None` and
//! the resource gate waves the request through.

use omx_core::ResourceLimits;

/// Point-in-time host resources.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSample {
    pub cpu_load_1m: f64,
    pub free_mem_mb: u64,
}

/// Sample the host. Linux `/proc` backed; other platforms return `None`.
pub fn sample() -> Option<ResourceSample> {
    let cpu_load_1m = read_loadavg("/proc/loadavg")?;
    let free_mem_mb = read_available_mem_mb("/proc/meminfo")?;
    Some(ResourceSample {
        cpu_load_1m,
        free_mem_mb,
    })
}

/// 1-minute load as a percentage of available cores.
pub fn cpu_percent(load_1m: f64) -> f64 {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1) as f64;
    load_1m / cores * 100.0
}

/// How many new workers the free-memory headroom allows:
/// `floor((free − min_free) / per_worker)`.
pub fn workers_allowed(
    sample: &ResourceSample,
    limits: &ResourceLimits,
    per_worker_mem_mb: u64,
) -> u32 {
    if per_worker_mem_mb == 0 {
        return u32::MAX;
    }
    let headroom = sample.free_mem_mb.saturating_sub(limits.min_free_mem_mb);
    (headroom / per_worker_mem_mb) as u32
}

fn read_loadavg(path: &str) -> Option<f64> {
    let content = std::fs::read_to_string(path).ok()?;
    content.split_whitespace().next()?.parse().ok()
}

fn read_available_mem_mb(path: &str) -> Option<u64> {
    let content = std::fs::read_to_string(path).ok()?;
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("MemAvailable:") {
            let kb: u64 = rest
                .trim()
                .trim_end_matches("kB")
                .trim()
                .parse()
                .ok()?;
            return Some(kb / 1024);
        }
    }
    None
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod tests;
