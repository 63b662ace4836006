// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting shared by the team commands.

use clap::ValueEnum;
use omx_core::{MonitorSnapshot, WorkerState};

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Team uptime for the status header: two units at most, largest first
/// (`"45s"`, `"3m"`, `"1h1m"`, `"2d4h"`).
pub fn format_uptime(secs: u64) -> String {
    let days = secs / DAY;
    let hours = (secs % DAY) / HOUR;
    let minutes = (secs % HOUR) / MINUTE;
    if days > 0 {
        format!("{}d{}h", days, hours)
    } else if hours > 0 && minutes > 0 {
        format!("{}h{}m", hours, minutes)
    } else if hours > 0 {
        format!("{}h", hours)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", secs)
    }
}

/// The human status block. The `tasks:` line is a contract: downstream
/// automation matches those tokens exactly.
pub fn render_status(snapshot: &MonitorSnapshot, active_workers: u32, uptime_secs: u64) -> String {
    let idle = snapshot
        .workers
        .values()
        .filter(|s| **s == WorkerState::Idle)
        .count();
    let working = snapshot
        .workers
        .values()
        .filter(|s| **s == WorkerState::Working)
        .count();
    let mut out = format!(
        "team {} (up {}): phase {}, workers {} active ({} idle, {} working), {} dead\n",
        snapshot.team,
        format_uptime(uptime_secs),
        snapshot.phase,
        active_workers,
        idle,
        working,
        snapshot.dead_workers.len()
    );
    out.push_str(&snapshot.task_counts.status_line());
    for rec in &snapshot.recommendations {
        let direction = match rec.direction {
            omx_core::ScaleDirection::Up => "scale_up",
            omx_core::ScaleDirection::Down => "scale_down",
        };
        let confidence = if rec.high_confidence {
            " [high confidence]"
        } else {
            ""
        };
        out.push_str(&format!(
            "\nrecommendation: {} {} ({}){}",
            direction, rec.count, rec.reason, confidence
        ));
    }
    out
}

/// One structured line per monitor tick.
pub fn render_tick(report: &omx_engine::TickReport) -> String {
    format!(
        "tick phase={} {} dead={} swept={} notified={} nudged={}",
        report.snapshot.phase,
        report.snapshot.task_counts.status_line(),
        report.snapshot.dead_workers.len(),
        report.swept.len(),
        report.notified,
        report.nudged
    )
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
