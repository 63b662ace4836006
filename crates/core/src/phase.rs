// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coarse team lifecycle phase, derived from task counts.

use crate::snapshot::TaskCounts;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Team phase. Moves forward only; `complete` is terminal and `team-fix`
/// branches off exec/verify when terminal tasks include failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TeamPhase {
    Start,
    TeamPrd,
    TeamExec,
    TeamVerify,
    TeamFix,
    Complete,
}

impl std::fmt::Display for TeamPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamPhase::Start => write!(f, "start"),
            TeamPhase::TeamPrd => write!(f, "team-prd"),
            TeamPhase::TeamExec => write!(f, "team-exec"),
            TeamPhase::TeamVerify => write!(f, "team-verify"),
            TeamPhase::TeamFix => write!(f, "team-fix"),
            TeamPhase::Complete => write!(f, "complete"),
        }
    }
}

impl TeamPhase {
    fn rank(self) -> u8 {
        match self {
            TeamPhase::Start => 0,
            TeamPhase::TeamPrd => 1,
            TeamPhase::TeamExec => 2,
            // The fix branch sits beside verify in the ordering
            TeamPhase::TeamVerify | TeamPhase::TeamFix => 3,
            TeamPhase::Complete => 4,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == TeamPhase::Complete
    }

    /// Forward-only transition legality.
    ///
    /// The fix branch is reachable from exec and verify, and leaves toward
    /// verify or complete. Nothing leaves `complete`.
    pub fn can_advance_to(self, next: TeamPhase) -> bool {
        if self == next {
            return false;
        }
        match (self, next) {
            (TeamPhase::Complete, _) => false,
            (TeamPhase::TeamExec | TeamPhase::TeamVerify, TeamPhase::TeamFix) => true,
            (TeamPhase::TeamFix, TeamPhase::TeamVerify | TeamPhase::Complete) => true,
            (TeamPhase::TeamFix, _) => false,
            (_, TeamPhase::TeamFix) => false,
            (from, to) => to.rank() > from.rank(),
        }
    }

    /// Reconcile the phase against observed task counts.
    ///
    /// All tasks terminal with no failures → complete; all terminal with at
    /// least one failure → team-fix; anything else keeps the current phase.
    /// An illegal derived move (e.g. complete → team-fix) is ignored.
    pub fn derive(current: TeamPhase, counts: &TaskCounts) -> TeamPhase {
        if counts.total() == 0 {
            return current;
        }
        let derived = if counts.all_terminal() {
            if counts.failed == 0 {
                TeamPhase::Complete
            } else {
                TeamPhase::TeamFix
            }
        } else {
            return current;
        };
        if current == derived || current.can_advance_to(derived) {
            derived
        } else {
            current
        }
    }
}

/// One recorded phase change on the monitor snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: TeamPhase,
    pub to: TeamPhase,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "phase_tests.rs"]
mod tests;
