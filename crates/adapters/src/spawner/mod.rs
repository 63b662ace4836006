// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI-specific worker spawners.
//!
//! A spawner knows how to build the shell command that launches one
//! worker's agent CLI, how to tell from a capture tail whether that CLI
//! has reached its interactive prompt, and which environment overlay the
//! worker needs.

mod args;
mod claude;
mod codex;

pub use args::{
    infer_reasoning_effort, resolve_model, sanitize_passthrough, shell_quote, ReasoningEffort,
};
pub use claude::ClaudeSpawner;
pub use codex::CodexSpawner;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSpawner;

use std::path::PathBuf;

/// Everything a spawner needs to build one worker's command line.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    pub team: String,
    /// Canonical worker name (`worker-<i>`)
    pub worker: String,
    /// Agent type slug
    pub agent_type: String,
    pub cwd: PathBuf,
    /// Optional shell rc file sourced before exec
    pub shell_rc: Option<PathBuf>,
    /// Flag tokens inherited from the leader's own invocation
    pub inherited_args: Vec<String>,
    /// Explicit model override (environment), highest precedence
    pub model_override: Option<String>,
    pub extra_env: Vec<(String, String)>,
}

impl SpawnConfig {
    pub fn new(team: impl Into<String>, worker: impl Into<String>, cwd: PathBuf) -> Self {
        Self {
            team: team.into(),
            worker: worker.into(),
            agent_type: "executor".into(),
            cwd,
            shell_rc: None,
            inherited_args: Vec::new(),
            model_override: None,
            extra_env: Vec::new(),
        }
    }

    /// The `TEAM_WORKER` value announced to the worker process.
    pub fn team_worker(&self) -> String {
        format!("{}/{}", self.team, self.worker)
    }
}

/// CLI-specific spawn behavior.
pub trait Spawner: Clone + Send + Sync + 'static {
    /// Shell-quoted command that sources the rc file, sets `TEAM_WORKER`,
    /// and `exec`s the agent CLI with the resolved argument list.
    fn build_command(&self, cfg: &SpawnConfig) -> String;

    /// Whether a capture tail shows the CLI at its interactive prompt.
    fn is_ready(&self, capture: &str) -> bool;

    /// Environment overlay for the worker slot.
    fn build_env(&self, cfg: &SpawnConfig) -> Vec<(String, String)>;
}

/// Which spawner a team uses, resolved at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnerKind {
    Codex,
    Claude,
}

impl SpawnerKind {
    /// Agent types carrying a `claude` token use the claude CLI; the
    /// codex CLI is the default.
    pub fn for_agent_type(agent_type: &str) -> Self {
        if agent_type.to_ascii_lowercase().contains("claude") {
            SpawnerKind::Claude
        } else {
            SpawnerKind::Codex
        }
    }
}

/// Runtime-selected spawner variant.
#[derive(Clone)]
pub enum AnySpawner {
    Codex(CodexSpawner),
    Claude(ClaudeSpawner),
}

impl AnySpawner {
    pub fn for_kind(kind: SpawnerKind) -> Self {
        match kind {
            SpawnerKind::Codex => AnySpawner::Codex(CodexSpawner::new()),
            SpawnerKind::Claude => AnySpawner::Claude(ClaudeSpawner::new()),
        }
    }
}

impl Spawner for AnySpawner {
    fn build_command(&self, cfg: &SpawnConfig) -> String {
        match self {
            AnySpawner::Codex(s) => s.build_command(cfg),
            AnySpawner::Claude(s) => s.build_command(cfg),
        }
    }

    fn is_ready(&self, capture: &str) -> bool {
        match self {
            AnySpawner::Codex(s) => s.is_ready(capture),
            AnySpawner::Claude(s) => s.is_ready(capture),
        }
    }

    fn build_env(&self, cfg: &SpawnConfig) -> Vec<(String, String)> {
        match self {
            AnySpawner::Codex(s) => s.build_env(cfg),
            AnySpawner::Claude(s) => s.build_env(cfg),
        }
    }
}

/// Last non-empty line of a capture tail.
pub(crate) fn last_non_empty_line(capture: &str) -> Option<&str> {
    capture
        .lines()
        .rev()
        .map(str::trim_end)
        .find(|l| !l.trim().is_empty())
}

/// Whether the last ~10 lines mention startup activity.
pub(crate) fn has_startup_words(capture: &str) -> bool {
    const WORDS: [&str; 4] = ["loading", "starting", "initializing", "connecting"];
    let lines: Vec<&str> = capture.lines().collect();
    let tail = lines.len().saturating_sub(10);
    lines[tail..].iter().any(|line| {
        let lower = line.to_ascii_lowercase();
        WORDS.iter().any(|w| lower.contains(w))
    })
}

/// Prefix for the rc-sourcing fragment shared by both spawners.
pub(crate) fn rc_prefix(cfg: &SpawnConfig) -> String {
    match &cfg.shell_rc {
        Some(rc) => format!(". {} >/dev/null 2>&1; ", shell_quote(&rc.to_string_lossy())),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
