// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Claude CLI spawner.

use super::args::{
    has_effort_flag, infer_reasoning_effort, resolve_model, sanitize_passthrough, shell_quote,
};
use super::{has_startup_words, last_non_empty_line, rc_prefix, SpawnConfig, Spawner};

const FALLBACK_MODEL: &str = "claude-sonnet-4";

/// Glyphs claude renders at its input box when idle.
const PROMPT_GLYPHS: [&str; 3] = ["❯", "│ >", "> "];

/// Fragments of the claude status bar, present once the TUI is up.
const STATUS_SIGNATURES: [&str; 3] = ["? for shortcuts", "bypass permissions", "shift+tab to cycle"];

#[derive(Clone, Default)]
pub struct ClaudeSpawner;

impl ClaudeSpawner {
    pub fn new() -> Self {
        Self
    }
}

impl Spawner for ClaudeSpawner {
    fn build_command(&self, cfg: &SpawnConfig) -> String {
        let model = resolve_model(
            cfg.model_override.as_deref(),
            &cfg.inherited_args,
            FALLBACK_MODEL,
        );
        let mut args: Vec<String> = vec!["--model".into(), model.clone()];
        args.extend(sanitize_passthrough(&cfg.inherited_args));
        if !has_effort_flag(&args) {
            args.push("--effort".into());
            args.push(infer_reasoning_effort(&model).as_str().to_string());
        }

        let quoted: Vec<String> = args.iter().map(|a| shell_quote(a)).collect();
        format!(
            "{}TEAM_WORKER={} exec claude {}",
            rc_prefix(cfg),
            shell_quote(&cfg.team_worker()),
            quoted.join(" ")
        )
    }

    fn is_ready(&self, capture: &str) -> bool {
        let Some(last) = last_non_empty_line(capture) else {
            return false;
        };
        let at_prompt = PROMPT_GLYPHS.iter().any(|g| last.contains(g));
        let has_signature = STATUS_SIGNATURES.iter().any(|s| capture.contains(s));
        at_prompt && has_signature && !has_startup_words(capture)
    }

    fn build_env(&self, cfg: &SpawnConfig) -> Vec<(String, String)> {
        let mut env = vec![("TEAM_WORKER".to_string(), cfg.team_worker())];
        env.extend(cfg.extra_env.iter().cloned());
        env
    }
}

#[cfg(test)]
#[path = "claude_tests.rs"]
mod tests;
