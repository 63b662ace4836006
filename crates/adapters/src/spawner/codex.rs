// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Codex CLI spawner.

use super::args::{
    has_effort_flag, infer_reasoning_effort, resolve_model, sanitize_passthrough, shell_quote,
};
use super::{has_startup_words, last_non_empty_line, rc_prefix, SpawnConfig, Spawner};

/// Default model per agent type when neither the environment nor the
/// leader's flags pick one.
const FALLBACK_MODEL: &str = "gpt-5-codex";

/// Glyphs codex renders at its composer line when idle.
const PROMPT_GLYPHS: [&str; 2] = ["▌", "›"];

/// Fragments of the codex status bar, present once the TUI is up.
const STATUS_SIGNATURES: [&str; 3] = ["? for shortcuts", "context left", "tokens used"];

#[derive(Clone, Default)]
pub struct CodexSpawner;

impl CodexSpawner {
    pub fn new() -> Self {
        Self
    }
}

impl Spawner for CodexSpawner {
    fn build_command(&self, cfg: &SpawnConfig) -> String {
        let model = resolve_model(
            cfg.model_override.as_deref(),
            &cfg.inherited_args,
            FALLBACK_MODEL,
        );
        let mut args: Vec<String> = vec!["--model".into(), model.clone()];
        args.extend(sanitize_passthrough(&cfg.inherited_args));
        if !has_effort_flag(&args) {
            args.push("-c".into());
            args.push(format!(
                "model_reasoning_effort={}",
                infer_reasoning_effort(&model).as_str()
            ));
        }

        let quoted: Vec<String> = args.iter().map(|a| shell_quote(a)).collect();
        format!(
            "{}TEAM_WORKER={} exec codex {}",
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
#[path = "codex_tests.rs"]
mod tests;
