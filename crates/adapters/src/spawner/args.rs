// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker argument resolution.
//!
//! Exactly one canonical model flag is emitted per worker. Precedence:
//! explicit environment override > inherited leader flags > per-agent-type
//! fallback. Orphan flag tokens and empty `--flag=` forms are dropped on
//! the way through.

/// Reasoning-effort level injected when the caller did not pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

impl ReasoningEffort {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasoningEffort::Low => "low",
            ReasoningEffort::Medium => "medium",
            ReasoningEffort::High => "high",
        }
    }
}

/// Infer effort from the model name token: small/fast names run low,
/// deep-thinking names run high, everything else medium.
pub fn infer_reasoning_effort(model: &str) -> ReasoningEffort {
    let lower = model.to_ascii_lowercase();
    const FAST: [&str; 5] = ["mini", "small", "fast", "flash", "haiku"];
    const DEEP: [&str; 5] = ["opus", "pro", "deep", "thinking", "max"];
    if FAST.iter().any(|t| lower.contains(t)) {
        ReasoningEffort::Low
    } else if DEEP.iter().any(|t| lower.contains(t)) {
        ReasoningEffort::High
    } else {
        ReasoningEffort::Medium
    }
}

/// Extract a model value from inherited flag tokens.
///
/// Understands `--model <v>`, `--model=<v>`, and `-m <v>`. Orphan flags
/// (no value following) and empty `--model=` forms yield nothing.
fn model_from_inherited(inherited: &[String]) -> Option<String> {
    let mut iter = inherited.iter().peekable();
    let mut found = None;
    while let Some(token) = iter.next() {
        match token.as_str() {
            "--model" | "-m" => {
                // Value must not itself be a flag
                if let Some(value) = iter.peek() {
                    if !value.starts_with('-') && !value.is_empty() {
                        found = Some((*value).clone());
                        iter.next();
                    }
                }
            }
            _ => {
                if let Some(value) = token.strip_prefix("--model=") {
                    if !value.is_empty() {
                        found = Some(value.to_string());
                    }
                }
            }
        }
    }
    found
}

/// Resolve the single canonical model value for a worker.
pub fn resolve_model(
    explicit_override: Option<&str>,
    inherited: &[String],
    fallback: &str,
) -> String {
    if let Some(model) = explicit_override {
        if !model.is_empty() {
            return model.to_string();
        }
    }
    if let Some(model) = model_from_inherited(inherited) {
        return model;
    }
    fallback.to_string()
}

/// Pass-through filter for inherited args: strips every model-flag form
/// (the canonical one is re-emitted by the spawner) plus orphan flags
/// and empty `--flag=` forms.
pub fn sanitize_passthrough(inherited: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut iter = inherited.iter().peekable();
    while let Some(token) = iter.next() {
        match token.as_str() {
            "--model" | "-m" => {
                // Drop the flag; swallow its value if one follows
                if let Some(value) = iter.peek() {
                    if !value.starts_with('-') {
                        iter.next();
                    }
                }
            }
            _ if token.starts_with("--model=") => {}
            _ if token.ends_with('=') && token.starts_with("--") => {
                // Empty --flag= form
            }
            _ => {
                // A long flag with no following value is an orphan only if
                // the next token is another flag or the end; values and
                // boolean flags are indistinguishable here, so keep it
                out.push(token.clone());
            }
        }
    }
    out
}

/// Whether an explicit effort flag is already present.
pub fn has_effort_flag(args: &[String]) -> bool {
    args.iter().any(|a| {
        a == "--effort"
            || a.starts_with("--effort=")
            || a.starts_with("-c=model_reasoning_effort")
            || a.starts_with("model_reasoning_effort")
            || (a.starts_with("-c") && a.contains("model_reasoning_effort"))
    })
}

/// Quote a string for POSIX shell interpolation.
pub fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:%@,+".contains(c))
    {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
