// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{
    has_effort_flag, infer_reasoning_effort, resolve_model, sanitize_passthrough, shell_quote,
    ReasoningEffort,
};

fn strings(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|s| s.to_string()).collect()
}

#[yare::parameterized(
    mini     = { "gpt-5-mini", ReasoningEffort::Low },
    haiku    = { "claude-haiku-4", ReasoningEffort::Low },
    flash    = { "gemini-flash", ReasoningEffort::Low },
    opus     = { "claude-opus-4", ReasoningEffort::High },
    deep     = { "deepthink-x", ReasoningEffort::High },
    thinking = { "o4-thinking", ReasoningEffort::High },
    plain    = { "gpt-5", ReasoningEffort::Medium },
    sonnet   = { "claude-sonnet-4", ReasoningEffort::Medium },
)]
fn effort_inference(model: &str, expected: ReasoningEffort) {
    assert_eq!(infer_reasoning_effort(model), expected);
}

#[test]
fn explicit_override_wins() {
    let inherited = strings(&["--model", "from-leader"]);
    assert_eq!(
        resolve_model(Some("from-env"), &inherited, "fallback"),
        "from-env"
    );
}

#[test]
fn empty_override_is_ignored() {
    assert_eq!(resolve_model(Some(""), &[], "fallback"), "fallback");
}

#[yare::parameterized(
    space_form   = { &["--model", "m1"], "m1" },
    equals_form  = { &["--model=m2"], "m2" },
    short_form   = { &["-m", "m3"], "m3" },
    last_wins    = { &["--model", "m1", "--model=m2"], "m2" },
)]
fn inherited_model_forms(tokens: &[&str], expected: &str) {
    let inherited = strings(tokens);
    assert_eq!(resolve_model(None, &inherited, "fallback"), expected);
}

#[yare::parameterized(
    orphan_flag    = { &["--model"] },
    empty_equals   = { &["--model="] },
    flag_as_value  = { &["--model", "--yolo"] },
    unrelated      = { &["--yolo"] },
)]
fn degenerate_inherited_forms_fall_back(tokens: &[&str]) {
    let inherited = strings(tokens);
    assert_eq!(resolve_model(None, &inherited, "fallback"), "fallback");
}

#[test]
fn sanitize_strips_model_flags_and_empty_forms() {
    let inherited = strings(&[
        "--model",
        "m1",
        "--sandbox",
        "workspace-write",
        "--model=m2",
        "--search=",
        "-m",
        "m3",
        "--yolo",
    ]);
    assert_eq!(
        sanitize_passthrough(&inherited),
        strings(&["--sandbox", "workspace-write", "--yolo"])
    );
}

#[test]
fn sanitize_keeps_orphan_model_flags_out() {
    assert!(sanitize_passthrough(&strings(&["--model"])).is_empty());
}

#[test]
fn effort_flag_detection() {
    assert!(has_effort_flag(&strings(&["--effort", "high"])));
    assert!(has_effort_flag(&strings(&["--effort=low"])));
    assert!(has_effort_flag(&strings(&["-c", "model_reasoning_effort=high"])));
    assert!(!has_effort_flag(&strings(&["--model", "m1"])));
}

#[yare::parameterized(
    plain      = { "simple-name", "simple-name" },
    with_path  = { "/usr/bin/codex", "/usr/bin/codex" },
    with_space = { "two words", "'two words'" },
    with_quote = { "it's", r"'it'\''s'" },
    empty      = { "", "''" },
)]
fn quoting(input: &str, expected: &str) {
    assert_eq!(shell_quote(input), expected);
}
