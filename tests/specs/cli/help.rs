//! Help output and usage surface.

use crate::prelude::{omx, project};

#[test]
fn top_level_help_mentions_team() {
    let dir = project();
    let output = omx(dir.path()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("team"));
}

#[test]
fn team_help_lists_every_verb() {
    let dir = project();
    let output = omx(dir.path()).args(["team", "--help"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for verb in [
        "start",
        "status",
        "monitor",
        "shutdown",
        "scale-up",
        "scale-down",
        "scale-auto",
        "cleanup",
    ] {
        assert!(stdout.contains(verb), "help is missing verb {}", verb);
    }
}
