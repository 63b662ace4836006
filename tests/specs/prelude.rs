//! Shared helpers for CLI specs.

use std::path::Path;

/// The omx binary, ready to run against a scratch project directory.
pub fn omx(project: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("omx").expect("omx binary");
    cmd.current_dir(project);
    // Keep specs hermetic: never touch a real tmux server
    cmd.env("OMX_FORCE_TRANSPORT", "process");
    cmd
}

/// A scratch project directory.
pub fn project() -> tempfile::TempDir {
    tempfile::tempdir().expect("tempdir")
}

/// Seed a minimal team state subtree by hand: a manifest and one
/// pending task, no live workers. Enough for read-only verbs.
pub fn seed_team(project: &Path, team: &str) {
    let root = project.join(".omx/state/team").join(team);
    std::fs::create_dir_all(root.join("tasks")).unwrap();
    std::fs::create_dir_all(root.join("workers")).unwrap();
    std::fs::create_dir_all(root.join("mailbox")).unwrap();

    let manifest = serde_json::json!({
        "schema_version": 2,
        "team": team,
        "task_description": "seeded",
        "leader": {
            "session_id": "seed",
            "worker_id": "leader",
            "role": "leader"
        },
        "session": format!("omx-{}", team),
        "worker_count": 0,
        "workers": [],
        "initial_worker_count": 0,
        "active_worker_count": 0,
        "next_task_id": 2,
        "next_worker_index": 1,
        "created_at": "2026-01-01T00:00:00Z"
    });
    std::fs::write(
        root.join("manifest.v2.json"),
        serde_json::to_vec_pretty(&manifest).unwrap(),
    )
    .unwrap();

    let task = serde_json::json!({
        "id": "1",
        "subject": "seeded task",
        "description": "",
        "status": "pending",
        "version": 1,
        "created_at": "2026-01-01T00:00:00Z"
    });
    std::fs::write(
        root.join("tasks/1.json"),
        serde_json::to_vec_pretty(&task).unwrap(),
    )
    .unwrap();
}
