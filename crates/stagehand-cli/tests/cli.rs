//! E2E tests for the `stagehand` binary.
//!
//! Each test gets its own project directory holding the pack and scripts.
//! The global config points into that directory and `STAGEHAND_*` variables
//! are cleared, so the host environment cannot leak in.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(20);

const ENV_VARS: &[&str] = &[
    "STAGEHAND_MAX_ATTEMPTS",
    "STAGEHAND_INSTRUCTION_LIMIT",
    "STAGEHAND_GRANTS",
    "STAGEHAND_PACK",
    "STAGEHAND_MOOD",
    "RUST_LOG",
];

const MANIFEST: &str = r#"
[meta]
name = "seaside"
version = "1.0.0"
permissions = ["image", "audio"]

[[moods]]
name = "calm"
tags = ["calm"]

[[moods]]
name = "city"
tags = ["urban"]

[[assets.image]]
path = "image/beach.png"
tags = ["beach", "calm"]

[[assets.audio]]
path = "audio/waves.ogg"
tags = ["calm"]
"#;

const SHOW_IMAGE: &str = r#"
local img = stage.image.show{ tags = {"beach"} }
print(img.kind .. img.id)
"#;

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("create project dir");
        std::fs::write(dir.path().join("pack.toml"), MANIFEST).expect("write manifest");
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn pack(&self) -> PathBuf {
        self.path().join("pack.toml")
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        std::fs::write(&path, content).expect("write file");
        path
    }

    fn write_config(&self, content: &str) {
        let dir = self.path().join(".stagehand");
        std::fs::create_dir_all(&dir).expect("create config dir");
        std::fs::write(dir.join("config.toml"), content).expect("write config");
    }

    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd: assert_cmd::Command = cargo_bin_cmd!("stagehand");
        cmd.timeout(TIMEOUT);
        for var in ENV_VARS {
            cmd.env_remove(var);
        }
        cmd.arg("-C").arg(self.path());
        cmd.arg("--config").arg(self.path().join("global.toml"));
        cmd
    }
}

// ─── run ───────────────────────────────────────────────────────────

#[test]
fn run_granted_script_succeeds() {
    let project = Project::new();
    let script = project.write("show.lua", SHOW_IMAGE);
    project
        .cmd()
        .arg("run")
        .arg(&script)
        .arg("--pack")
        .arg(project.pack())
        .args(["--grant", "image"])
        .assert()
        .success()
        .stdout(contains("attempts: 1"))
        .stdout(contains("calls dispatched: 1"))
        .stdout(contains("image1"))
        .stdout(contains("active handles: image#1"));
}

#[test]
fn run_denied_script_aborts() {
    let project = Project::new();
    let script = project.write("play.lua", "stage.audio.play{}");
    project
        .cmd()
        .arg("run")
        .arg(&script)
        .arg("--pack")
        .arg(project.pack())
        .args(["--grant", "image"])
        .assert()
        .failure()
        .stderr(contains("PERMISSION_DENIED"))
        .stderr(contains("turn aborted after 3 failed attempts"));
}

#[test]
fn run_second_file_retries_after_compile_error() {
    let project = Project::new();
    let broken = project.write("broken.lua", "stage.image.show{");
    let fixed = project.write("fixed.lua", SHOW_IMAGE);
    project
        .cmd()
        .arg("run")
        .arg(&broken)
        .arg(&fixed)
        .arg("--pack")
        .arg(project.pack())
        .args(["--grant", "image"])
        .assert()
        .success()
        .stdout(contains("attempts: 2"));
}

#[test]
fn run_extracts_script_from_response() {
    let project = Project::new();
    let reply = project.write(
        "reply.md",
        "Here you go:\n\n```lua\nprint(stage.mood.get().name)\n```\n",
    );
    project
        .cmd()
        .arg("run")
        .arg(&reply)
        .arg("--response")
        .arg("--pack")
        .arg(project.pack())
        .args(["--mood", "city"])
        .assert()
        .success()
        .stdout(contains("city"))
        .stdout(contains("active handles: none"));
}

#[test]
fn run_uses_pack_and_grants_from_project_config() {
    let project = Project::new();
    project.write_config(&format!(
        "[grants]\ncapabilities = [\"image\"]\n\n[pack]\nmanifest = {:?}\n",
        project.pack().display().to_string()
    ));
    let script = project.write("show.lua", SHOW_IMAGE);
    project
        .cmd()
        .arg("run")
        .arg(&script)
        .assert()
        .success()
        .stdout(contains("active handles: image#1"));
}

#[test]
fn run_without_pack_fails() {
    let project = Project::new();
    let script = project.write("show.lua", SHOW_IMAGE);
    project
        .cmd()
        .arg("run")
        .arg(&script)
        .assert()
        .failure()
        .stderr(contains("no pack manifest"));
}

#[test]
fn run_unknown_mood_fails() {
    let project = Project::new();
    let script = project.write("show.lua", SHOW_IMAGE);
    project
        .cmd()
        .arg("run")
        .arg(&script)
        .arg("--pack")
        .arg(project.pack())
        .args(["--mood", "party"])
        .assert()
        .failure()
        .stderr(contains("unknown mood: party"));
}

// ─── check ─────────────────────────────────────────────────────────

#[test]
fn check_reports_resolution() {
    let project = Project::new();
    project
        .cmd()
        .arg("check")
        .arg(project.pack())
        .args(["--grant", "image", "--grant", "video"])
        .assert()
        .success()
        .stdout(contains("pack: seaside 1.0.0"))
        .stdout(contains("required: IMAGE | AUDIO"))
        .stdout(contains("granted: IMAGE | VIDEO"))
        .stdout(contains("effective: IMAGE"))
        .stdout(contains("missing: AUDIO"))
        .stdout(contains("moods: calm (default), city"));
}

#[test]
fn check_rejects_unknown_grant() {
    let project = Project::new();
    project
        .cmd()
        .arg("check")
        .arg(project.pack())
        .args(["--grant", "shell"])
        .assert()
        .failure()
        .stderr(contains("unknown capability: shell"));
}

#[test]
fn check_rejects_invalid_pack() {
    let project = Project::new();
    let manifest = project.write(
        "empty.toml",
        "[meta]\nname = \"bare\"\npermissions = [\"image\"]\n\n[[moods]]\nname = \"calm\"\n",
    );
    project
        .cmd()
        .arg("check")
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(contains("no image items").and(contains("Error")));
}

// ─── config ────────────────────────────────────────────────────────

#[test]
fn config_prints_merged_toml() {
    let project = Project::new();
    project.write_config("[runtime]\nmax_attempts = 5\n");
    project
        .cmd()
        .arg("config")
        .env("STAGEHAND_INSTRUCTION_LIMIT", "4096")
        .assert()
        .success()
        .stdout(contains("[runtime]"))
        .stdout(contains("max_attempts = 5"))
        .stdout(contains("instruction_limit = 4096"));
}
