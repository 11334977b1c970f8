//! CLI binary tests
//!
//! Each test runs with HOME pointed at a temp dir and all VLMWEAVE_*
//! variables removed, so no real provider is ever contacted.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use crate::helpers::sample_document;

const ENV_VARS: &[&str] = &[
    "VLMWEAVE_PROVIDER",
    "VLMWEAVE_API_KEY",
    "VLMWEAVE_MODEL",
    "VLMWEAVE_ENDPOINT",
    "VLMWEAVE_PROMPT",
    "VLMWEAVE_TIMEOUT",
    "VLMWEAVE_THREADS",
    "RUST_LOG",
];

fn vlmweave(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("vlmweave").expect("binary built");
    cmd.env("HOME", home.path());
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
#[cfg_attr(miri, ignore)]
fn render_without_api_key_marks_every_image() {
    let home = TempDir::new().unwrap();
    let (_dir, path) = sample_document();

    vlmweave(&home)
        .args(["render", "--format", "text"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("First paragraph."))
        .stdout(predicate::str::contains("=== VLM Analysis for /media/a.png ==="))
        .stdout(predicate::str::contains(
            "[analysis unavailable: analysis failed (not-configured): provider not configured: no API key]",
        ))
        .stderr(predicate::str::contains(
            "Analyzed 2 resource(s): 0 ok, 2 failed, 0 timed out",
        ));
}

#[test]
#[cfg_attr(miri, ignore)]
fn render_xhtml_to_file() {
    let home = TempDir::new().unwrap();
    let (dir, path) = sample_document();
    let out = dir.path().join("out.xhtml");

    vlmweave(&home)
        .arg("render")
        .arg(&path)
        .arg("-o")
        .arg(&out)
        .args(["--threads", "1"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let xhtml = std::fs::read_to_string(&out).unwrap();
    assert!(xhtml.starts_with("<?xml"));
    assert_eq!(xhtml.matches("class=\"vlm-result\"").count(), 2);
    assert_eq!(xhtml.matches("data-status=\"error\"").count(), 2);
}

#[test]
#[cfg_attr(miri, ignore)]
fn custom_provider_without_endpoint_still_renders() {
    let home = TempDir::new().unwrap();
    let (_dir, path) = sample_document();

    vlmweave(&home)
        .env("VLMWEAVE_API_KEY", "test-key")
        .args(["render", "-f", "text", "--provider", "custom"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("provider not configured: no endpoint"));
}

#[test]
fn missing_file_fails() {
    let home = TempDir::new().unwrap();
    vlmweave(&home)
        .args(["render", "/definitely/not/here.docx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn invalid_thread_count_fails() {
    let home = TempDir::new().unwrap();
    let (_dir, path) = sample_document();
    vlmweave(&home)
        .arg("render")
        .arg(&path)
        .args(["--threads", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pool.threads must be > 0"));
}

#[test]
fn config_init_then_show() {
    let home = TempDir::new().unwrap();

    vlmweave(&home)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));
    assert!(home.path().join(".config/vlmweave/config.toml").exists());

    vlmweave(&home)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    vlmweave(&home)
        .env("VLMWEAVE_API_KEY", "sk-secret")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[provider]"))
        .stdout(predicate::str::contains("<redacted>"))
        .stdout(predicate::str::contains("sk-secret").not());
}

#[test]
fn config_path_uses_home() {
    let home = TempDir::new().unwrap();
    vlmweave(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".config/vlmweave/config.toml"));
}
