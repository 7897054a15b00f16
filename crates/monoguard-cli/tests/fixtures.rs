//! End-to-end CLI integration tests using the monorepo fixtures under `tests/fixtures/`.
//!
//! Each test runs the binary against a fixture (or a temp copy of one for `fix`) and checks
//! the exit code and the JSON report.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to get a Command for the monoguard binary.
#[allow(deprecated)]
fn monoguard_cmd() -> Command {
    Command::cargo_bin("monoguard").expect("monoguard binary not found - run `cargo build` first")
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("monoguard-cli crate should have a parent directory")
        .parent()
        .expect("crates directory should have a parent (repo root)")
        .join("tests")
        .join("fixtures")
}

/// Copy a fixture into a fresh temp dir so `fix` can rewrite it.
fn copy_fixture(name: &str) -> TempDir {
    let src = fixtures_dir().join(name);
    let temp = TempDir::new().expect("create temp dir");
    for entry in walkdir::WalkDir::new(&src) {
        let entry = entry.expect("walk fixture");
        let rel = entry.path().strip_prefix(&src).expect("relative path");
        let dest = temp.path().join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest).expect("create dir");
        } else {
            std::fs::copy(entry.path(), &dest).expect("copy file");
        }
    }
    temp
}

fn read_json(path: &Path) -> Value {
    let text = std::fs::read_to_string(path).expect("read json");
    serde_json::from_str(&text).expect("parse json")
}

/// Run `monoguard <subcommand>` against `root` and return the exit code and JSON report.
fn run(subcommand: &str, root: &Path, extra: &[&str]) -> (i32, Value) {
    let out = TempDir::new().expect("create temp dir");
    let report_path = out.path().join("report.json");

    let output = monoguard_cmd()
        .arg("--repo-root")
        .arg(root)
        .args(extra)
        .arg(subcommand)
        .arg("--report-out")
        .arg(&report_path)
        .output()
        .expect("run command");

    (output.status.code().unwrap_or(-1), read_json(&report_path))
}

fn codes(report: &Value) -> Vec<String> {
    report["violations"]
        .as_array()
        .expect("violations array")
        .iter()
        .map(|v| v["code"].as_str().expect("code").to_string())
        .collect()
}

#[test]
fn clean_monorepo_passes() {
    let (code, report) = run("check", &fixtures_dir().join("clean_monorepo"), &[]);
    assert_eq!(code, 0);
    assert_eq!(report["schema"], "monoguard.report.v1");
    assert_eq!(report["verdict"], "pass");
    assert_eq!(report["data"]["mode"], "check");
    assert_eq!(report["data"]["profile"], "strict");
    assert!(codes(&report).is_empty());
}

#[test]
fn range_drift_fails_check() {
    let (code, report) = run("check", &fixtures_dir().join("range_drift"), &[]);
    assert_eq!(code, 2);
    assert_eq!(report["verdict"], "fail");

    let mut found = codes(&report);
    found.sort();
    assert_eq!(found, vec!["missing_workspace_protocol", "range_mismatch"]);

    let mismatch = report["violations"]
        .as_array()
        .expect("violations")
        .iter()
        .find(|v| v["code"] == "range_mismatch")
        .expect("range_mismatch violation");
    assert_eq!(mismatch["location"]["path"], "packages/a/package.json");
    assert_eq!(mismatch["location"]["field"], "dependencies.lodash");
}

#[test]
fn check_leaves_manifests_untouched() {
    let temp = copy_fixture("range_drift");
    let manifest = temp.path().join("packages/a/package.json");
    let before = std::fs::read_to_string(&manifest).expect("read");

    let (code, _) = run("check", temp.path(), &[]);
    assert_eq!(code, 2);
    assert_eq!(std::fs::read_to_string(&manifest).expect("read"), before);
}

#[test]
fn report_profile_downgrades_drift_to_warnings() {
    let (code, report) = run(
        "check",
        &fixtures_dir().join("range_drift"),
        &["--profile", "report"],
    );
    assert_eq!(code, 0);
    assert_eq!(report["verdict"], "warn");
    assert_eq!(report["data"]["profile"], "report");
}

#[test]
fn max_violations_override_truncates() {
    let (_, report) = run(
        "check",
        &fixtures_dir().join("range_drift"),
        &["--max-violations", "1"],
    );
    assert_eq!(codes(&report).len(), 1);
    assert_eq!(report["data"]["violations_total"], 2);
    assert_eq!(
        report["data"]["truncated_reason"],
        "violations truncated to max_violations=1"
    );
}

#[test]
fn forbidden_package_is_reported() {
    let (code, report) = run("check", &fixtures_dir().join("forbidden_package"), &[]);
    assert_eq!(code, 2);
    assert_eq!(codes(&report), vec!["forbidden_dependency"]);
    assert_eq!(
        report["violations"][0]["location"]["path"],
        "packages/dates/package.json"
    );
}

#[test]
fn fix_rewrites_drifted_manifests_and_converges() {
    let temp = copy_fixture("range_drift");

    let (code, report) = run("fix", temp.path(), &[]);
    assert_eq!(code, 0);
    assert_eq!(report["data"]["mode"], "fix");
    assert_eq!(report["changes"].as_array().expect("changes").len(), 2);

    let a = read_json(&temp.path().join("packages/a/package.json"));
    assert_eq!(a["dependencies"]["lodash"], "^4.17.21");
    let b = read_json(&temp.path().join("packages/b/package.json"));
    assert_eq!(b["dependencies"]["a"], "workspace:^");

    let text = std::fs::read_to_string(temp.path().join("packages/b/package.json")).expect("read");
    assert!(text.ends_with("}\n"));
    assert!(text.contains("\n  \"dependencies\": {\n    \"a\": \"workspace:^\""));

    let (code, report) = run("check", temp.path(), &[]);
    assert_eq!(code, 0);
    assert!(codes(&report).is_empty());
}

#[test]
fn fix_removes_forbidden_dependency() {
    let temp = copy_fixture("forbidden_package");

    let (code, report) = run("fix", temp.path(), &[]);
    // The forbidden edge is still reported, so the run fails even though it was removed.
    assert_eq!(code, 2);
    assert_eq!(codes(&report), vec!["forbidden_dependency"]);

    let dates = read_json(&temp.path().join("packages/dates/package.json"));
    assert!(dates["dependencies"].get("moment").is_none());
    assert_eq!(dates["dependencies"]["dayjs"], "^1.11.10");
}

#[test]
fn missing_package_json_writes_runtime_error_report() {
    let temp = TempDir::new().expect("create temp dir");
    let (code, report) = run("check", temp.path(), &[]);
    assert_eq!(code, 1);
    assert_eq!(report["verdict"], "fail");
    assert_eq!(codes(&report), vec!["runtime_error"]);
}

#[test]
fn invalid_config_is_a_runtime_error() {
    let temp = copy_fixture("clean_monorepo");
    std::fs::write(
        temp.path().join("monoguard.toml"),
        "[rules.\"deps.nope\"]\nenabled = true\n",
    )
    .expect("write config");

    let (code, report) = run("check", temp.path(), &[]);
    assert_eq!(code, 1);
    assert_eq!(report["violations"][0]["rule_id"], "tool.runtime");
}

#[test]
fn md_renders_existing_report() {
    let out = TempDir::new().expect("create temp dir");
    let report_path = out.path().join("report.json");
    monoguard_cmd()
        .arg("--repo-root")
        .arg(fixtures_dir().join("range_drift"))
        .arg("check")
        .arg("--report-out")
        .arg(&report_path)
        .assert()
        .code(2);

    monoguard_cmd()
        .arg("md")
        .arg("--report")
        .arg(&report_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("# Monoguard report"))
        .stdout(predicate::str::contains("range_mismatch"));
}

#[test]
fn annotations_render_existing_report() {
    let out = TempDir::new().expect("create temp dir");
    let report_path = out.path().join("report.json");
    monoguard_cmd()
        .arg("--repo-root")
        .arg(fixtures_dir().join("forbidden_package"))
        .arg("check")
        .arg("--report-out")
        .arg(&report_path)
        .assert()
        .code(2);

    monoguard_cmd()
        .arg("annotations")
        .arg("--report")
        .arg(&report_path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "::error file=packages/dates/package.json::[deps.forbidden:forbidden_dependency]",
        ));
}

#[test]
fn explain_known_code() {
    monoguard_cmd()
        .arg("explain")
        .arg("range_mismatch")
        .assert()
        .success()
        .stdout(predicate::str::contains("Range Mismatch"))
        .stdout(predicate::str::contains(
            "ignore, workspace, external, tie_break",
        ))
        .stdout(predicate::str::contains(
            "packages/a/package.json: dependencies.lodash: \"^4.17.0\" -> \"^4.17.21\"",
        ));
}

#[test]
fn explain_unknown_identifier_fails() {
    monoguard_cmd()
        .arg("explain")
        .arg("nope.nothing")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown rule id or code"));
}
