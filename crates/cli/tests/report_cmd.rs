//! CLI tests for `pst report`.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use assert_cmd::cargo;

const TRANSCRIPT: &str = "\
 PESTCHEK Version 17.3. Watermark Numerical Computing.

 Errors ----->
 Line 4 of file case.pst: number of parameters NPAR does not agree
 with the number of parameters cited in parameter data section.

 Line 2 of instruction file ves.ins: cannot read observation
 ar6 from instruction line.

 Warnings ----->
 Parameter \"ro3\" is not cited in a template file.
";

const WARNINGS_ONLY: &str = "\
 Warnings ----->
 Parameter \"ro3\" is not cited in a template file.
";

fn pst_cmd() -> Command {
    Command::new(cargo::cargo_bin!("pst"))
}

fn run_report(root: &Path, transcript: &str, extra: &[&str]) -> Output {
    let out = root.join("pestchek.out");
    fs::write(&out, transcript).expect("write transcript");
    pst_cmd()
        .arg("report")
        .arg(&out)
        .args(["--pst", "case.pst", "--root"])
        .arg(root)
        .args(extra)
        .output()
        .expect("run report")
}

#[test]
fn findings_are_grouped_by_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_report(dir.path(), TRANSCRIPT, &["--output", "json"]);

    assert_eq!(output.status.code(), Some(1), "errors fail the command");
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["ok"], false);
    assert_eq!(json["counts"]["errors"], 2);
    assert_eq!(json["counts"]["warnings"], 1);

    let files = json["files"].as_object().expect("files object");
    let case = files
        .iter()
        .find(|(path, _)| path.ends_with("case.pst"))
        .map(|(_, findings)| findings.as_array().expect("findings array"))
        .expect("case.pst group");
    assert_eq!(case.len(), 2);
    assert_eq!(case[0]["range"]["start"]["line"], 3);
    assert!(files.keys().any(|path| path.ends_with("ves.ins")));
    assert_eq!(json["suppressible"][0], "is not cited in a template file");
}

#[test]
fn warnings_alone_succeed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_report(dir.path(), WARNINGS_ONLY, &["--output", "json"]);

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["ok"], true);
    assert_eq!(json["counts"]["warnings"], 1);
}

#[test]
fn skip_warnings_setting_drops_warnings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("pst.json");
    fs::write(&config, r#"{ "checker": { "skip_warnings": true } }"#).expect("write settings");
    let config = config.to_string_lossy().into_owned();

    let output = run_report(
        dir.path(),
        TRANSCRIPT,
        &["--output", "json", "--config", &config],
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["counts"]["warnings"], 0);
    assert_eq!(json["counts"]["errors"], 2);
    assert!(json["suppressible"].as_array().is_some_and(Vec::is_empty));
}

#[test]
fn pretty_report_lists_files_and_hints() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_report(dir.path(), WARNINGS_ONLY, &["--output", "pretty"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("case.pst"), "stdout={stdout}");
    assert!(stdout.contains("ro3"), "stdout={stdout}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("skip_warnings"), "stderr={stderr}");
}

#[test]
fn missing_root_is_a_command_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("pestchek.out");
    fs::write(&out, WARNINGS_ONLY).expect("write transcript");

    let output = pst_cmd()
        .arg("report")
        .arg(&out)
        .args(["--pst", "case.pst", "--root", "/no/such/root", "--output", "json"])
        .output()
        .expect("run report");

    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["error"], "command_failed");
}
