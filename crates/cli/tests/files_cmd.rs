//! CLI tests for `pst files`.

use std::fs;
use std::process::Command;

use assert_cmd::cargo;

const PST: &str = "\
pcf
* model command line
python run.py --fast
* model input/output
in.tpl in.dat
out.ins out.dat
* prior information
";

fn pst_cmd() -> Command {
    Command::new(cargo::cargo_bin!("pst"))
}

#[test]
fn lists_references_with_existence() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pst = dir.path().join("case.pst");
    fs::write(&pst, PST).expect("write control file");
    fs::write(dir.path().join("run.py"), "").expect("write script");
    fs::write(dir.path().join("in.tpl"), "ptf #\n").expect("write template");

    let output = pst_cmd()
        .arg("files")
        .arg(&pst)
        .args(["--output", "json"])
        .output()
        .expect("run files");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let entries = json.as_array().expect("array");
    let raws: Vec<&str> = entries.iter().map(|e| e["raw"].as_str().unwrap()).collect();
    assert_eq!(raws, ["run.py", "in.tpl", "in.dat", "out.ins", "out.dat"]);

    let exists: Vec<bool> = entries.iter().map(|e| e["exists"].as_bool().unwrap()).collect();
    assert_eq!(exists, [true, true, false, false, false]);

    assert_eq!(entries[0]["line"], 2);
    let resolved = entries[1]["resolved"].as_str().expect("resolved path");
    assert_eq!(resolved, dir.path().join("in.tpl").to_string_lossy());
}

#[test]
fn pretty_output_marks_missing_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pst = dir.path().join("case.pst");
    fs::write(&pst, PST).expect("write control file");
    fs::write(dir.path().join("run.py"), "").expect("write script");

    let output = pst_cmd()
        .arg("files")
        .arg(&pst)
        .args(["--output", "pretty"])
        .output()
        .expect("run files");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let script = stdout.lines().find(|l| l.contains("run.py")).expect("script line");
    assert!(!script.contains("(missing)"), "stdout={stdout}");
    let data = stdout.lines().find(|l| l.contains("in.dat")).expect("data line");
    assert!(data.contains("(missing)"), "stdout={stdout}");
}

#[test]
fn describe_resolves_file_targets() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pst = dir.path().join("case.pst");
    fs::write(&pst, PST).expect("write control file");

    let output = pst_cmd()
        .arg("describe")
        .arg(&pst)
        .args(["--line", "5", "--column", "9", "--output", "json"])
        .output()
        .expect("run describe");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["target"]["kind"], "file");
    assert_eq!(json["target"]["path"], "in.dat");
    assert_eq!(
        json["resolved"].as_str().expect("resolved path"),
        dir.path().join("in.dat").to_string_lossy()
    );
}

#[test]
fn missing_control_file_is_an_error() {
    let output = pst_cmd()
        .args(["files", "does-not-exist.pst", "--output", "json"])
        .output()
        .expect("run files");

    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["error"], "command_failed");
}
