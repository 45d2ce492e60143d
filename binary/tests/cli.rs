use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

const SMALL_LOG: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<log xes.version="1.0">
    <classifier name="Activity" keys="concept:name"/>
    <trace>
        <string key="concept:name" value="1"/>
        <event><string key="concept:name" value="a"/></event>
        <event><string key="concept:name" value="b"/></event>
        <event><string key="concept:name" value="c"/></event>
    </trace>
    <trace>
        <string key="concept:name" value="2"/>
        <event><string key="concept:name" value="a"/></event>
        <event><string key="concept:name" value="b"/></event>
        <event><string key="concept:name" value="c"/></event>
    </trace>
    <trace>
        <string key="concept:name" value="3"/>
        <event><string key="concept:name" value="a"/></event>
        <event><string key="concept:name" value="c"/></event>
    </trace>
</log>"#;

fn cmd() -> Command {
    Command::cargo_bin("trace-variability").unwrap()
}

fn write_log(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, SMALL_LOG).unwrap();
    path
}

#[test]
fn prints_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), "small.xes");
    cmd()
        .args(["--quiet", "--no-plots"])
        .arg(&log)
        .assert()
        .success()
        .stdout(contains("Total number of traces: 3"))
        .stdout(contains("- 1 traces appears 2 times"))
        .stdout(contains("3.1: Number of variants: 2"))
        .stdout(contains("Variability (perc.): 66.667%"))
        .stdout(contains("value: 2.000"))
        .stdout(contains("Prefix entropy: 0.458146"))
        .stdout(contains("Elapsed time:"));
}

#[test]
fn writes_reports_and_charts() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_log(dir.path(), "first.xes");
    let second = write_log(dir.path(), "second.xes");
    let plots = dir.path().join("plots");
    let json = dir.path().join("reports.json");
    let csv = dir.path().join("reports.csv");
    cmd()
        .arg("-q")
        .arg(&first)
        .arg(&second)
        .arg("--plots-dir")
        .arg(&plots)
        .arg("--json")
        .arg(&json)
        .arg("--csv")
        .arg(&csv)
        .assert()
        .success();

    for stem in ["variants", "perc_variants", "edit_distance", "prefix_entropy"] {
        assert!(plots.join(format!("{stem}.svg")).exists(), "missing {stem}.svg");
    }
    let reports: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(reports[0]["log_name"], "first");
    assert_eq!(reports[1]["log_name"], "second");
    assert_eq!(reports[1]["variant_count"], 2);
    let summary = std::fs::read_to_string(&csv).unwrap();
    assert_eq!(summary.lines().count(), 3);
}

#[test]
fn uses_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), "small.xes");
    let config = dir.path().join("config.json");
    std::fs::write(
        &config,
        serde_json::json!({
            "logs": [log],
            "plots": false,
            "quiet": true,
            "classifier": "Activity"
        })
        .to_string(),
    )
    .unwrap();
    cmd()
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(contains("3.1: Number of variants: 2"));
}

#[test]
fn unknown_classifier_fails() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), "small.xes");
    cmd()
        .args(["-q", "--no-plots", "--classifier", "Resource"])
        .arg(&log)
        .assert()
        .failure()
        .stderr(contains("Resource"));
}

#[test]
fn missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .args(["-q", "--no-plots"])
        .arg(dir.path().join("missing.xes"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("missing.xes").and(contains("error")));
}

#[test]
fn default_logs_are_read_from_xes_dir() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .args(["-q", "--no-plots", "--xes-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(contains("BPIChallenge2011.xes"));
}

#[test]
fn streamed_logs_fall_back_to_global_activity() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("globals.xes");
    std::fs::write(
        &log,
        r#"<log xes.version="1.0">
    <global scope="event"><string key="concept:name" value="a"/></global>
    <trace><event><string key="concept:name" value="a"/></event></trace>
    <trace><event><string key="org:resource" value="Pete"/></event></trace>
</log>"#,
    )
    .unwrap();
    // Both traces are <a> once the global default is applied
    cmd()
        .args(["-q", "--no-plots"])
        .arg(&log)
        .assert()
        .success()
        .stdout(contains("3.1: Number of variants: 1"))
        .stdout(contains("- 1 traces appears 2 times"));
}
