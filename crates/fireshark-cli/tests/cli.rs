use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("fireshark"))
}

fn repo_root() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .parent()
        .and_then(|p| p.parent())
        .expect("repo root")
        .to_path_buf()
}

fn golden_log(case: &str) -> std::path::PathBuf {
    repo_root()
        .join("tests")
        .join("golden")
        .join(case)
        .join("input.log")
}

fn stdout_json(assert: &assert_cmd::assert::Assert) -> Value {
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    serde_json::from_str(&stdout).expect("valid json")
}

#[test]
fn help_supports_analyse_and_analyze() {
    cmd()
        .arg("log")
        .arg("analyse")
        .arg("--help")
        .assert()
        .success();
    cmd()
        .arg("log")
        .arg("analyze")
        .arg("--help")
        .assert()
        .success();
}

#[test]
fn version_names_the_tool() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains("fireshark"));
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.log");
    let report = temp.path().join("report.json");

    cmd()
        .arg("log")
        .arg("analyze")
        .arg(missing)
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .code(2)
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn stdout_outputs_json() {
    let assert = cmd()
        .arg("log")
        .arg("analyze")
        .arg(golden_log("firebug_48k"))
        .arg("--stdout")
        .assert()
        .success();
    let json = stdout_json(&assert);
    assert_eq!(json["report_version"], 1);
    assert_eq!(json["stream_format"]["sample_rate"], 48_000);
}

#[test]
fn deterministic_keeps_epoch_timestamp() {
    let assert = cmd()
        .arg("log")
        .arg("analyze")
        .arg(golden_log("dbc_clean"))
        .arg("--stdout")
        .arg("--deterministic")
        .assert()
        .success();
    assert_eq!(stdout_json(&assert)["generated_at"], "1970-01-01T00:00:00Z");
}

#[test]
fn report_file_is_written() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("out").join("report.json");

    cmd()
        .arg("log")
        .arg("analyse")
        .arg(golden_log("dbc_gap"))
        .arg("-o")
        .arg(&report)
        .arg("--pretty")
        .assert()
        .success()
        .stderr(contains("OK: report written"));

    let written = std::fs::read_to_string(&report).expect("report written");
    let json: Value = serde_json::from_str(&written).expect("valid json");
    assert_eq!(json["dbc"]["discontinuities"].as_array().map(Vec::len), Some(2));
    assert!(written.contains('\n'));
}

#[test]
fn glob_pattern_concatenates_sorted_matches() {
    let pattern = repo_root()
        .join("tests")
        .join("golden")
        .join("firebug_4*k")
        .join("input.log");
    let assert = cmd()
        .arg("log")
        .arg("analyze")
        .arg(pattern)
        .arg("--stdout")
        .assert()
        .success();
    let json = stdout_json(&assert);
    let paths = json["input"]["paths"].as_array().expect("paths");
    assert_eq!(paths.len(), 2);
    assert!(paths[0].as_str().unwrap().contains("firebug_44k"));
    assert!(paths[1].as_str().unwrap().contains("firebug_48k"));
}

#[test]
fn unmatched_pattern_is_an_error() {
    let temp = TempDir::new().expect("tempdir");
    cmd()
        .arg("log")
        .arg("analyze")
        .arg(temp.path().join("*.log"))
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("no files match pattern"));
}

#[test]
fn stdout_and_report_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("log")
        .arg("analyze")
        .arg(golden_log("dbc_clean"))
        .arg("--stdout")
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn pretty_and_compact_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("log")
        .arg("analyze")
        .arg(golden_log("dbc_clean"))
        .arg("-o")
        .arg(report)
        .arg("--pretty")
        .arg("--compact")
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn report_path_must_differ_from_input() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("capture.log");
    std::fs::copy(golden_log("dbc_clean"), &input).expect("copy fixture");

    cmd()
        .arg("log")
        .arg("analyze")
        .arg(&input)
        .arg("-o")
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("report path must differ from input"));
}

#[test]
fn quiet_suppresses_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("log")
        .arg("analyze")
        .arg(golden_log("dbc_clean"))
        .arg("-o")
        .arg(report)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(predicates::str::contains("OK:").not());
}

#[test]
fn list_issues_prints_discontinuities() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("log")
        .arg("analyze")
        .arg(golden_log("firebug_44k"))
        .arg("-o")
        .arg(report)
        .arg("--list-issues")
        .assert()
        .success()
        .stderr(
            contains("DBC discontinuities:")
                .and(contains("No-data packet DBC should be D0 (last data + 8), got C8"))
                .and(contains("1 DBC discontinuities")),
        );
}

#[test]
fn strict_fails_when_discontinuities_present() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("log")
        .arg("analyze")
        .arg(golden_log("firebug_44k"))
        .arg("-o")
        .arg(&report)
        .arg("--strict")
        .assert()
        .failure()
        .code(2)
        .stderr(contains("audio stream issues detected"));
    assert!(report.exists());
}

#[test]
fn config_file_and_flags_are_validated() {
    let temp = TempDir::new().expect("tempdir");
    let config = temp.path().join("config.json");
    std::fs::write(&config, r#"{"fft_size": 0}"#).expect("write config");

    cmd()
        .arg("log")
        .arg("analyze")
        .arg(golden_log("dbc_clean"))
        .arg("--stdout")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(contains("fft_size"));

    cmd()
        .arg("log")
        .arg("analyze")
        .arg(golden_log("dbc_clean"))
        .arg("--stdout")
        .arg("--click-threshold")
        .arg("0")
        .assert()
        .failure()
        .stderr(contains("click_threshold"));
}

#[test]
fn channel_flag_filters_audio_analyses() {
    let assert = cmd()
        .arg("log")
        .arg("analyze")
        .arg(golden_log("multi_channel"))
        .arg("--stdout")
        .arg("--channel")
        .arg("7")
        .assert()
        .success();
    let json = stdout_json(&assert);
    assert_eq!(json["waveform"]["status"], "unavailable");
    assert_eq!(json["capture_summary"]["packets_total"], 8);
}
