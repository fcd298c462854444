use std::fs;
use std::path::{Path, PathBuf};

use fireshark_core::{AnalysisConfig, Report, analyze_log_files};
use serde_json::{Map, Value};

fn repo_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

fn load_expected_summary(dir: &str) -> Map<String, Value> {
    let expected_path = repo_root().join(dir).join("expected_summary.json");
    let expected_json = fs::read_to_string(&expected_path).expect("read expected_summary.json");
    serde_json::from_str(&expected_json).expect("parse expected summary")
}

fn analyze(dir: &str) -> Report {
    let input = repo_root().join(dir).join("input.log");
    analyze_log_files(&[input], &AnalysisConfig::default()).expect("analyze log")
}

fn run_golden(dir: &str) {
    let expected = load_expected_summary(dir);
    let actual = serde_json::to_value(analyze(dir)).expect("serialize actual");

    assert!(!expected.is_empty(), "empty golden summary in {dir}");
    for (pointer, expected_value) in &expected {
        let actual_value = actual.pointer(pointer).cloned().unwrap_or(Value::Null);
        assert_eq!(
            &actual_value, expected_value,
            "golden mismatch in {dir} at {pointer}"
        );
    }
}

#[test]
fn golden_firebug_44k() {
    run_golden("tests/golden/firebug_44k");
}

#[test]
fn golden_firebug_48k() {
    run_golden("tests/golden/firebug_48k");
}

#[test]
fn golden_dbc_clean() {
    run_golden("tests/golden/dbc_clean");
}

#[test]
fn golden_dbc_gap() {
    run_golden("tests/golden/dbc_gap");
}

#[test]
fn golden_multi_channel() {
    run_golden("tests/golden/multi_channel");
}

#[test]
fn golden_no_data_mix() {
    run_golden("tests/golden/no_data_mix");
}

#[test]
fn golden_length_error() {
    run_golden("tests/golden/length_error");
}

#[test]
fn golden_dropouts() {
    run_golden("tests/golden/dropouts");
}

#[test]
fn golden_dbc_gap_has_no_data_discontinuity() {
    let report = analyze("tests/golden/dbc_gap");
    let classes: Vec<_> = report
        .dbc
        .discontinuities
        .iter()
        .map(|d| d.packet_class)
        .collect();
    assert_eq!(
        classes,
        vec![
            fireshark_core::PacketClass::Data,
            fireshark_core::PacketClass::NoData
        ]
    );
    assert_eq!(report.correlation.correlations.len(), 2);
    assert!(
        report
            .quality
            .issues
            .contains(&"2 DBC discontinuities".to_string())
    );
}

#[test]
fn golden_no_data_mix_lists_invalid_examples() {
    let report = analyze("tests/golden/no_data_mix");
    let invalid = &report.packet_types.invalid_no_data_examples;
    assert_eq!(invalid.len(), 2);
    assert_eq!(invalid[0].issues, vec!["Invalid SFC code 7 in FDF"]);
    assert_eq!(
        invalid[1].issues,
        vec![
            "SYT should be 0xFFFF, got 0x1234",
            "FDF is 0xFF (invalid for proper no-data packets)"
        ]
    );
}

#[test]
fn golden_inputs_concatenate_in_order() {
    let inputs = [
        repo_root().join("tests/golden/dbc_clean/input.log"),
        repo_root().join("tests/golden/firebug_44k/input.log"),
    ];
    let report = analyze_log_files(&inputs, &AnalysisConfig::default()).expect("analyze logs");
    let summary = report.capture_summary.expect("capture summary");
    assert_eq!(summary.packets_total, 11);
    assert_eq!(summary.time_end.as_deref(), Some("036:1903:0006"));
    assert_eq!(report.input.paths.len(), 2);
}
