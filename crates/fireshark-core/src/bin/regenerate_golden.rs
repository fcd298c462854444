use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use fireshark_core::{AnalysisConfig, analyze_log_files};
use serde_json::{Map, Value};

/// Report fields pinned by the golden summaries.
const GOLDEN_POINTERS: &[&str] = &[
    "/capture_summary/packets_total",
    "/capture_summary/valid_packets",
    "/capture_summary/invalid_packets",
    "/capture_summary/data_packets",
    "/capture_summary/no_data_packets",
    "/capture_summary/channels",
    "/capture_summary/time_start",
    "/capture_summary/time_end",
    "/stream_format/status",
    "/stream_format/sample_rate",
    "/stream_format/syt_interval",
    "/packet_types/total_valid",
    "/packet_types/data",
    "/packet_types/no_data",
    "/packet_types/valid_no_data",
    "/packet_types/invalid_no_data",
    "/packet_pattern/pattern",
    "/dbc/channels",
    "/dbc/expected_increment",
    "/dbc/discontinuities",
    "/syt/status",
    "/correlation/stats/total_dbc_issues",
    "/packet_health/level",
    "/packet_health/issue_summary",
    "/packet_health/length_errors/total_errors",
    "/packet_health/length_errors/high_severity",
    "/packet_health/length_errors/moderate_severity",
    "/packet_health/length_errors/low_severity",
    "/packet_health/length_errors/explicit_length_errors",
    "/packet_health/dropouts/total_dropout_packets",
    "/packet_health/dropouts/dropout_regions",
];

fn main() -> ExitCode {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<(), String> {
    let root = PathBuf::from("tests").join("golden");
    let entries =
        fs::read_dir(&root).map_err(|err| format!("failed to read {}: {}", root.display(), err))?;

    for entry in entries {
        let entry = entry.map_err(|err| format!("failed to read entry: {}", err))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let input = path.join("input.log");
        if !input.exists() {
            continue;
        }
        let output = path.join("expected_summary.json");
        regenerate_one(&input, &output)?;
    }

    Ok(())
}

fn regenerate_one(input: &Path, output: &Path) -> Result<(), String> {
    let report = analyze_log_files(&[input.to_path_buf()], &AnalysisConfig::default())
        .map_err(|err| format!("analysis failed for {}: {}", input.display(), err))?;
    let value = serde_json::to_value(&report)
        .map_err(|err| format!("JSON serialization failed: {}", err))?;

    let mut summary = Map::new();
    for pointer in GOLDEN_POINTERS {
        let field = value.pointer(pointer).cloned().unwrap_or(Value::Null);
        summary.insert((*pointer).to_string(), field);
    }
    let mut json = serde_json::to_string_pretty(&Value::Object(summary))
        .map_err(|err| format!("JSON serialization failed: {}", err))?;
    json.push('\n');
    fs::write(output, json)
        .map_err(|err| format!("failed to write {}: {}", output.display(), err))?;
    Ok(())
}
