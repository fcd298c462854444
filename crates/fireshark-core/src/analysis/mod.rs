use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{AnalysisConfig, ConfigError};
use crate::source::{LogFileSource, LogTextSource, RecordSource, SourceError};
use crate::{CaptureSummary, InputInfo, Report, make_stub_report};

pub mod anomaly;
pub mod capture;
pub mod continuity;
pub mod correlation;
pub mod packets;
pub mod syt;
pub mod waveform;

use anomaly::{analyze_boundaries, analyze_spectrum, detect_clicks};
use capture::Capture;
use correlation::{correlate, score_quality};
use packets::{assess_packet_health, packet_pattern, summarize_packet_types};
use syt::analyze_syt;
use waveform::waveform_metrics;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Finding severity shared by packet-level and spectral findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Moderate,
    High,
}

/// Analyze one or more log files, concatenated in the given order.
pub fn analyze_log_files(
    paths: &[PathBuf],
    config: &AnalysisConfig,
) -> Result<Report, AnalysisError> {
    config.validate()?;
    let source = LogFileSource::open(paths)?;
    let input = InputInfo {
        paths: paths.iter().map(|p| p.display().to_string()).collect(),
        bytes: source.bytes(),
    };
    analyze_source(input, source, config)
}

/// Analyze log text held in memory.
///
/// # Examples
/// ```
/// use fireshark_core::{AnalysisConfig, analyze_log_text};
///
/// let log = "Isoch channel 0, tag 1, sy 0, size 8\n   000200c0 9001ffff\n";
/// let report = analyze_log_text(log, &AnalysisConfig::default())?;
/// assert_eq!(report.packet_types.no_data, 1);
/// # Ok::<(), fireshark_core::AnalysisError>(())
/// ```
pub fn analyze_log_text(text: &str, config: &AnalysisConfig) -> Result<Report, AnalysisError> {
    config.validate()?;
    let input = InputInfo {
        paths: Vec::new(),
        bytes: text.len() as u64,
    };
    analyze_source(input, LogTextSource::new(text), config)
}

pub fn analyze_source<S: RecordSource>(
    input: InputInfo,
    mut source: S,
    config: &AnalysisConfig,
) -> Result<Report, AnalysisError> {
    let capture = Capture::from_source(&mut source)?;
    let mut report = analyze_capture(&capture, config);
    report.input = input;
    Ok(report)
}

/// Run every analysis over a decoded capture.
///
/// The report's `input` section is left empty for the caller to fill.
pub fn analyze_capture(capture: &Capture, config: &AnalysisConfig) -> Report {
    let sample_rate = capture.sample_rate();
    let mut report = make_stub_report(&[], 0);

    report.capture_summary = Some(capture_summary(capture));
    report.stream_format = capture.format().clone();
    report.packet_types = summarize_packet_types(capture.packets());
    report.packet_pattern = packet_pattern(capture.packets(), config.pattern_packets);
    report.dbc = capture.continuity().clone();
    report.syt = analyze_syt(&capture.data_packets(None), sample_rate);
    report.waveform = waveform_metrics(&capture.aggregated_samples(config.channel), sample_rate);

    let clean = capture.clean_data_packets(config.channel, config.edge_trim());
    let clean_samples: Vec<f64> = clean
        .iter()
        .flat_map(|p| p.audio_samples.iter().copied())
        .collect();
    report.boundaries = analyze_boundaries(&clean, sample_rate, config.boundary_jump_threshold);
    report.spectral = analyze_spectrum(
        &clean_samples,
        sample_rate,
        config.fft_size,
        config.peak_min_distance,
    );
    report.clicks = detect_clicks(
        &clean_samples,
        sample_rate,
        config.click_threshold,
        config.highpass_cutoff_hz,
    );

    report.correlation = correlate(
        &report.dbc.discontinuities,
        report.boundaries.available(),
        report.spectral.available(),
    );
    report.quality = score_quality(
        report.dbc.discontinuities.len(),
        report
            .spectral
            .available()
            .map(|s| s.anomalies.as_slice())
            .unwrap_or(&[]),
        report.clicks.available().map_or(0, |c| c.total_clicks),
        report.correlation.stats.correlation_percentage,
    );
    report.packet_health = assess_packet_health(capture, config.channel);

    info!(
        packets = capture.packets().len(),
        sample_rate,
        discontinuities = report.dbc.discontinuities.len(),
        score = report.quality.score,
        grade = ?report.quality.grade,
        "analysis complete"
    );
    report
}

fn capture_summary(capture: &Capture) -> CaptureSummary {
    let packets = capture.packets();
    let valid = packets.iter().filter(|p| p.is_valid()).count() as u64;
    let data = packets.iter().filter(|p| p.is_data_packet()).count() as u64;
    CaptureSummary {
        packets_total: packets.len() as u64,
        valid_packets: valid,
        invalid_packets: packets.len() as u64 - valid,
        data_packets: data,
        no_data_packets: valid - data,
        channels: capture.channels(),
        time_start: packets
            .iter()
            .find_map(|p| p.timestamp)
            .map(|ts| ts.to_string()),
        time_end: packets
            .iter()
            .rev()
            .find_map(|p| p.timestamp)
            .map(|ts| ts.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{analyze_log_files, analyze_log_text};
    use crate::AnalysisError;
    use crate::config::AnalysisConfig;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const SAMPLE_48K: &str = "001:0001:0001  Isoch channel 0, tag 1, sy 0, size 8 [actual 8] s400
               0000   000200c0 9002ffff                     ........
001:0001:0002  Isoch channel 0, tag 1, sy 0, size 24 [actual 24] s400
               0000   000200c8 90020123 40000010 40000020   ........@...@...
               0010   40000030 40000040                     @...@...
001:0001:0003  Isoch channel 0, tag 1, sy 0, size 24 [actual 24] s400
               0000   000200d0 90020323 40000050 40000060   ........@...@...
               0010   40000070 40000080                     @...@...";

    #[test]
    fn summary_counts_and_format() {
        let report = analyze_log_text(SAMPLE_48K, &AnalysisConfig::default()).unwrap();
        let summary = report.capture_summary.as_ref().unwrap();
        assert_eq!(summary.packets_total, 3);
        assert_eq!(summary.data_packets, 2);
        assert_eq!(summary.no_data_packets, 1);
        assert_eq!(summary.time_start.as_deref(), Some("001:0001:0001"));
        assert_eq!(summary.time_end.as_deref(), Some("001:0001:0003"));

        let format = report.stream_format.available().unwrap();
        assert_eq!(format.sample_rate, Some(48_000));
        assert!(report.dbc.discontinuities.is_empty());
        assert!(!report.quality.issues.iter().any(|i| i.contains("DBC")));
        let syt = report.syt.available().unwrap();
        assert_eq!(syt.min_delta, 0x200);
    }

    #[test]
    fn invalid_config_is_rejected_before_reading() {
        let config = AnalysisConfig {
            fft_size: 0,
            ..AnalysisConfig::default()
        };
        let err = analyze_log_files(&[PathBuf::from("missing.txt")], &config).unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    fn files_report_input_metadata() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("capture.txt");
        fs::write(&path, SAMPLE_48K).unwrap();
        let report = analyze_log_files(&[path.clone()], &AnalysisConfig::default()).unwrap();
        assert_eq!(report.input.paths, vec![path.display().to_string()]);
        assert_eq!(report.input.bytes, SAMPLE_48K.len() as u64);
    }

    #[test]
    fn empty_log_completes_with_unavailable_sections() {
        let report = analyze_log_text("", &AnalysisConfig::default()).unwrap();
        assert!(!report.stream_format.is_available());
        assert!(!report.syt.is_available());
        assert!(!report.waveform.is_available());
        assert!(!report.clicks.is_available());
        assert_eq!(report.quality.score, 100);
    }
}
