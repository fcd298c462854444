//! FireShark core library for offline FireWire isochronous audio audits.
//!
//! This crate implements the analysis pipeline used by the CLI: log sources
//! tokenize sniffer text into records, the CIP decoder (layout/reader/parser)
//! turns records into packets, and the analysis layer validates DBC/SYT
//! sequencing and looks for audio anomalies before aggregating everything
//! into a deterministic report. Decoding is text-oriented and side-effect
//! free; all I/O is isolated in `source`.
//!
//! Invariants:
//! - Record order is file order, then line order; continuity depends on it.
//! - Packets are decoded once and annotated with a DBC status exactly once.
//! - Malformed input never aborts a run; it yields invalid packets, findings
//!   or `Outcome::Unavailable` sections.
//!
//! # Examples
//! ```no_run
//! use std::path::PathBuf;
//!
//! use fireshark_core::{AnalysisConfig, analyze_log_files};
//!
//! let report = analyze_log_files(&[PathBuf::from("capture.txt")], &AnalysisConfig::default())?;
//! println!("quality: {}", report.quality.score);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

pub mod analysis;
pub mod config;
pub mod protocols;
pub mod source;

pub use analysis::anomaly::{
    Anomaly, BoundaryAnalysis, BoundaryJump, Click, ClickAnalysis, ClickMethod, PacketBoundary,
    SpectralAnalysis, SpectralAnomaly,
};
pub use analysis::capture::Capture;
pub use analysis::continuity::{DbcContinuity, Discontinuity, PacketClass};
pub use analysis::correlation::{
    Correlation, CorrelationAnalysis, CorrelationStats, QualityGrade, QualityReport,
};
pub use analysis::packets::{
    DropoutAnalysis, HealthLevel, LengthErrorAnalysis, PacketHealth, PacketPattern,
    PacketTypeSummary, PatternAnalysis,
};
pub use analysis::syt::SytAnalysis;
pub use analysis::waveform::WaveformMetrics;
pub use analysis::{
    AnalysisError, Severity, analyze_capture, analyze_log_files, analyze_log_text,
    analyze_source,
};
pub use config::{AnalysisConfig, ConfigError};
pub use protocols::cip::{DbcStatus, Packet, PacketKind, StreamFormat};
pub use source::{
    CaptureTimestamp, LogFileSource, LogRecord, LogTextSource, RecordSource, SourceError,
};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when the caller does not stamp the report.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Result of an analysis that may lack the data it needs.
///
/// Serialized with a `status` tag so consumers can tell an empty result from
/// one that could not be computed.
///
/// # Examples
/// ```
/// use fireshark_core::Outcome;
///
/// let outcome: Outcome<fireshark_core::SytAnalysis> =
///     Outcome::unavailable("need at least 2 data packets");
/// let value = serde_json::to_value(&outcome)?;
/// assert_eq!(value["status"], "unavailable");
/// assert_eq!(value["reason"], "need at least 2 data packets");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> Outcome<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn available(&self) -> Option<&T> {
        match self {
            Self::Available(value) => Some(value),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Aggregated analysis report with deterministic ordering.
///
/// # Examples
/// ```
/// use fireshark_core::make_stub_report;
///
/// let report = make_stub_report(&["capture.txt".to_string()], 123);
/// assert_eq!(report.report_version, fireshark_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    pub tool: ToolInfo,
    /// RFC3339 timestamp representing the report generation time.
    pub generated_at: String,
    pub input: InputInfo,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_summary: Option<CaptureSummary>,
    /// Format taken from the first data packet.
    pub stream_format: Outcome<StreamFormat>,
    pub packet_types: PacketTypeSummary,
    pub packet_pattern: PacketPattern,
    pub dbc: DbcContinuity,
    pub syt: Outcome<SytAnalysis>,
    pub waveform: Outcome<WaveformMetrics>,
    pub boundaries: Outcome<BoundaryAnalysis>,
    pub spectral: Outcome<SpectralAnalysis>,
    pub clicks: Outcome<ClickAnalysis>,
    pub correlation: CorrelationAnalysis,
    pub quality: QualityReport,
    pub packet_health: PacketHealth,
}

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use fireshark_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "fireshark".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "fireshark");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input metadata embedded in reports.
///
/// # Examples
/// ```
/// use fireshark_core::InputInfo;
///
/// let input = InputInfo {
///     paths: vec!["a.txt".to_string(), "b.txt".to_string()],
///     bytes: 1024,
/// };
/// assert_eq!(input.paths.len(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input paths in concatenation order.
    pub paths: Vec<String>,
    /// Total size of all inputs in bytes.
    pub bytes: u64,
}

/// Packet counts of the whole capture.
///
/// # Examples
/// ```
/// use fireshark_core::CaptureSummary;
///
/// let summary = CaptureSummary {
///     packets_total: 3,
///     valid_packets: 3,
///     invalid_packets: 0,
///     data_packets: 1,
///     no_data_packets: 2,
///     channels: vec![0],
///     time_start: Some("036:1900:3068".to_string()),
///     time_end: None,
/// };
/// assert_eq!(summary.packets_total, 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Records read from the log.
    pub packets_total: u64,
    pub valid_packets: u64,
    pub invalid_packets: u64,
    pub data_packets: u64,
    pub no_data_packets: u64,
    /// Channels in first-seen order.
    pub channels: Vec<u32>,
    /// Capture timestamp of the first record (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// Capture timestamp of the last record (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Build a stub report with base fields filled and empty aggregates.
///
/// # Examples
/// ```
/// use fireshark_core::make_stub_report;
///
/// let report = make_stub_report(&["capture.txt".to_string()], 123);
/// assert_eq!(report.report_version, fireshark_core::REPORT_VERSION);
/// assert!(report.dbc.discontinuities.is_empty());
/// assert_eq!(report.quality.score, 100);
/// ```
pub fn make_stub_report(input_paths: &[String], input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "fireshark".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            paths: input_paths.to_vec(),
            bytes: input_bytes,
        },
        capture_summary: None,
        stream_format: Outcome::unavailable("not analyzed"),
        packet_types: PacketTypeSummary::default(),
        packet_pattern: PacketPattern::default(),
        dbc: DbcContinuity::default(),
        syt: Outcome::unavailable("not analyzed"),
        waveform: Outcome::unavailable("not analyzed"),
        boundaries: Outcome::unavailable("not analyzed"),
        spectral: Outcome::unavailable("not analyzed"),
        clicks: Outcome::unavailable("not analyzed"),
        correlation: CorrelationAnalysis::default(),
        quality: analysis::correlation::score_quality(0, &[], 0, 0.0),
        packet_health: PacketHealth::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_omits_optional_fields_when_none() {
        let mut report = make_stub_report(&["capture.txt".to_string()], 1);
        report.capture_summary = Some(CaptureSummary {
            packets_total: 1,
            valid_packets: 1,
            invalid_packets: 0,
            data_packets: 1,
            no_data_packets: 0,
            channels: vec![0],
            time_start: None,
            time_end: None,
        });

        let value = serde_json::to_value(&report).expect("report json");
        let capture = value.get("capture_summary").expect("capture_summary");
        assert!(capture.get("time_start").is_none());
        assert!(capture.get("time_end").is_none());
        assert_eq!(value["syt"]["status"], "unavailable");
        assert_eq!(value["quality"]["grade"], "excellent");
    }

    #[test]
    fn available_outcome_flattens_value() {
        let outcome = Outcome::Available(StreamFormat::from_fdf(0x02));
        let value = serde_json::to_value(&outcome).expect("outcome json");
        assert_eq!(value["status"], "available");
        assert_eq!(value["sample_rate"], 48_000);
        assert_eq!(value["syt_interval"], 8);
        assert!(outcome.is_available());

        let back: Outcome<StreamFormat> = serde_json::from_value(value).expect("outcome back");
        assert_eq!(back, outcome);
    }
}
