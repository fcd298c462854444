//! Packet-level findings: type distribution, data/no-data pattern, length
//! errors, dropouts, suspicious repetitions and the combined health score.

use serde::{Deserialize, Serialize};

use super::Severity;
use super::capture::Capture;
use crate::protocols::cip::format::is_defined_sfc;
use crate::protocols::cip::layout::{FDF_NO_DATA_LEGACY, SFC_MASK, SYT_NO_DATA};
use crate::protocols::cip::{CipHeader, Packet};

/// Number of example packets kept per no-data category.
const MAX_EXAMPLES: usize = 3;
/// Peak below which a packet counts as silent.
const NEAR_SILENCE_PEAK: f64 = 0.001;
/// Repeated-pattern dropouts need more samples than this.
const DROPOUT_PATTERN_MIN_SAMPLES: usize = 4;
const PATTERN_MIN_SAMPLES: usize = 4;
const ALTERNATING_MIN_SAMPLES: usize = 8;
const ALTERNATING_TOLERANCE: f64 = 1e-6;
const HIGH_SEVERITY_SIZE_DIFF: i64 = 100;
const MODERATE_SEVERITY_SIZE_DIFF: i64 = 20;
const HEX_PREVIEW_CHARS: usize = 50;
/// More dropout regions than this add the buffer-size recommendation.
const MANY_DROPOUT_REGIONS: usize = 3;

/// Checks a no-data header must pass; the returned strings describe failures.
///
/// # Examples
/// ```
/// use fireshark_core::analysis::packets::no_data_issues;
/// use fireshark_core::protocols::cip::CipHeader;
///
/// let header = CipHeader { fmt: 0x10, dbs: 2, dbc: 0xc0, fdf: 0x02, syt: 0x1234 };
/// assert_eq!(no_data_issues(&header), vec!["SYT should be 0xFFFF, got 0x1234"]);
/// ```
pub fn no_data_issues(header: &CipHeader) -> Vec<String> {
    let mut issues = Vec::new();
    if header.syt != SYT_NO_DATA {
        issues.push(format!("SYT should be 0xFFFF, got 0x{:04X}", header.syt));
    }
    let sfc = header.fdf & SFC_MASK;
    if header.fdf == FDF_NO_DATA_LEGACY {
        issues.push("FDF is 0xFF (invalid for proper no-data packets)".to_string());
    } else if !is_defined_sfc(sfc) {
        issues.push(format!("Invalid SFC code {sfc} in FDF"));
    }
    issues
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoDataExample {
    pub packet_index: usize,
    pub channel: u32,
    pub dbc: Option<u8>,
    pub syt: Option<u16>,
    pub issues: Vec<String>,
}

impl NoDataExample {
    fn from_packet(packet: &Packet) -> Self {
        Self {
            packet_index: packet.index,
            channel: packet.channel,
            dbc: packet.dbc(),
            syt: packet.syt(),
            issues: packet.no_data_issues.clone(),
        }
    }
}

/// Distribution of data and no-data packets among valid packets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PacketTypeSummary {
    pub total_valid: usize,
    pub data: usize,
    pub no_data: usize,
    /// No-data packets passing every header check.
    pub valid_no_data: usize,
    pub invalid_no_data: usize,
    pub data_percent: f64,
    pub no_data_percent: f64,
    pub valid_no_data_examples: Vec<NoDataExample>,
    pub invalid_no_data_examples: Vec<NoDataExample>,
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Count packet kinds; relies on `no_data_issues` written by the continuity pass.
pub fn summarize_packet_types(packets: &[Packet]) -> PacketTypeSummary {
    let mut summary = PacketTypeSummary::default();
    for packet in packets.iter().filter(|p| p.is_valid()) {
        summary.total_valid += 1;
        if packet.is_data_packet() {
            summary.data += 1;
            continue;
        }
        summary.no_data += 1;
        let (count, examples) = if packet.no_data_issues.is_empty() {
            (&mut summary.valid_no_data, &mut summary.valid_no_data_examples)
        } else {
            (
                &mut summary.invalid_no_data,
                &mut summary.invalid_no_data_examples,
            )
        };
        *count += 1;
        if examples.len() < MAX_EXAMPLES {
            examples.push(NoDataExample::from_packet(packet));
        }
    }
    summary.data_percent = percent(summary.data, summary.total_valid);
    summary.no_data_percent = percent(summary.no_data, summary.total_valid);
    summary
}

/// A run of consecutive packets of one kind in the pattern view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRun {
    /// `D` for data, `N` for no-data.
    pub symbol: char,
    pub length: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PacketPattern {
    /// Space separated `D`/`N` symbols.
    pub pattern: String,
    pub total_packets: usize,
    pub data_packets: usize,
    pub no_data_packets: usize,
    pub data_percentage: f64,
    pub sequences: Vec<PatternRun>,
}

/// Data/no-data layout of the first `limit` valid packets.
///
/// # Examples
/// ```
/// use fireshark_core::Capture;
/// use fireshark_core::analysis::packets::packet_pattern;
///
/// let capture = Capture::from_log_text(
///     "Isoch channel 0, tag 1, sy 0, size 8\n 000200c0 9002ffff\n\
///      Isoch channel 0, tag 1, sy 0, size 12\n 000200c8 90020000 40000001\n",
/// );
/// assert_eq!(packet_pattern(capture.packets(), 50).pattern, "N D");
/// ```
pub fn packet_pattern(packets: &[Packet], limit: usize) -> PacketPattern {
    let mut pattern = PacketPattern::default();
    let mut symbols = Vec::new();
    for packet in packets.iter().filter(|p| p.is_valid()).take(limit) {
        let symbol = if packet.is_data_packet() {
            pattern.data_packets += 1;
            'D'
        } else {
            pattern.no_data_packets += 1;
            'N'
        };
        symbols.push(symbol.to_string());
        match pattern.sequences.last_mut() {
            Some(run) if run.symbol == symbol => run.length += 1,
            _ => pattern.sequences.push(PatternRun { symbol, length: 1 }),
        }
    }
    pattern.total_packets = symbols.len();
    pattern.pattern = symbols.join(" ");
    pattern.data_percentage = percent(pattern.data_packets, pattern.total_packets);
    pattern
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthError {
    pub packet_index: usize,
    pub channel: u32,
    pub timestamp: String,
    pub declared_size: u32,
    pub actual_size: Option<u32>,
    /// `actual - declared`, when the actual size is known.
    pub size_diff: Option<i64>,
    pub severity: Severity,
    pub has_explicit_length_error: bool,
    pub length_error_bytes: Option<u32>,
    pub hex_preview: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LengthErrorAnalysis {
    pub total_errors: usize,
    pub high_severity: usize,
    pub moderate_severity: usize,
    pub low_severity: usize,
    pub explicit_length_errors: usize,
    pub errors: Vec<LengthError>,
}

fn hex_preview(words: &[String]) -> String {
    let joined = words.join(" ");
    if joined.len() > HEX_PREVIEW_CHARS {
        format!("{}...", &joined[..HEX_PREVIEW_CHARS])
    } else {
        joined
    }
}

/// Packets with a `LENGTH ERROR` marker or a declared size that differs from
/// the actual size. Invalid packets are included.
pub fn detect_length_errors(packets: &[Packet]) -> LengthErrorAnalysis {
    let mut analysis = LengthErrorAnalysis::default();
    for packet in packets {
        let explicit = packet.has_length_error();
        let size_diff = packet
            .actual_size
            .map(|actual| i64::from(actual) - i64::from(packet.declared_size));
        let mismatch = size_diff.is_some_and(|diff| diff != 0);
        if !explicit && !mismatch {
            continue;
        }

        let magnitude = size_diff.map_or(0, i64::abs);
        let severity = if explicit || magnitude > HIGH_SEVERITY_SIZE_DIFF {
            Severity::High
        } else if magnitude > MODERATE_SEVERITY_SIZE_DIFF {
            Severity::Moderate
        } else {
            Severity::Low
        };
        match severity {
            Severity::High => analysis.high_severity += 1,
            Severity::Moderate => analysis.moderate_severity += 1,
            Severity::Low => analysis.low_severity += 1,
        }
        if explicit {
            analysis.explicit_length_errors += 1;
        }
        analysis.errors.push(LengthError {
            packet_index: packet.index,
            channel: packet.channel,
            timestamp: packet.timestamp_label(),
            declared_size: packet.declared_size,
            actual_size: packet.actual_size,
            size_diff,
            severity,
            has_explicit_length_error: explicit,
            length_error_bytes: packet.length_error_bytes,
            hex_preview: hex_preview(&packet.hex_words),
        });
    }
    analysis.total_errors = analysis.errors.len();
    analysis
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropoutKind {
    AllZeros,
    NearSilence,
    RepeatedPattern,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dropout {
    pub packet_index: usize,
    pub channel: u32,
    pub timestamp: String,
    pub dbc: Option<u8>,
    #[serde(rename = "type")]
    pub kind: DropoutKind,
    pub max_amplitude: f64,
    pub sample_count: usize,
}

/// Consecutive dropout packets on one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropoutRegion {
    pub channel: u32,
    pub start_packet: usize,
    pub end_packet: usize,
    pub start_timestamp: String,
    pub end_timestamp: String,
    pub packet_count: usize,
    /// Kinds in first-seen order.
    pub types: Vec<DropoutKind>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DropoutAnalysis {
    pub total_dropout_packets: usize,
    pub dropout_regions: usize,
    pub dropouts: Vec<Dropout>,
    pub regions: Vec<DropoutRegion>,
    /// Sorted ascending.
    pub channels_affected: Vec<u32>,
}

fn peak(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0_f64, |acc, s| acc.max(s.abs()))
}

fn dropout_kind(packet: &Packet) -> Option<DropoutKind> {
    let samples = &packet.audio_samples;
    if samples.len() > DROPOUT_PATTERN_MIN_SAMPLES && samples.iter().all(|&s| s == samples[0]) {
        return Some(DropoutKind::RepeatedPattern);
    }
    if packet.samples_are_zero {
        Some(DropoutKind::AllZeros)
    } else if !samples.is_empty() && peak(samples) < NEAR_SILENCE_PEAK {
        Some(DropoutKind::NearSilence)
    } else {
        None
    }
}

/// Silent, zeroed or frozen data packets, merged into regions.
///
/// A region ends at the first packet that is not a dropout, or when the
/// next dropout belongs to another channel.
pub fn detect_dropouts(packets: &[&Packet]) -> DropoutAnalysis {
    let mut analysis = DropoutAnalysis::default();
    let mut current: Option<DropoutRegion> = None;

    for packet in packets {
        let Some(kind) = dropout_kind(packet) else {
            analysis.regions.extend(current.take());
            continue;
        };
        let dropout = Dropout {
            packet_index: packet.index,
            channel: packet.channel,
            timestamp: packet.timestamp_label(),
            dbc: packet.dbc(),
            kind,
            max_amplitude: peak(&packet.audio_samples),
            sample_count: packet.audio_samples.len(),
        };

        match current.as_mut().filter(|r| r.channel == dropout.channel) {
            Some(region) => {
                region.end_packet = dropout.packet_index;
                region.end_timestamp = dropout.timestamp.clone();
                region.packet_count += 1;
                if !region.types.contains(&kind) {
                    region.types.push(kind);
                }
            }
            None => {
                analysis.regions.extend(current.take());
                current = Some(DropoutRegion {
                    channel: dropout.channel,
                    start_packet: dropout.packet_index,
                    end_packet: dropout.packet_index,
                    start_timestamp: dropout.timestamp.clone(),
                    end_timestamp: dropout.timestamp.clone(),
                    packet_count: 1,
                    types: vec![kind],
                });
            }
        }
        if !analysis.channels_affected.contains(&dropout.channel) {
            analysis.channels_affected.push(dropout.channel);
        }
        analysis.dropouts.push(dropout);
    }
    analysis.regions.extend(current);

    analysis.channels_affected.sort_unstable();
    analysis.total_dropout_packets = analysis.dropouts.len();
    analysis.dropout_regions = analysis.regions.len();
    analysis
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RepeatedPattern {
    /// Every sample holds the same non-zero value.
    SingleValueRepetition { value: f64 },
    /// Samples repeat with period two.
    AlternatingPattern { pattern_values: [f64; 2] },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAnomaly {
    pub packet_index: usize,
    pub channel: u32,
    pub timestamp: String,
    pub sample_count: usize,
    #[serde(flatten)]
    pub pattern: RepeatedPattern,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternAnalysis {
    pub total_pattern_anomalies: usize,
    pub anomalies: Vec<PatternAnomaly>,
    /// Sorted ascending.
    pub channels_affected: Vec<u32>,
}

fn distinct_values(samples: &[f64]) -> usize {
    let mut bits: Vec<u64> = samples.iter().map(|s| s.to_bits()).collect();
    bits.sort_unstable();
    bits.dedup();
    bits.len()
}

fn repeated_pattern(samples: &[f64]) -> Option<RepeatedPattern> {
    if samples.len() < PATTERN_MIN_SAMPLES {
        return None;
    }
    let distinct = distinct_values(samples);
    if distinct == 1 && samples[0] != 0.0 {
        return Some(RepeatedPattern::SingleValueRepetition { value: samples[0] });
    }
    if samples.len() < ALTERNATING_MIN_SAMPLES || distinct > 2 {
        return None;
    }
    let alternating = samples
        .iter()
        .enumerate()
        .skip(2)
        .all(|(j, s)| (s - samples[j % 2]).abs() <= ALTERNATING_TOLERANCE);
    alternating.then_some(RepeatedPattern::AlternatingPattern {
        pattern_values: [samples[0], samples[1]],
    })
}

/// Data packets whose samples look frozen or stuck between two values.
pub fn detect_repeated_patterns(packets: &[&Packet]) -> PatternAnalysis {
    let mut analysis = PatternAnalysis::default();
    for packet in packets {
        let Some(pattern) = repeated_pattern(&packet.audio_samples) else {
            continue;
        };
        if !analysis.channels_affected.contains(&packet.channel) {
            analysis.channels_affected.push(packet.channel);
        }
        analysis.anomalies.push(PatternAnomaly {
            packet_index: packet.index,
            channel: packet.channel,
            timestamp: packet.timestamp_label(),
            sample_count: packet.audio_samples.len(),
            pattern,
        });
    }
    analysis.channels_affected.sort_unstable();
    analysis.total_pattern_anomalies = analysis.anomalies.len();
    analysis
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthLevel {
    Excellent,
    Good,
    Moderate,
    Poor,
    Critical,
}

impl HealthLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 95.0 {
            Self::Excellent
        } else if score >= 85.0 {
            Self::Good
        } else if score >= 70.0 {
            Self::Moderate
        } else if score >= 50.0 {
            Self::Poor
        } else {
            Self::Critical
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub dbc_discontinuities: usize,
    pub length_errors: usize,
    pub dropout_packets: usize,
    pub pattern_anomalies: usize,
}

impl IssueSummary {
    pub fn total(&self) -> usize {
        self.dbc_discontinuities + self.length_errors + self.dropout_packets + self.pattern_anomalies
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketHealth {
    /// Channel the dropout and pattern scans were restricted to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u32>,
    /// 0 to 100, one decimal.
    pub score: f64,
    pub level: HealthLevel,
    pub total_packets: usize,
    pub total_issues: usize,
    pub issue_summary: IssueSummary,
    pub length_errors: LengthErrorAnalysis,
    pub dropouts: DropoutAnalysis,
    pub patterns: PatternAnalysis,
    pub recommendations: Vec<String>,
}

impl Default for PacketHealth {
    fn default() -> Self {
        Self {
            channel: None,
            score: 100.0,
            level: HealthLevel::Excellent,
            total_packets: 0,
            total_issues: 0,
            issue_summary: IssueSummary::default(),
            length_errors: LengthErrorAnalysis::default(),
            dropouts: DropoutAnalysis::default(),
            patterns: PatternAnalysis::default(),
            recommendations: health_recommendations(
                &IssueSummary::default(),
                &LengthErrorAnalysis::default(),
                &DropoutAnalysis::default(),
            ),
        }
    }
}

fn health_recommendations(
    summary: &IssueSummary,
    length_errors: &LengthErrorAnalysis,
    dropouts: &DropoutAnalysis,
) -> Vec<String> {
    let mut recommendations = Vec::new();
    if summary.dbc_discontinuities > 0 {
        recommendations.push(
            "DBC discontinuities detected - Check device synchronization and consider buffer adjustments"
                .to_string(),
        );
    }
    if summary.length_errors > 0 {
        recommendations.push(
            "Packet length errors detected - Investigate USB/FireWire connection stability"
                .to_string(),
        );
        if length_errors.high_severity > 0 {
            recommendations.push(
                "Severe length errors present - Check cable integrity and power supply".to_string(),
            );
        }
    }
    if summary.dropout_packets > 0 {
        recommendations
            .push("Audio dropouts detected - Check for CPU overload or buffer underruns".to_string());
        if dropouts.dropout_regions > MANY_DROPOUT_REGIONS {
            recommendations.push(
                "Multiple dropout regions found - Consider increasing buffer sizes".to_string(),
            );
        }
    }
    if summary.pattern_anomalies > 0 {
        recommendations.push(
            "Suspicious audio patterns detected - Check device firmware and driver compatibility"
                .to_string(),
        );
    }
    if recommendations.is_empty() {
        recommendations.push(
            "No significant packet-level anomalies detected - Stream appears healthy".to_string(),
        );
    }
    recommendations
}

/// Combine DBC, length, dropout and pattern findings into one health score.
///
/// DBC discontinuities and length errors cover the whole capture; dropout
/// and pattern scans follow `channel`.
pub fn assess_packet_health(capture: &Capture, channel: Option<u32>) -> PacketHealth {
    let data = capture.data_packets(channel);
    let length_errors = detect_length_errors(capture.packets());
    let dropouts = detect_dropouts(&data);
    let patterns = detect_repeated_patterns(&data);

    let issue_summary = IssueSummary {
        dbc_discontinuities: capture.continuity().discontinuities.len(),
        length_errors: length_errors.total_errors,
        dropout_packets: dropouts.total_dropout_packets,
        pattern_anomalies: patterns.total_pattern_anomalies,
    };
    let total_packets = capture.packets().iter().filter(|p| p.is_valid()).count();
    let total_issues = issue_summary.total();
    let raw = 100.0 - total_issues as f64 / total_packets.max(1) as f64 * 100.0;
    let score = (raw.max(0.0) * 10.0).round() / 10.0;

    PacketHealth {
        channel,
        score,
        level: HealthLevel::from_score(score),
        total_packets,
        total_issues,
        recommendations: health_recommendations(&issue_summary, &length_errors, &dropouts),
        issue_summary,
        length_errors,
        dropouts,
        patterns,
    }
}
