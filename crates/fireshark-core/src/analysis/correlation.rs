use serde::{Deserialize, Serialize};

use super::anomaly::{
    Anomaly, BoundaryAnalysis, BoundaryJump, ClickAnalysis, SpectralAnalysis, SpectralAnomaly,
};
use super::continuity::Discontinuity;

/// Boundary jumps within this many packets of a discontinuity are related.
const CORRELATION_WINDOW: usize = 1;
const MAX_DBC_DEDUCTION: u32 = 50;
const MAX_SPECTRAL_DEDUCTION: u32 = 30;
const MAX_CLICK_DEDUCTION: u32 = 20;
/// Correlation percentage above which the stability recommendation is added.
const HIGH_CORRELATION_PERCENT: f64 = 50.0;

/// A DBC discontinuity and the audio findings next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub discontinuity: Discontinuity,
    pub related: Vec<Anomaly>,
    pub has_audio_impact: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationStats {
    pub total_dbc_issues: usize,
    pub dbc_issues_with_audio_impact: usize,
    /// Share of discontinuities with audio impact, 0 when there are none.
    pub correlation_percentage: f64,
    pub total_audio_discontinuities: usize,
    pub total_spectral_anomalies: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationAnalysis {
    pub correlations: Vec<Correlation>,
    pub stats: CorrelationStats,
}

/// Attach boundary jumps to the discontinuities they sit next to.
///
/// A jump is related when it is on the discontinuity's channel and either
/// side of its seam is within one packet of the discontinuity. Missing
/// analyses count as no findings.
pub fn correlate(
    discontinuities: &[Discontinuity],
    boundaries: Option<&BoundaryAnalysis>,
    spectral: Option<&SpectralAnalysis>,
) -> CorrelationAnalysis {
    let jumps = boundaries.map(|b| b.discontinuities.as_slice()).unwrap_or(&[]);

    let correlations: Vec<Correlation> = discontinuities
        .iter()
        .map(|disc| {
            let related: Vec<Anomaly> = jumps
                .iter()
                .filter(|jump| is_related(jump, disc))
                .cloned()
                .map(Anomaly::Boundary)
                .collect();
            let mut description = format!("DBC issue at packet {}", disc.packet_index);
            if !related.is_empty() {
                description.push_str(&format!(
                    " correlates with {} audio discontinuity(s)",
                    related.len()
                ));
            }
            Correlation {
                discontinuity: disc.clone(),
                has_audio_impact: !related.is_empty(),
                related,
                description,
            }
        })
        .collect();

    let with_impact = correlations.iter().filter(|c| c.has_audio_impact).count();
    let stats = CorrelationStats {
        total_dbc_issues: correlations.len(),
        dbc_issues_with_audio_impact: with_impact,
        correlation_percentage: if correlations.is_empty() {
            0.0
        } else {
            with_impact as f64 / correlations.len() as f64 * 100.0
        },
        total_audio_discontinuities: jumps.len(),
        total_spectral_anomalies: spectral.map_or(0, |s| s.anomalies.len()),
    };
    CorrelationAnalysis {
        correlations,
        stats,
    }
}

fn is_related(jump: &BoundaryJump, disc: &Discontinuity) -> bool {
    jump.channel == disc.channel
        && [jump.packet_index, jump.next_packet_index]
            .iter()
            .any(|&index| index.abs_diff(disc.packet_index) <= CORRELATION_WINDOW)
}

/// Every audio finding of one run, boundary jumps first, then spectral
/// findings, then clicks.
pub fn collect_anomalies(
    boundaries: Option<&BoundaryAnalysis>,
    spectral: Option<&SpectralAnalysis>,
    clicks: Option<&ClickAnalysis>,
) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    if let Some(boundaries) = boundaries {
        anomalies.extend(boundaries.discontinuities.iter().cloned().map(Anomaly::Boundary));
    }
    if let Some(spectral) = spectral {
        anomalies.extend(spectral.anomalies.iter().cloned().map(Anomaly::Spectral));
    }
    if let Some(clicks) = clicks {
        anomalies.extend(clicks.clicks.iter().cloned().map(Anomaly::Click));
    }
    anomalies
}

impl Anomaly {
    /// One-line human readable summary.
    pub fn describe(&self) -> String {
        match self {
            Self::Boundary(jump) => format!(
                "boundary jump {:.4} after packet {} (channel {}, {:.2} ms)",
                jump.jump_magnitude, jump.packet_index, jump.channel, jump.time_ms
            ),
            Self::Spectral(anomaly) => anomaly.description().to_string(),
            Self::Click(click) => format!(
                "click at sample {} ({:.2} ms, amplitude {:.4})",
                click.sample_index, click.time_ms, click.amplitude
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityGrade {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => Self::Excellent,
            70..=89 => Self::Good,
            50..=69 => Self::Fair,
            _ => Self::Poor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// 0 to 100.
    pub score: u32,
    pub grade: QualityGrade,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Deduct capped penalties from 100 and derive grade, issue list and
/// recommendations.
///
/// # Examples
/// ```
/// use fireshark_core::QualityGrade;
/// use fireshark_core::analysis::correlation::score_quality;
///
/// let report = score_quality(3, &[], 4, 0.0);
/// assert_eq!(report.score, 100 - 15 - 8);
/// assert_eq!(report.grade, QualityGrade::Good);
/// ```
pub fn score_quality(
    dbc_issues: usize,
    spectral_anomalies: &[SpectralAnomaly],
    clicks: usize,
    correlation_percentage: f64,
) -> QualityReport {
    let deduction = |count: usize, per: u32, cap: u32| {
        u32::try_from(count).map_or(cap, |n| n.saturating_mul(per).min(cap))
    };

    let mut score: u32 = 100;
    let mut issues = Vec::new();
    if dbc_issues > 0 {
        score = score.saturating_sub(deduction(dbc_issues, 5, MAX_DBC_DEDUCTION));
        issues.push(format!("{dbc_issues} DBC discontinuities"));
    }
    if !spectral_anomalies.is_empty() {
        score = score.saturating_sub(deduction(
            spectral_anomalies.len(),
            10,
            MAX_SPECTRAL_DEDUCTION,
        ));
        issues.push(format!("{} spectral anomalies", spectral_anomalies.len()));
    }
    if clicks > 0 {
        score = score.saturating_sub(deduction(clicks, 2, MAX_CLICK_DEDUCTION));
        issues.push(format!("{clicks} clicks/pops detected"));
    }

    let mut recommendations = Vec::new();
    if dbc_issues > 0 {
        recommendations.push(
            "DBC discontinuities detected. This directly affects audio quality. \
             Check FireWire cable quality, reduce bus activity, or try a different FireWire port."
                .to_string(),
        );
    }
    if spectral_anomalies.iter().any(SpectralAnomaly::is_high_frequency) {
        recommendations.push(
            "High-frequency spectral content detected, indicating clicks/pops or reconstruction \
             errors. Improving FireWire stability should help."
                .to_string(),
        );
    }
    if clicks > 0 {
        recommendations.push(format!(
            "{clicks} clicks/pops detected in audio. These may be caused by DBC synchronization \
             issues. Try using a higher-quality FireWire cable or reducing system load."
        ));
    }
    if correlation_percentage > HIGH_CORRELATION_PERCENT {
        recommendations.push(format!(
            "{correlation_percentage:.0}% of DBC issues correlate with audio problems. \
             DBC stability is critical for this device."
        ));
    }
    if recommendations.is_empty() {
        recommendations.push("Audio quality appears good with no major issues detected.".to_string());
    }

    QualityReport {
        score,
        grade: QualityGrade::from_score(score),
        issues,
        recommendations,
    }
}
