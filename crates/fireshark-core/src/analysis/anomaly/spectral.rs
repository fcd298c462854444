use serde::{Deserialize, Serialize};

use super::peaks::find_peaks;
use crate::Outcome;
use crate::analysis::Severity;
use crate::analysis::waveform::spectrum;

/// Mean level assigned to a band without any bin.
pub const EMPTY_BAND_DB: f64 = -100.0;

const HIGH_BAND_START: f64 = 0.8;
const ULTRASONIC_BAND_START: f64 = 0.9;
const HIGH_BAND_MARGIN_DB: f64 = 20.0;
const ULTRASONIC_MARGIN_DB: f64 = 30.0;
const PEAK_MARGIN_DB: f64 = 15.0;
/// Peaks are searched only when the high region has more bins than this.
const MIN_PEAK_REGION_BINS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpectralAnomaly {
    /// High band (0.8 to 0.9 of Nyquist) close to the audio band level.
    ExcessiveHighFrequency {
        description: String,
        low_hz: f64,
        high_hz: f64,
        level_db: f64,
        severity: Severity,
    },
    /// Ultrasonic band (above 0.9 of Nyquist) close to the audio band level.
    UltrasonicContent {
        description: String,
        low_hz: f64,
        high_hz: f64,
        level_db: f64,
        severity: Severity,
    },
    HighFrequencyPeak {
        description: String,
        frequency_hz: f64,
        level_db: f64,
        severity: Severity,
    },
}

impl SpectralAnomaly {
    pub fn severity(&self) -> Severity {
        match self {
            Self::ExcessiveHighFrequency { severity, .. }
            | Self::UltrasonicContent { severity, .. }
            | Self::HighFrequencyPeak { severity, .. } => *severity,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::ExcessiveHighFrequency { description, .. }
            | Self::UltrasonicContent { description, .. }
            | Self::HighFrequencyPeak { description, .. } => description,
        }
    }

    /// Excessive high-band energy or a discrete high-frequency peak.
    pub fn is_high_frequency(&self) -> bool {
        matches!(
            self,
            Self::ExcessiveHighFrequency { .. } | Self::HighFrequencyPeak { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralAnalysis {
    pub fft_size: usize,
    pub nyquist_hz: f64,
    pub audio_band_db: f64,
    pub high_band_db: f64,
    pub ultrasonic_band_db: f64,
    pub anomalies: Vec<SpectralAnomaly>,
}

fn band_mean(levels: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = levels.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Compare band levels of the spectrum of `samples` and look for peaks in the
/// top fifth of the band.
pub fn analyze_spectrum(
    samples: &[f64],
    sample_rate: u32,
    fft_size: usize,
    peak_min_distance: usize,
) -> Outcome<SpectralAnalysis> {
    let power = spectrum(samples, sample_rate, fft_size);
    if power.fft_size == 0 {
        return Outcome::unavailable("no audio samples available");
    }

    let nyquist = f64::from(sample_rate) / 2.0;
    let high_start = nyquist * HIGH_BAND_START;
    let ultrasonic_start = nyquist * ULTRASONIC_BAND_START;
    let bins = || power.frequencies.iter().copied().zip(power.magnitude_db.iter().copied());

    let audio = band_mean(bins().filter(|(f, _)| *f <= high_start).map(|(_, db)| db))
        .unwrap_or(EMPTY_BAND_DB);
    let high = band_mean(
        bins()
            .filter(|(f, _)| *f > high_start && *f <= ultrasonic_start)
            .map(|(_, db)| db),
    )
    .unwrap_or(EMPTY_BAND_DB);
    let ultrasonic = band_mean(bins().filter(|(f, _)| *f > ultrasonic_start).map(|(_, db)| db))
        .unwrap_or(EMPTY_BAND_DB);

    let mut anomalies = Vec::new();
    if high > audio - HIGH_BAND_MARGIN_DB {
        anomalies.push(SpectralAnomaly::ExcessiveHighFrequency {
            description: format!(
                "High frequency energy too strong: {high:.1} dB vs {audio:.1} dB audio"
            ),
            low_hz: high_start,
            high_hz: ultrasonic_start,
            level_db: high,
            severity: Severity::Moderate,
        });
    }
    if ultrasonic > audio - ULTRASONIC_MARGIN_DB {
        anomalies.push(SpectralAnomaly::UltrasonicContent {
            description: format!(
                "Ultrasonic energy detected: {ultrasonic:.1} dB (indicates clicks/pops)"
            ),
            low_hz: ultrasonic_start,
            high_hz: nyquist,
            level_db: ultrasonic,
            severity: Severity::High,
        });
    }

    let (region_freqs, region_db): (Vec<f64>, Vec<f64>) =
        bins().filter(|(f, _)| *f > high_start).unzip();
    if region_db.len() > MIN_PEAK_REGION_BINS {
        for peak in find_peaks(&region_db, audio - PEAK_MARGIN_DB, peak_min_distance) {
            let (frequency, level) = (region_freqs[peak], region_db[peak]);
            anomalies.push(SpectralAnomaly::HighFrequencyPeak {
                description: format!("Spectral peak at {frequency:.0} Hz ({level:.1} dB)"),
                frequency_hz: frequency,
                level_db: level,
                severity: if frequency > ultrasonic_start {
                    Severity::High
                } else {
                    Severity::Moderate
                },
            });
        }
    }

    Outcome::Available(SpectralAnalysis {
        fft_size: power.fft_size,
        nyquist_hz: nyquist,
        audio_band_db: audio,
        high_band_db: high,
        ultrasonic_band_db: ultrasonic,
        anomalies,
    })
}
