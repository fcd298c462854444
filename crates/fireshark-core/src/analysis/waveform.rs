use rustfft::{FftPlanner, num_complex::Complex};
use serde::{Deserialize, Serialize};

use crate::Outcome;

/// Added before taking logarithms and used as the RMS floor.
pub const DB_EPSILON: f64 = 1e-9;

/// Level statistics of an aggregated sample buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformMetrics {
    pub sample_count: usize,
    pub duration_seconds: f64,
    pub peak: f64,
    pub peak_dbfs: f64,
    pub rms: f64,
    pub rms_dbfs: f64,
    /// Peak over RMS; zero for a silent buffer.
    pub crest_factor: f64,
    pub dc_offset: f64,
}

/// `20·log10(value + ε)`.
pub fn to_db(value: f64) -> f64 {
    20.0 * (value + DB_EPSILON).log10()
}

pub fn waveform_metrics(samples: &[f64], sample_rate: u32) -> Outcome<WaveformMetrics> {
    if samples.is_empty() {
        return Outcome::unavailable("no audio samples");
    }
    let n = samples.len() as f64;
    let peak = samples.iter().fold(0.0_f64, |acc, s| acc.max(s.abs()));
    let rms = (samples.iter().map(|s| s * s).sum::<f64>() / n).sqrt();
    let dc_offset = samples.iter().sum::<f64>() / n;
    Outcome::Available(WaveformMetrics {
        sample_count: samples.len(),
        duration_seconds: if sample_rate > 0 {
            n / f64::from(sample_rate)
        } else {
            0.0
        },
        peak,
        peak_dbfs: to_db(peak),
        rms,
        rms_dbfs: to_db(rms),
        crest_factor: if rms > DB_EPSILON { peak / rms } else { 0.0 },
        dc_offset,
    })
}

/// One-sided magnitude spectrum in dB.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spectrum {
    /// Number of samples transformed.
    pub fft_size: usize,
    pub frequencies: Vec<f64>,
    pub magnitude_db: Vec<f64>,
}

/// Real FFT of the first `max_size` samples.
///
/// Bins follow the real-FFT spacing: `k · sample_rate / n` for
/// `k = 0..=n/2`.
pub fn spectrum(samples: &[f64], sample_rate: u32, max_size: usize) -> Spectrum {
    let n = samples.len().min(max_size);
    if n == 0 {
        return Spectrum::default();
    }

    let mut buffer: Vec<Complex<f64>> = samples[..n]
        .iter()
        .map(|&s| Complex::new(s, 0.0))
        .collect();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let bins = n / 2 + 1;
    let bin_hz = f64::from(sample_rate) / n as f64;
    Spectrum {
        fft_size: n,
        frequencies: (0..bins).map(|k| k as f64 * bin_hz).collect(),
        magnitude_db: buffer[..bins].iter().map(|c| to_db(c.norm())).collect(),
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::{spectrum, to_db, waveform_metrics};

    #[test]
    fn metrics_of_square_wave() {
        let samples = [0.5, -0.5, 0.5, -0.5];
        let metrics = waveform_metrics(&samples, 4).available().cloned().unwrap();
        assert_eq!(metrics.sample_count, 4);
        assert_relative_eq!(metrics.duration_seconds, 1.0);
        assert_relative_eq!(metrics.peak, 0.5);
        assert_relative_eq!(metrics.rms, 0.5);
        assert_relative_eq!(metrics.crest_factor, 1.0);
        assert_abs_diff_eq!(metrics.dc_offset, 0.0);
        assert_abs_diff_eq!(metrics.peak_dbfs, -6.0206, epsilon = 1e-3);
    }

    #[test]
    fn silent_buffer_has_zero_crest_factor() {
        let metrics = waveform_metrics(&[0.0; 16], 48_000)
            .available()
            .cloned()
            .unwrap();
        assert_eq!(metrics.crest_factor, 0.0);
        assert_abs_diff_eq!(metrics.peak_dbfs, -180.0, epsilon = 1e-6);
    }

    #[test]
    fn empty_buffer_is_unavailable() {
        assert!(!waveform_metrics(&[], 48_000).is_available());
    }

    #[test]
    fn spectrum_bins_and_tone_peak() {
        let rate = 48_000;
        let n = 64;
        let tone_bin = 8;
        let samples: Vec<f64> = (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * tone_bin as f64 * i as f64 / n as f64).sin())
            .collect();
        let power = spectrum(&samples, rate, 8192);
        assert_eq!(power.fft_size, 64);
        assert_eq!(power.frequencies.len(), 33);
        assert_relative_eq!(power.frequencies[1], 750.0);
        assert_relative_eq!(power.frequencies[32], 24_000.0);

        let (max_bin, _) = power
            .magnitude_db
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        assert_eq!(max_bin, tone_bin);
        assert_relative_eq!(power.magnitude_db[tone_bin], to_db(32.0), epsilon = 1e-9);
    }

    #[test]
    fn spectrum_truncates_to_max_size() {
        let power = spectrum(&[0.1; 100], 44_100, 16);
        assert_eq!(power.fft_size, 16);
        assert_eq!(power.magnitude_db.len(), 9);
        assert!(spectrum(&[], 44_100, 16).frequencies.is_empty());
    }
}
