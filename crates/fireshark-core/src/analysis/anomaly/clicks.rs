use serde::{Deserialize, Serialize};

use super::filter::{butterworth_highpass_4, sosfilt};
use crate::Outcome;

/// The high-pass method only runs on buffers longer than this.
const MIN_HIGHPASS_SAMPLES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickMethod {
    /// `|x[i+1] - x[i]|` above threshold.
    LargeDifference,
    /// `|x[i+2] - 2·x[i+1] + x[i]|` above threshold.
    SecondDerivative,
    /// High-passed magnitude above threshold.
    HighFrequencyEnergy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Click {
    pub sample_index: usize,
    pub time_ms: f64,
    pub amplitude: f64,
    pub methods: Vec<ClickMethod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickAnalysis {
    pub total_clicks: usize,
    pub click_rate_per_second: f64,
    pub threshold: f64,
    pub analysis_duration_ms: f64,
    /// False when the buffer was too short or the cutoff above Nyquist.
    pub highpass_applied: bool,
    pub clicks: Vec<Click>,
}

/// Run the three click detectors over `samples` and merge their hits.
///
/// Each detector reports the index `i` of the first sample of the window
/// it measured. Clicks are listed by ascending sample index.
pub fn detect_clicks(
    samples: &[f64],
    sample_rate: u32,
    threshold: f64,
    highpass_cutoff_hz: f64,
) -> Outcome<ClickAnalysis> {
    if samples.len() < 3 {
        return Outcome::unavailable("not enough samples for click detection");
    }

    let mut hits: Vec<Vec<ClickMethod>> = vec![Vec::new(); samples.len()];
    for (i, pair) in samples.windows(2).enumerate() {
        if (pair[1] - pair[0]).abs() > threshold {
            hits[i].push(ClickMethod::LargeDifference);
        }
    }
    for (i, triple) in samples.windows(3).enumerate() {
        if (triple[2] - 2.0 * triple[1] + triple[0]).abs() > threshold {
            hits[i].push(ClickMethod::SecondDerivative);
        }
    }

    let sections = (samples.len() > MIN_HIGHPASS_SAMPLES)
        .then(|| butterworth_highpass_4(highpass_cutoff_hz, sample_rate))
        .flatten();
    if let Some(sections) = &sections {
        for (i, value) in sosfilt(sections, samples).into_iter().enumerate() {
            if value.abs() > threshold {
                hits[i].push(ClickMethod::HighFrequencyEnergy);
            }
        }
    }

    let rate = f64::from(sample_rate.max(1));
    let clicks: Vec<Click> = hits
        .into_iter()
        .enumerate()
        .filter(|(_, methods)| !methods.is_empty())
        .map(|(i, methods)| Click {
            sample_index: i,
            time_ms: i as f64 / rate * 1000.0,
            amplitude: samples[i],
            methods,
        })
        .collect();

    let duration_seconds = samples.len() as f64 / rate;
    Outcome::Available(ClickAnalysis {
        total_clicks: clicks.len(),
        click_rate_per_second: clicks.len() as f64 / duration_seconds,
        threshold,
        analysis_duration_ms: duration_seconds * 1000.0,
        highpass_applied: sections.is_some(),
        clicks,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{ClickMethod, detect_clicks};

    #[test]
    fn step_is_caught_by_both_derivatives() {
        let samples = [0.0, 0.0, 0.5, 0.5, 0.5];
        let analysis = detect_clicks(&samples, 1_000, 0.1, 8_000.0)
            .available()
            .cloned()
            .unwrap();
        assert!(!analysis.highpass_applied);
        let indices: Vec<usize> = analysis.clicks.iter().map(|c| c.sample_index).collect();
        // diff1 fires at 1, diff2 at 0 (0.5) and 1 (0.5).
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(analysis.clicks[0].methods, vec![ClickMethod::SecondDerivative]);
        assert_eq!(
            analysis.clicks[1].methods,
            vec![ClickMethod::LargeDifference, ClickMethod::SecondDerivative]
        );
        assert_relative_eq!(analysis.clicks[1].time_ms, 1.0);
        assert_relative_eq!(analysis.analysis_duration_ms, 5.0);
        assert_relative_eq!(analysis.click_rate_per_second, 400.0);
    }

    #[test]
    fn smooth_signal_has_no_clicks() {
        let samples: Vec<f64> = (0..2000)
            .map(|i| 0.5 * (2.0 * std::f64::consts::PI * 100.0 * i as f64 / 48_000.0).sin())
            .collect();
        let analysis = detect_clicks(&samples, 48_000, 0.1, 8_000.0)
            .available()
            .cloned()
            .unwrap();
        assert!(analysis.highpass_applied);
        assert_eq!(analysis.total_clicks, 0);
        assert_eq!(analysis.click_rate_per_second, 0.0);
    }

    #[test]
    fn impulse_triggers_high_frequency_energy() {
        let mut samples = vec![0.0; 400];
        samples[200] = 0.8;
        let analysis = detect_clicks(&samples, 48_000, 0.1, 8_000.0)
            .available()
            .cloned()
            .unwrap();
        let click = analysis
            .clicks
            .iter()
            .find(|c| c.sample_index == 200)
            .unwrap();
        assert!(click.methods.contains(&ClickMethod::HighFrequencyEnergy));
        assert_relative_eq!(click.amplitude, 0.8);
    }

    #[test]
    fn short_buffer_is_unavailable() {
        assert!(!detect_clicks(&[0.0, 1.0], 48_000, 0.1, 8_000.0).is_available());
    }
}
