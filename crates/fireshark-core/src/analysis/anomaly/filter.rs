use std::f64::consts::PI;

/// One second-order section, normalized so that `a0 == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 2],
}

impl Biquad {
    /// Bilinear-transform high-pass section with the given quality factor.
    fn highpass(cutoff_hz: f64, sample_rate: f64, q: f64) -> Self {
        let k = (PI * cutoff_hz / sample_rate).tan();
        let k2 = k * k;
        let norm = 1.0 / (1.0 + k / q + k2);
        Self {
            b: [norm, -2.0 * norm, norm],
            a: [2.0 * (k2 - 1.0) * norm, (1.0 - k / q + k2) * norm],
        }
    }
}

/// 4th-order Butterworth high-pass as two cascaded sections.
///
/// Returns `None` unless `0 < cutoff_hz < sample_rate / 2`.
pub fn butterworth_highpass_4(cutoff_hz: f64, sample_rate: u32) -> Option<[Biquad; 2]> {
    let rate = f64::from(sample_rate);
    if !(cutoff_hz > 0.0 && cutoff_hz < rate / 2.0) {
        return None;
    }
    // Pole pairs of the 4th-order prototype sit at ±π/8 and ±3π/8.
    let q1 = 1.0 / (2.0 * (PI / 8.0).cos());
    let q2 = 1.0 / (2.0 * (3.0 * PI / 8.0).cos());
    Some([
        Biquad::highpass(cutoff_hz, rate, q1),
        Biquad::highpass(cutoff_hz, rate, q2),
    ])
}

/// Run the sections over `input` (direct form II transposed, zero initial state).
pub fn sosfilt(sections: &[Biquad], input: &[f64]) -> Vec<f64> {
    let mut output = input.to_vec();
    for section in sections {
        let (mut z1, mut z2) = (0.0, 0.0);
        for sample in output.iter_mut() {
            let x = *sample;
            let y = section.b[0] * x + z1;
            z1 = section.b[1] * x - section.a[0] * y + z2;
            z2 = section.b[2] * x - section.a[1] * y;
            *sample = y;
        }
    }
    output
}
