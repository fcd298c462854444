use serde::{Deserialize, Serialize};

use crate::Outcome;
use crate::protocols::cip::Packet;
use crate::protocols::cip::layout::CYCLE_TIMER_HZ;

/// SYT progression across data packets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SytAnalysis {
    pub packet_count: usize,
    /// Sample count of the first data packet.
    pub samples_per_packet: usize,
    /// Expected SYT advance per packet in cycle-timer ticks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theoretical_delta: Option<f64>,
    pub mean_delta: f64,
    /// Population standard deviation of the deltas (jitter).
    pub std_delta: f64,
    pub min_delta: u32,
    pub max_delta: u32,
}

/// Successive SYT differences with 16-bit wraparound.
///
/// # Examples
/// ```
/// use fireshark_core::analysis::syt::syt_deltas;
///
/// assert_eq!(syt_deltas(&[0xfff0, 0x0010]), vec![0x20]);
/// ```
pub fn syt_deltas(syts: &[u16]) -> Vec<u32> {
    syts.windows(2)
        .map(|pair| u32::from(pair[1].wrapping_sub(pair[0])))
        .collect()
}

/// Analyze SYT deltas over data packets in stream order.
pub fn analyze_syt(data_packets: &[&Packet], sample_rate: u32) -> Outcome<SytAnalysis> {
    let syts: Vec<u16> = data_packets.iter().filter_map(|p| p.syt()).collect();
    if syts.len() < 2 {
        return Outcome::unavailable("not enough data packets for SYT analysis");
    }

    let deltas = syt_deltas(&syts);
    let count = deltas.len() as f64;
    let mean = deltas.iter().map(|&d| f64::from(d)).sum::<f64>() / count;
    let variance = deltas
        .iter()
        .map(|&d| (f64::from(d) - mean).powi(2))
        .sum::<f64>()
        / count;

    let samples_per_packet = data_packets
        .first()
        .map_or(0, |p| p.audio_samples.len());
    let theoretical_delta = (sample_rate > 0 && samples_per_packet > 0)
        .then(|| samples_per_packet as f64 * (CYCLE_TIMER_HZ / f64::from(sample_rate)));

    Outcome::Available(SytAnalysis {
        packet_count: syts.len(),
        samples_per_packet,
        theoretical_delta,
        mean_delta: mean,
        std_delta: variance.sqrt(),
        min_delta: deltas.iter().copied().min().unwrap_or(0),
        max_delta: deltas.iter().copied().max().unwrap_or(0),
    })
}
