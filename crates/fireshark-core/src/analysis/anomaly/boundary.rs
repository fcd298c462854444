use serde::{Deserialize, Serialize};

use crate::Outcome;
use crate::protocols::cip::{DbcStatus, Packet};

/// Sample jump across one packet boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketBoundary {
    pub channel: u32,
    /// Stream index of the packet before the boundary.
    pub packet_index: usize,
    pub next_packet_index: usize,
    /// Samples of this channel preceding the boundary.
    pub sample_position: usize,
    pub time_seconds: f64,
    pub sample_jump: f64,
    pub dbc_current: u8,
    pub dbc_next: u8,
    pub dbc_status_current: DbcStatus,
    pub dbc_status_next: DbcStatus,
    /// Jump above threshold, or the next packet broke the DBC sequence.
    pub is_problematic: bool,
}

/// A boundary whose sample jump exceeds the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryJump {
    pub channel: u32,
    pub packet_index: usize,
    pub next_packet_index: usize,
    pub sample_position: usize,
    pub time_ms: f64,
    pub jump_magnitude: f64,
    /// The next packet's DBC status is `incorrect`.
    pub dbc_issue: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryAnalysis {
    pub threshold: f64,
    pub total_boundaries: usize,
    pub problematic_boundaries: usize,
    pub max_jump: f64,
    pub mean_jump: f64,
    pub discontinuities: Vec<BoundaryJump>,
    pub boundaries: Vec<PacketBoundary>,
}

/// Compare the last sample of each packet with the first sample of the next
/// packet on the same channel.
///
/// `packets` are data packets in stream order; pairs are formed within each
/// channel (channels in first-seen order). Packets without samples do not
/// form a boundary.
pub fn analyze_boundaries(
    packets: &[&Packet],
    sample_rate: u32,
    threshold: f64,
) -> Outcome<BoundaryAnalysis> {
    if packets.len() < 2 {
        return Outcome::unavailable("need at least 2 packets for continuity analysis");
    }

    let mut channels: Vec<u32> = Vec::new();
    for packet in packets {
        if !channels.contains(&packet.channel) {
            channels.push(packet.channel);
        }
    }

    let rate = f64::from(sample_rate.max(1));
    let mut boundaries = Vec::new();
    let mut discontinuities = Vec::new();
    for channel in channels {
        let lane: Vec<&Packet> = packets
            .iter()
            .copied()
            .filter(|p| p.channel == channel)
            .collect();
        let mut sample_position = 0usize;
        for pair in lane.windows(2) {
            let (current, next) = (pair[0], pair[1]);
            let (Some(&last), Some(&first)) =
                (current.audio_samples.last(), next.audio_samples.first())
            else {
                continue;
            };
            let jump = (first - last).abs();
            sample_position += current.audio_samples.len();
            let dbc_issue = next.dbc_status == DbcStatus::Incorrect;
            let time_seconds = sample_position as f64 / rate;

            boundaries.push(PacketBoundary {
                channel,
                packet_index: current.index,
                next_packet_index: next.index,
                sample_position,
                time_seconds,
                sample_jump: jump,
                dbc_current: current.dbc().unwrap_or_default(),
                dbc_next: next.dbc().unwrap_or_default(),
                dbc_status_current: current.dbc_status,
                dbc_status_next: next.dbc_status,
                is_problematic: jump > threshold || dbc_issue,
            });
            if jump > threshold {
                discontinuities.push(BoundaryJump {
                    channel,
                    packet_index: current.index,
                    next_packet_index: next.index,
                    sample_position,
                    time_ms: time_seconds * 1000.0,
                    jump_magnitude: jump,
                    dbc_issue,
                });
            }
        }
    }

    let max_jump = boundaries
        .iter()
        .fold(0.0_f64, |acc, b| acc.max(b.sample_jump));
    let mean_jump = if boundaries.is_empty() {
        0.0
    } else {
        boundaries.iter().map(|b| b.sample_jump).sum::<f64>() / boundaries.len() as f64
    };
    Outcome::Available(BoundaryAnalysis {
        threshold,
        total_boundaries: boundaries.len(),
        problematic_boundaries: boundaries.iter().filter(|b| b.is_problematic).count(),
        max_jump,
        mean_jump,
        discontinuities,
        boundaries,
    })
}
