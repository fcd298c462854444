//! Per-channel Data Block Counter validation.
//!
//! Each channel runs its own state machine over its valid packets in arrival
//! order:
//! - a no-data packet must carry the last data DBC + 8 (unchecked before the
//!   first data packet) and does not move the data reference;
//! - the first data packet of a channel is the reference and is not checked;
//! - a data packet right after a no-data packet repeats the no-data DBC;
//! - any other data packet advances by the stream's SYT_INTERVAL.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::packets::no_data_issues;
use crate::protocols::cip::{DbcStatus, Packet, PacketKind};

/// DBC advance expected on a no-data packet, whatever the SYT_INTERVAL.
pub const NO_DATA_DBC_INCREMENT: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PacketClass {
    Data,
    NoData,
}

/// A DBC value that broke the per-channel sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discontinuity {
    pub channel: u32,
    /// Stream index of the offending packet.
    pub packet_index: usize,
    pub packet_class: PacketClass,
    pub previous_data_dbc: u8,
    pub expected_dbc: u8,
    pub actual_dbc: u8,
    pub description: String,
    /// A data packet that directly followed a no-data packet; always false
    /// for no-data entries.
    pub after_no_data: bool,
}

/// Result of the DBC continuity pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbcContinuity {
    pub total_packets: usize,
    /// Channels in first-seen order.
    pub channels: Vec<u32>,
    /// DBC increment between consecutive data packets (the SYT_INTERVAL).
    pub expected_increment: u32,
    /// Discontinuities in stream order.
    pub discontinuities: Vec<Discontinuity>,
}

#[derive(Debug, Default)]
struct ChannelState {
    last_data_dbc: Option<u8>,
    last_packet_dbc: Option<u8>,
    prev_was_no_data: bool,
}

fn advance(dbc: u8, increment: u32) -> u8 {
    ((u32::from(dbc) + increment) % 256) as u8
}

impl ChannelState {
    fn observe_no_data(
        &mut self,
        channel: u32,
        index: usize,
        dbc: u8,
    ) -> (DbcStatus, Option<Discontinuity>) {
        let outcome = match self.last_data_dbc {
            None => (DbcStatus::NoData, None),
            Some(last_data) => {
                let expected = advance(last_data, NO_DATA_DBC_INCREMENT);
                if dbc == expected {
                    (DbcStatus::Correct, None)
                } else {
                    (
                        DbcStatus::Incorrect,
                        Some(Discontinuity {
                            channel,
                            packet_index: index,
                            packet_class: PacketClass::NoData,
                            previous_data_dbc: last_data,
                            expected_dbc: expected,
                            actual_dbc: dbc,
                            description: format!(
                                "No-data packet DBC should be {expected:02X} (last data + {NO_DATA_DBC_INCREMENT}), got {dbc:02X}"
                            ),
                            after_no_data: false,
                        }),
                    )
                }
            }
        };
        self.last_packet_dbc = Some(dbc);
        self.prev_was_no_data = true;
        outcome
    }

    fn observe_data(
        &mut self,
        channel: u32,
        index: usize,
        dbc: u8,
        increment: u32,
    ) -> (DbcStatus, Option<Discontinuity>) {
        let Some(last_data) = self.last_data_dbc else {
            self.last_data_dbc = Some(dbc);
            self.last_packet_dbc = Some(dbc);
            self.prev_was_no_data = false;
            return (DbcStatus::First, None);
        };

        let after_no_data = self.prev_was_no_data;
        let expected = match (after_no_data, self.last_packet_dbc) {
            (true, Some(no_data_dbc)) => no_data_dbc,
            _ => advance(last_data, increment),
        };
        let outcome = if dbc == expected {
            (DbcStatus::Correct, None)
        } else {
            let description = if after_no_data {
                format!(
                    "Data packet after no-data should have DBC {expected:02X} (same as no-data), got {dbc:02X}"
                )
            } else {
                format!(
                    "Data packet should have DBC {expected:02X} (last data + {increment}), got {dbc:02X}"
                )
            };
            (
                DbcStatus::Incorrect,
                Some(Discontinuity {
                    channel,
                    packet_index: index,
                    packet_class: PacketClass::Data,
                    previous_data_dbc: last_data,
                    expected_dbc: expected,
                    actual_dbc: dbc,
                    description,
                    after_no_data,
                }),
            )
        };

        self.last_data_dbc = Some(dbc);
        self.last_packet_dbc = Some(dbc);
        self.prev_was_no_data = false;
        outcome
    }
}

/// Validate DBC sequencing and annotate every valid packet.
///
/// Writes `dbc_status` on each valid packet and `no_data_issues` on no-data
/// packets. Invalid packets keep the `Unknown` status and are skipped.
pub fn annotate_continuity(packets: &mut [Packet], syt_interval: u32) -> DbcContinuity {
    let mut states: HashMap<u32, ChannelState> = HashMap::new();
    let mut channels = Vec::new();
    let mut discontinuities = Vec::new();

    for packet in packets.iter_mut() {
        let Some(header) = packet.header else {
            continue;
        };
        let channel = packet.channel;
        let state = states.entry(channel).or_insert_with(|| {
            channels.push(channel);
            ChannelState::default()
        });

        let (status, discontinuity) = match packet.kind {
            PacketKind::NoData => {
                packet.no_data_issues = no_data_issues(&header);
                state.observe_no_data(channel, packet.index, header.dbc)
            }
            PacketKind::Data => {
                state.observe_data(channel, packet.index, header.dbc, syt_interval)
            }
            PacketKind::Invalid => continue,
        };
        trace!(
            index = packet.index,
            channel,
            dbc = header.dbc,
            status = ?status,
            "dbc transition"
        );
        packet.dbc_status = status;
        discontinuities.extend(discontinuity);
    }

    DbcContinuity {
        total_packets: packets.len(),
        channels,
        expected_increment: syt_interval,
        discontinuities,
    }
}
