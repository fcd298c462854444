use serde::{Deserialize, Serialize};

use crate::source::CaptureTimestamp;

/// Decoded CIP header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipHeader {
    pub fmt: u8,
    pub dbs: u8,
    pub dbc: u8,
    pub fdf: u8,
    pub syt: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PacketKind {
    /// Header missing or unreadable; excluded from every analysis.
    Invalid,
    Data,
    NoData,
}

/// DBC continuity verdict attached once by the continuity pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DbcStatus {
    #[default]
    Unknown,
    First,
    Correct,
    Incorrect,
    NoData,
}

/// One decoded isochronous packet.
///
/// Everything except `dbc_status` and `no_data_issues` is fixed at decode
/// time; those two are written by the continuity pass and read-only after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// Position in the full record stream.
    pub index: usize,
    pub channel: u32,
    pub tag: u32,
    pub sy: u32,
    pub declared_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<CaptureTimestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_error_bytes: Option<u32>,
    pub hex_words: Vec<String>,
    pub kind: PacketKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<CipHeader>,
    /// Normalized AM824 samples; empty unless `kind` is `Data`.
    pub audio_samples: Vec<f64>,
    /// Every raw payload quadlet is zero (vacuously true for an empty payload).
    pub samples_are_zero: bool,
    pub dbc_status: DbcStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub no_data_issues: Vec<String>,
}

impl Packet {
    pub fn is_valid(&self) -> bool {
        self.kind != PacketKind::Invalid
    }

    pub fn is_data_packet(&self) -> bool {
        self.kind == PacketKind::Data
    }

    pub fn is_no_data_packet(&self) -> bool {
        self.kind == PacketKind::NoData
    }

    pub fn has_length_error(&self) -> bool {
        self.length_error_bytes.is_some()
    }

    pub fn dbc(&self) -> Option<u8> {
        self.header.map(|h| h.dbc)
    }

    pub fn syt(&self) -> Option<u16> {
        self.header.map(|h| h.syt)
    }

    /// Capture timestamp in sniffer notation, or `Unknown`.
    pub fn timestamp_label(&self) -> String {
        self.timestamp
            .map(|ts| ts.to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}
