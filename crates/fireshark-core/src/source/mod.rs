//! Log record sources.
//!
//! A source turns captured sniffer text into an ordered stream of
//! `LogRecord`s. Tokenizing is soft (malformed lines are skipped); only file
//! I/O can fail, and it fails before any record is produced.

pub mod firebug;
mod text;

pub use text::{LogFileSource, LogTextSource};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capture timestamp triple printed by the sniffer in front of each header.
///
/// # Examples
/// ```
/// use fireshark_core::CaptureTimestamp;
///
/// let ts = CaptureTimestamp { cycle: 36, second: 1902, count: 14 };
/// assert_eq!(ts.to_string(), "036:1902:0014");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureTimestamp {
    pub cycle: u32,
    pub second: u32,
    pub count: u32,
}

impl std::fmt::Display for CaptureTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}:{:04}:{:04}", self.cycle, self.second, self.count)
    }
}

/// One isochronous packet as it appears in the log, before CIP decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Position in the record stream (file order, then line order).
    pub position: usize,
    pub channel: u32,
    pub tag: u32,
    pub sy: u32,
    /// Size declared in the header line.
    pub declared_size: u32,
    /// Size reported in the `[actual N]` suffix, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<CaptureTimestamp>,
    /// Byte count of a `LENGTH ERROR - Snooped N bytes` marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_error_bytes: Option<u32>,
    /// Collected 8-digit hex words, in log order.
    pub hex_words: Vec<String>,
}

impl LogRecord {
    pub fn has_length_error(&self) -> bool {
        self.length_error_bytes.is_some()
    }
}

pub trait RecordSource {
    fn next_record(&mut self) -> Result<Option<LogRecord>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no input files given")]
    NoInputs,
}
