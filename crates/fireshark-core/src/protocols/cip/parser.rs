use tracing::debug;

use super::error::CipError;
use super::layout;
use super::packet::{CipHeader, DbcStatus, Packet, PacketKind};
use super::reader::CipReader;
use crate::source::LogRecord;

/// Decode the two-quadlet CIP header.
///
/// # Examples
/// ```
/// use fireshark_core::protocols::cip::{parse_cip_header, reader::CipReader};
///
/// let words = vec!["000200c8".to_string(), "900108a7".to_string()];
/// let header = parse_cip_header(&CipReader::new(&words))?;
/// assert_eq!(header.dbs, 2);
/// assert_eq!(header.dbc, 0xc8);
/// assert_eq!(header.fdf, 0x01);
/// assert_eq!(header.syt, 0x08a7);
/// # Ok::<(), fireshark_core::protocols::cip::error::CipError>(())
/// ```
pub fn parse_cip_header(reader: &CipReader<'_>) -> Result<CipHeader, CipError> {
    reader.require_words(layout::HEADER_WORDS)?;
    let first = reader.read_word(0)?;
    let second = reader.read_word(1)?;
    Ok(CipHeader {
        fmt: ((first >> layout::FMT_SHIFT) & layout::FMT_MASK) as u8,
        dbs: ((first >> layout::DBS_SHIFT) & layout::DBS_MASK) as u8,
        dbc: (first & layout::DBC_MASK) as u8,
        fdf: ((second >> layout::FDF_SHIFT) & layout::FDF_MASK) as u8,
        syt: (second & layout::SYT_MASK) as u16,
    })
}

/// Normalize the 24-bit two's-complement sample in the low bits of an AM824
/// quadlet to `[-1.0, 1.0]`. The label byte is ignored.
///
/// # Examples
/// ```
/// use fireshark_core::protocols::cip::decode_am824_sample;
///
/// assert_eq!(decode_am824_sample(0x407f_ffff), 1.0);
/// assert_eq!(decode_am824_sample(0x4000_0000), 0.0);
/// ```
pub fn decode_am824_sample(word: u32) -> f64 {
    let raw = (word & layout::AM824_SAMPLE_MASK) as i32;
    let signed = if raw >= layout::AM824_SIGN_BIT {
        raw - layout::AM824_MODULUS
    } else {
        raw
    };
    f64::from(signed) / layout::AM824_FULL_SCALE
}

pub fn classify(header: &CipHeader) -> PacketKind {
    if header.syt == layout::SYT_NO_DATA || header.fdf == layout::FDF_NO_DATA_LEGACY {
        PacketKind::NoData
    } else {
        PacketKind::Data
    }
}

struct Decoded {
    header: CipHeader,
    kind: PacketKind,
    samples: Vec<f64>,
    samples_are_zero: bool,
}

fn decode_words(reader: &CipReader<'_>) -> Result<Decoded, CipError> {
    let header = parse_cip_header(reader)?;
    let kind = classify(&header);
    if kind == PacketKind::NoData {
        return Ok(Decoded {
            header,
            kind,
            samples: Vec::new(),
            samples_are_zero: false,
        });
    }

    let mut samples = Vec::with_capacity(reader.len().saturating_sub(layout::HEADER_WORDS));
    let mut all_zero = true;
    for word in reader.payload_words() {
        let word = word?;
        all_zero &= word == 0;
        samples.push(decode_am824_sample(word));
    }
    Ok(Decoded {
        header,
        kind,
        samples,
        samples_are_zero: all_zero,
    })
}

/// Decode one log record into a packet.
///
/// Never fails: a record without a readable header, or with any unreadable
/// payload word, becomes a packet of kind `Invalid` with no header and no
/// samples.
pub fn decode_record(record: &LogRecord) -> Packet {
    let reader = CipReader::new(&record.hex_words);
    let decoded = match decode_words(&reader) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            debug!(
                index = record.position,
                channel = record.channel,
                error = %err,
                "invalid CIP packet"
            );
            None
        }
    };

    let (kind, header, audio_samples, samples_are_zero) = match decoded {
        Some(d) => (d.kind, Some(d.header), d.samples, d.samples_are_zero),
        None => (PacketKind::Invalid, None, Vec::new(), false),
    };

    Packet {
        index: record.position,
        channel: record.channel,
        tag: record.tag,
        sy: record.sy,
        declared_size: record.declared_size,
        actual_size: record.actual_size,
        timestamp: record.timestamp,
        length_error_bytes: record.length_error_bytes,
        hex_words: record.hex_words.clone(),
        kind,
        header,
        audio_samples,
        samples_are_zero,
        dbc_status: DbcStatus::Unknown,
        no_data_issues: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{decode_am824_sample, decode_record};
    use crate::protocols::cip::{DbcStatus, PacketKind};
    use crate::source::LogRecord;

    fn record(words: &[&str]) -> LogRecord {
        LogRecord {
            position: 7,
            channel: 0,
            tag: 1,
            sy: 0,
            declared_size: (words.len() * 4) as u32,
            actual_size: None,
            timestamp: None,
            length_error_bytes: None,
            hex_words: words.iter().map(|w| w.to_string()).collect(),
        }
    }

    fn encode(value: i32) -> u32 {
        0x4000_0000 | ((value as u32) & 0x00FF_FFFF)
    }

    #[test]
    fn header_bit_layout() {
        // fmt 0x10, dbs 0x02, dbc 0x5a / fdf 0x02, syt 0x1234
        let packet = decode_record(&record(&["4002005a", "90021234"]));
        let header = packet.header.unwrap();
        assert_eq!(header.fmt, 0x10);
        assert_eq!(header.dbs, 0x02);
        assert_eq!(header.dbc, 0x5a);
        assert_eq!(header.fdf, 0x02);
        assert_eq!(header.syt, 0x1234);
        assert_eq!(packet.index, 7);
        assert_eq!(packet.dbc_status, DbcStatus::Unknown);
    }

    #[test]
    fn am824_round_trip_over_signed_range() {
        let values = [
            -0x7F_FFFF,
            -0x40_0000,
            -1,
            0,
            1,
            0x12_3456,
            0x40_0000,
            0x7F_FFFF,
        ];
        for value in values {
            let decoded = decode_am824_sample(encode(value));
            assert_relative_eq!(decoded, value as f64 / 0x7F_FFFF as f64, epsilon = 1e-12);
        }
        for value in (-0x7F_FFFF..=0x7F_FFFF).step_by(4099) {
            let decoded = decode_am824_sample(encode(value));
            assert_relative_eq!(decoded, value as f64 / 0x7F_FFFF as f64, epsilon = 1e-12);
        }
    }

    #[test]
    fn most_negative_code_is_slightly_below_minus_one() {
        assert_relative_eq!(
            decode_am824_sample(0x4080_0000),
            -(0x80_0000 as f64) / 0x7F_FFFF as f64
        );
    }

    #[test]
    fn data_packet_decodes_every_payload_word() {
        let packet = decode_record(&record(&["000200c8", "900108a7", "40fa7401", "4002acff"]));
        assert_eq!(packet.kind, PacketKind::Data);
        assert!(packet.is_data_packet());
        assert_eq!(packet.audio_samples.len(), 2);
        assert!(!packet.samples_are_zero);
        assert_relative_eq!(
            packet.audio_samples[0],
            (0xfa7401 - 0x100_0000) as f64 / 0x7F_FFFF as f64
        );
    }

    #[test]
    fn syt_no_data_overrides_payload() {
        let packet = decode_record(&record(&["000200c8", "9001ffff", "40fa7401", "4002acff"]));
        assert_eq!(packet.kind, PacketKind::NoData);
        assert!(packet.is_valid());
        assert!(!packet.is_data_packet());
        assert!(packet.audio_samples.is_empty());
    }

    #[test]
    fn legacy_fdf_marker_is_no_data() {
        let packet = decode_record(&record(&["000200c8", "90ff08a7", "40fa7401"]));
        assert_eq!(packet.kind, PacketKind::NoData);
        assert!(packet.audio_samples.is_empty());
    }

    #[test]
    fn zero_payload_is_flagged() {
        let packet = decode_record(&record(&["000200c8", "900108a7", "00000000", "00000000"]));
        assert!(packet.samples_are_zero);
        let empty = decode_record(&record(&["000200c8", "900108a7"]));
        assert!(empty.is_data_packet());
        assert!(empty.samples_are_zero);
        assert!(empty.audio_samples.is_empty());
    }

    #[test]
    fn short_or_malformed_records_are_invalid() {
        let short = decode_record(&record(&["000200c8"]));
        assert_eq!(short.kind, PacketKind::Invalid);
        assert!(short.header.is_none());

        let malformed = decode_record(&record(&["000200c8", "900108a7", "+0000001"]));
        assert_eq!(malformed.kind, PacketKind::Invalid);
        assert!(malformed.audio_samples.is_empty());
        assert!(!malformed.is_valid());
    }
}
