use regex::Captures;

use super::error::FirebugError;
use super::layout;
use crate::source::CaptureTimestamp;

/// Fields read from a header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    pub timestamp: Option<CaptureTimestamp>,
    pub channel: u32,
    pub tag: u32,
    pub sy: u32,
    pub declared_size: u32,
    pub actual_size: Option<u32>,
}

/// Read a header line.
///
/// Returns `None` when the line is not a header, and an error when it looks
/// like one but carries a number that does not fit.
///
/// # Examples
/// ```
/// use fireshark_core::source::firebug::reader::read_header;
///
/// let header = read_header("036:1902:0014  Isoch channel 0, tag 1, sy 0, size 72 [actual 72] s400")
///     .unwrap()
///     .unwrap();
/// assert_eq!(header.declared_size, 72);
/// assert_eq!(header.actual_size, Some(72));
/// ```
pub fn read_header(line: &str) -> Option<Result<RecordHeader, FirebugError>> {
    let re = match layout::compiled(&layout::HEADER_RE) {
        Ok(re) => re,
        Err(err) => return Some(Err(err)),
    };
    let caps = re.captures(line.trim())?;
    Some(header_from_captures(&caps))
}

fn header_from_captures(caps: &Captures<'_>) -> Result<RecordHeader, FirebugError> {
    let timestamp = match (
        caps.get(layout::TS_CYCLE_GROUP),
        caps.get(layout::TS_SECOND_GROUP),
        caps.get(layout::TS_COUNT_GROUP),
    ) {
        (Some(cycle), Some(second), Some(count)) => Some(CaptureTimestamp {
            cycle: parse_u32("timestamp cycle", cycle.as_str())?,
            second: parse_u32("timestamp second", second.as_str())?,
            count: parse_u32("timestamp count", count.as_str())?,
        }),
        _ => None,
    };

    Ok(RecordHeader {
        timestamp,
        channel: required_u32(caps, layout::CHANNEL_GROUP, "channel")?,
        tag: required_u32(caps, layout::TAG_GROUP, "tag")?,
        sy: required_u32(caps, layout::SY_GROUP, "sy")?,
        declared_size: required_u32(caps, layout::SIZE_GROUP, "size")?,
        actual_size: caps
            .get(layout::ACTUAL_GROUP)
            .map(|m| parse_u32("actual size", m.as_str()))
            .transpose()?,
    })
}

fn required_u32(
    caps: &Captures<'_>,
    group: usize,
    field: &'static str,
) -> Result<u32, FirebugError> {
    let value = caps.get(group).map(|m| m.as_str()).unwrap_or("");
    parse_u32(field, value)
}

fn parse_u32(field: &'static str, value: &str) -> Result<u32, FirebugError> {
    value.parse().map_err(|_| FirebugError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

/// Read the byte count of a `LENGTH ERROR - Snooped N bytes` marker.
pub fn read_length_error(line: &str) -> Option<Result<u32, FirebugError>> {
    let re = match layout::compiled(&layout::LENGTH_ERROR_RE) {
        Ok(re) => re,
        Err(err) => return Some(Err(err)),
    };
    let caps = re.captures(line)?;
    Some(required_u32(&caps, 1, "snooped byte count"))
}

/// Iterate the 8-digit hex words of a line, left to right.
///
/// Yields nothing if the word pattern is unusable; the header reader
/// reports that case.
pub fn hex_words(line: &str) -> impl Iterator<Item = &str> {
    layout::compiled(&layout::HEX_WORD_RE)
        .ok()
        .into_iter()
        .flat_map(move |re| re.find_iter(line))
        .map(|m| m.as_str())
}
