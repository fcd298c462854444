use once_cell::sync::Lazy;
use regex::Regex;

use super::error::FirebugError;

/// Header line, matched against the trimmed line.
pub const HEADER_PATTERN: &str = r"^(?:(\d+):(\d+):(\d+)\s+)?Isoch channel (\d+), tag (\d+), sy (\d+), size (\d+)(?:\s+\[actual (\d+)\])?";
/// Whole 8-digit hex words; offsets (`0010`) and ASCII columns do not match.
pub const HEX_WORD_PATTERN: &str = r"\b[0-9a-fA-F]{8}\b";
pub const LENGTH_ERROR_PATTERN: &str = r"LENGTH ERROR - Snooped (\d+) bytes";

pub const TS_CYCLE_GROUP: usize = 1;
pub const TS_SECOND_GROUP: usize = 2;
pub const TS_COUNT_GROUP: usize = 3;
pub const CHANNEL_GROUP: usize = 4;
pub const TAG_GROUP: usize = 5;
pub const SY_GROUP: usize = 6;
pub const SIZE_GROUP: usize = 7;
pub const ACTUAL_GROUP: usize = 8;

pub static HEADER_RE: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(HEADER_PATTERN));
pub static HEX_WORD_RE: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(HEX_WORD_PATTERN));
pub static LENGTH_ERROR_RE: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(LENGTH_ERROR_PATTERN));

/// The compiled pattern behind one of the statics above.
pub fn compiled(
    pattern: &'static Lazy<Result<Regex, regex::Error>>,
) -> Result<&'static Regex, FirebugError> {
    Lazy::force(pattern)
        .as_ref()
        .map_err(|err| FirebugError::Pattern(err.to_string()))
}
