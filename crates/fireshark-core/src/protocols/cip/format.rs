use serde::{Deserialize, Serialize};

use super::layout;

/// Sub-format carried in the upper nibble of the FDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subformat {
    Am824,
    Bits24x4,
    Float32,
    Generic32,
    Reserved,
}

impl Subformat {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Am824,
            1 => Self::Bits24x4,
            2 => Self::Float32,
            3 => Self::Generic32,
            _ => Self::Reserved,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Am824 => "AM824",
            Self::Bits24x4 => "24-bit x 4",
            Self::Float32 => "32-bit float",
            Self::Generic32 => "32-bit generic",
            Self::Reserved => "reserved",
        }
    }
}

/// Stream format derived from the FDF of the first data packet.
///
/// # Examples
/// ```
/// use fireshark_core::protocols::cip::StreamFormat;
///
/// let format = StreamFormat::from_fdf(0x01);
/// assert_eq!(format.sample_rate, Some(44_100));
/// assert_eq!(format.syt_interval, Some(8));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFormat {
    pub fdf: u8,
    pub sfc: u8,
    pub subformat: Subformat,
    /// Nominal sample rate in Hz; `None` for the reserved SFC code 7.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syt_interval: Option<u32>,
}

impl StreamFormat {
    pub fn from_fdf(fdf: u8) -> Self {
        let sfc = fdf & layout::SFC_MASK;
        let subformat = (fdf >> layout::SUBFORMAT_SHIFT) & layout::SUBFORMAT_MASK;
        Self {
            fdf,
            sfc,
            subformat: Subformat::from_code(subformat),
            sample_rate: layout::SFC_SAMPLE_RATES.get(sfc as usize).copied(),
            syt_interval: layout::SFC_SYT_INTERVALS.get(sfc as usize).copied(),
        }
    }
}

/// Whether an SFC code selects one of the defined sample rates.
pub fn is_defined_sfc(sfc: u8) -> bool {
    (sfc as usize) < layout::SFC_SAMPLE_RATES.len()
}

#[cfg(test)]
mod tests {
    use super::{StreamFormat, Subformat, is_defined_sfc};

    #[test]
    fn sfc_table() {
        let expected = [
            (0x00, 32_000, 8),
            (0x01, 44_100, 8),
            (0x02, 48_000, 8),
            (0x03, 88_200, 16),
            (0x04, 96_000, 16),
            (0x05, 176_400, 32),
            (0x06, 192_000, 32),
        ];
        for (fdf, rate, interval) in expected {
            let format = StreamFormat::from_fdf(fdf);
            assert_eq!(format.sample_rate, Some(rate), "fdf {fdf:#04x}");
            assert_eq!(format.syt_interval, Some(interval), "fdf {fdf:#04x}");
            assert_eq!(format.subformat, Subformat::Am824);
        }
    }

    #[test]
    fn reserved_sfc_has_no_rate() {
        let format = StreamFormat::from_fdf(0x07);
        assert_eq!(format.sfc, 7);
        assert_eq!(format.sample_rate, None);
        assert_eq!(format.syt_interval, None);
        assert!(!is_defined_sfc(7));
        assert!(is_defined_sfc(6));
    }

    #[test]
    fn subformat_from_upper_nibble() {
        assert_eq!(StreamFormat::from_fdf(0x12).subformat, Subformat::Bits24x4);
        assert_eq!(StreamFormat::from_fdf(0x22).subformat, Subformat::Float32);
        assert_eq!(StreamFormat::from_fdf(0x32).subformat, Subformat::Generic32);
        assert_eq!(StreamFormat::from_fdf(0x42).subformat, Subformat::Reserved);
        assert_eq!(StreamFormat::from_fdf(0x12).sample_rate, Some(48_000));
        assert_eq!(Subformat::Am824.label(), "AM824");
    }
}
