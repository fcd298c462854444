pub const HEADER_WORDS: usize = 2;
pub const WORD_HEX_DIGITS: usize = 8;

// First header quadlet.
pub const FMT_SHIFT: u32 = 26;
pub const FMT_MASK: u32 = 0x3F;
pub const DBS_SHIFT: u32 = 16;
pub const DBS_MASK: u32 = 0xFF;
pub const DBC_MASK: u32 = 0xFF;

// Second header quadlet.
pub const FDF_SHIFT: u32 = 16;
pub const FDF_MASK: u32 = 0xFF;
pub const SYT_MASK: u32 = 0xFFFF;

pub const SYT_NO_DATA: u16 = 0xFFFF;
pub const FDF_NO_DATA_LEGACY: u8 = 0xFF;

pub const SUBFORMAT_SHIFT: u8 = 4;
pub const SUBFORMAT_MASK: u8 = 0x0F;
pub const SFC_MASK: u8 = 0x07;

pub const AM824_SAMPLE_MASK: u32 = 0x00FF_FFFF;
pub const AM824_SIGN_BIT: i32 = 0x0080_0000;
pub const AM824_MODULUS: i32 = 0x0100_0000;
pub const AM824_FULL_SCALE: f64 = 0x007F_FFFF as f64;

/// IEEE 1394 cycle timer frequency in Hz.
pub const CYCLE_TIMER_HZ: f64 = 24_576_000.0;

/// Nominal sample rate per SFC code.
pub const SFC_SAMPLE_RATES: [u32; 7] = [32_000, 44_100, 48_000, 88_200, 96_000, 176_400, 192_000];
/// SYT_INTERVAL per SFC code.
pub const SFC_SYT_INTERVALS: [u32; 7] = [8, 8, 8, 16, 16, 32, 32];
