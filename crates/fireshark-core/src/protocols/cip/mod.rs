//! IEC 61883-6 Common Isochronous Packet decoding (AM824 audio).
//!
//! The parser reads the two-quadlet CIP header, classifies the packet as data
//! or no-data (`SYT == 0xFFFF`, or the legacy `FDF == 0xFF` marker) and turns
//! every remaining quadlet of a data packet into a normalized AM824 sample.
//! Decode failures never escape: they produce a packet of kind `invalid`.
//!
//! Bit positions live in `layout`, hex-word access in `reader`, and the
//! sample-rate tables derived from the FDF in `format`.

pub mod error;
pub mod format;
pub mod layout;
pub mod packet;
pub mod parser;
pub mod reader;

pub use format::{StreamFormat, Subformat};
pub use packet::{CipHeader, DbcStatus, Packet, PacketKind};
pub use parser::{decode_am824_sample, decode_record, parse_cip_header};
