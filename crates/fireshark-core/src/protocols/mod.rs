//! Protocol decoding modules.
//!
//! Each protocol follows a layered structure:
//! - `layout`: bit positions, masks and constant tables (source of truth)
//! - `reader`: safe word access and hex conventions
//! - `parser`: domain-level decoding (no direct bit twiddling on raw text)
//! - `error`: explicit, actionable errors
//!
//! Parsers are pure and contain no I/O; sources and analysis layers handle
//! file access and aggregation.

pub mod cip;
