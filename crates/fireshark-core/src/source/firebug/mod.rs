//! FireBug isochronous log tokenizing.
//!
//! A record starts at a header line
//! (`[CCC:SSSS:NNNN ]Isoch channel <ch>, tag <tag>, sy <sy>, size <n> [actual <n>]`)
//! and collects every 8-digit hex word found on the following lines until the
//! next header. A `LENGTH ERROR - Snooped N bytes` marker is recorded on the
//! open record without interrupting word collection.
//!
//! Patterns live in `layout`, line classification in `reader`, and the
//! stateful record assembly in `parser`. Nothing here fails hard: lines that
//! do not fit are skipped and records without hex words are dropped.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::{FirebugTokenizer, tokenize_log};
