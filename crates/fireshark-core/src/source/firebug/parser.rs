use std::str::Lines;

use tracing::debug;

use super::reader::{RecordHeader, hex_words, read_header, read_length_error};
use crate::source::LogRecord;

/// Streaming tokenizer over FireBug log text.
///
/// Yields records in line order. Positions count emitted records only, so a
/// dropped (empty) record does not leave a gap.
pub struct FirebugTokenizer<'a> {
    lines: Lines<'a>,
    line_no: usize,
    current: Option<PendingRecord>,
    next_position: usize,
    done: bool,
}

struct PendingRecord {
    header: RecordHeader,
    line_no: usize,
    length_error_bytes: Option<u32>,
    hex_words: Vec<String>,
}

impl<'a> FirebugTokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            line_no: 0,
            current: None,
            next_position: 0,
            done: false,
        }
    }

    fn finish(&mut self, pending: PendingRecord) -> Option<LogRecord> {
        if pending.hex_words.is_empty() {
            debug!(line = pending.line_no, "dropping record without hex words");
            return None;
        }
        let position = self.next_position;
        self.next_position += 1;
        let RecordHeader {
            timestamp,
            channel,
            tag,
            sy,
            declared_size,
            actual_size,
        } = pending.header;
        Some(LogRecord {
            position,
            channel,
            tag,
            sy,
            declared_size,
            actual_size,
            timestamp,
            length_error_bytes: pending.length_error_bytes,
            hex_words: pending.hex_words,
        })
    }
}

impl Iterator for FirebugTokenizer<'_> {
    type Item = LogRecord;

    fn next(&mut self) -> Option<LogRecord> {
        if self.done {
            return None;
        }
        while let Some(line) = self.lines.next() {
            self.line_no += 1;

            if let Some(header) = read_header(line) {
                let closed = self.current.take();
                match header {
                    Ok(header) => {
                        self.current = Some(PendingRecord {
                            header,
                            line_no: self.line_no,
                            length_error_bytes: None,
                            hex_words: Vec::new(),
                        });
                    }
                    Err(err) => {
                        debug!(line = self.line_no, error = %err, "skipping unreadable header");
                    }
                }
                if let Some(record) = closed.and_then(|pending| self.finish(pending)) {
                    return Some(record);
                }
                continue;
            }

            let line_no = self.line_no;
            let Some(pending) = self.current.as_mut() else {
                continue;
            };
            match read_length_error(line) {
                Some(Ok(bytes)) => pending.length_error_bytes = Some(bytes),
                Some(Err(err)) => {
                    debug!(line = line_no, error = %err, "ignoring unreadable length error marker");
                }
                None => {}
            }
            pending
                .hex_words
                .extend(hex_words(line).map(str::to_string));
        }

        self.done = true;
        let last = self.current.take()?;
        self.finish(last)
    }
}

/// Tokenize a complete log into records.
///
/// # Examples
/// ```
/// use fireshark_core::source::firebug::tokenize_log;
///
/// let log = "036:1900:3068  Isoch channel 0, tag 1, sy 0, size 8 [actual 8] s400\n\
///            \x20              0000   000200c0 9001ffff                     ........\n";
/// let records = tokenize_log(log);
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].hex_words, vec!["000200c0", "9001ffff"]);
/// ```
pub fn tokenize_log(text: &str) -> Vec<LogRecord> {
    FirebugTokenizer::new(text).collect()
}
