use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;

use tracing::debug;

use super::firebug::tokenize_log;
use super::{LogRecord, RecordSource, SourceError};

/// Record source over log text already held in memory.
pub struct LogTextSource {
    records: VecDeque<LogRecord>,
}

impl LogTextSource {
    pub fn new(text: &str) -> Self {
        Self {
            records: tokenize_log(text).into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl RecordSource for LogTextSource {
    fn next_record(&mut self) -> Result<Option<LogRecord>, SourceError> {
        Ok(self.records.pop_front())
    }
}

/// Record source over one or more log files, concatenated in the given order.
///
/// Every file is read before the first record is handed out. Files are
/// decoded lossily (sniffer logs are ASCII) and joined on a line boundary so
/// the last line of one file never merges with the first line of the next.
pub struct LogFileSource {
    paths: Vec<PathBuf>,
    bytes: u64,
    inner: LogTextSource,
}

impl LogFileSource {
    pub fn open(paths: &[PathBuf]) -> Result<Self, SourceError> {
        if paths.is_empty() {
            return Err(SourceError::NoInputs);
        }
        let mut text = String::new();
        let mut bytes = 0u64;
        for path in paths {
            let raw = fs::read(path)?;
            bytes += raw.len() as u64;
            debug!(path = %path.display(), bytes = raw.len(), "read log file");
            append_log_text(&mut text, &String::from_utf8_lossy(&raw));
        }
        Ok(Self {
            paths: paths.to_vec(),
            bytes,
            inner: LogTextSource::new(&text),
        })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Total size of all inputs in bytes.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl RecordSource for LogFileSource {
    fn next_record(&mut self) -> Result<Option<LogRecord>, SourceError> {
        self.inner.next_record()
    }
}

fn append_log_text(buffer: &mut String, chunk: &str) {
    if !buffer.is_empty() && !buffer.ends_with('\n') {
        buffer.push('\n');
    }
    buffer.push_str(chunk);
}
