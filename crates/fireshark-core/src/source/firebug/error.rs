use thiserror::Error;

/// Errors raised while reading a single FireBug log line.
///
/// The tokenizer never surfaces these to callers; a header that fails here
/// closes the open record and the lines after it are skipped.
///
/// # Examples
/// ```
/// use fireshark_core::source::firebug::error::FirebugError;
///
/// let err = FirebugError::InvalidNumber { field: "channel", value: "99999999999".to_string() };
/// assert!(err.to_string().contains("invalid channel"));
/// ```
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FirebugError {
    #[error("invalid {field} value: {value}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("line pattern failed to compile: {0}")]
    Pattern(String),
}
