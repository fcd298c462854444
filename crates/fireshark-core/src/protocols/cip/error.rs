use thiserror::Error;

/// Errors returned by CIP decoding.
///
/// # Examples
/// ```
/// use fireshark_core::protocols::cip::error::CipError;
///
/// let err = CipError::TooFewWords { needed: 2, actual: 1 };
/// assert!(err.to_string().contains("too few words"));
/// ```
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipError {
    #[error("too few words: need {needed}, got {actual}")]
    TooFewWords { needed: usize, actual: usize },
    #[error("malformed hex word at {index}: {word:?}")]
    MalformedWord { index: usize, word: String },
}
