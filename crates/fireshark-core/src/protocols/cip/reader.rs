use super::error::CipError;
use super::layout;

/// Quadlet access over the hex words of one record.
///
/// Only tokens of exactly eight characters count as words; anything else is
/// dropped before indexing, so word positions match the quadlet positions of
/// the packet.
pub struct CipReader<'a> {
    words: Vec<&'a str>,
}

impl<'a> CipReader<'a> {
    pub fn new(hex_words: &'a [String]) -> Self {
        Self {
            words: hex_words
                .iter()
                .map(String::as_str)
                .filter(|word| word.len() == layout::WORD_HEX_DIGITS)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn require_words(&self, needed: usize) -> Result<(), CipError> {
        if self.words.len() < needed {
            return Err(CipError::TooFewWords {
                needed,
                actual: self.words.len(),
            });
        }
        Ok(())
    }

    pub fn read_word(&self, index: usize) -> Result<u32, CipError> {
        let word = self.words.get(index).ok_or(CipError::TooFewWords {
            needed: index + 1,
            actual: self.words.len(),
        })?;
        parse_hex_word(word).ok_or_else(|| CipError::MalformedWord {
            index,
            word: word.to_string(),
        })
    }

    /// Words after the CIP header, decoded in order.
    pub fn payload_words(&self) -> impl Iterator<Item = Result<u32, CipError>> + '_ {
        (layout::HEADER_WORDS..self.words.len()).map(|index| self.read_word(index))
    }
}

fn parse_hex_word(word: &str) -> Option<u32> {
    if !word.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(word, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::CipReader;
    use crate::protocols::cip::error::CipError;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn reads_big_endian_words() {
        let raw = words(&["000200c8", "900108a7"]);
        let reader = CipReader::new(&raw);
        assert_eq!(reader.read_word(0).unwrap(), 0x0002_00c8);
        assert_eq!(reader.read_word(1).unwrap(), 0x9001_08a7);
    }

    #[test]
    fn short_tokens_are_not_words() {
        let raw = words(&["0000", "000200c8", "abc", "900108a7"]);
        let reader = CipReader::new(&raw);
        assert_eq!(reader.len(), 2);
        assert_eq!(reader.read_word(1).unwrap(), 0x9001_08a7);
    }

    #[test]
    fn rejects_sign_prefixed_words() {
        let raw = words(&["+0000001", "900108a7"]);
        let reader = CipReader::new(&raw);
        assert!(matches!(
            reader.read_word(0),
            Err(CipError::MalformedWord { index: 0, .. })
        ));
    }

    #[test]
    fn require_words_reports_counts() {
        let raw = words(&["000200c8"]);
        let reader = CipReader::new(&raw);
        assert_eq!(
            reader.require_words(2),
            Err(CipError::TooFewWords {
                needed: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn payload_skips_header() {
        let raw = words(&["000200c8", "900108a7", "40000001", "zzzzzzzz"]);
        let reader = CipReader::new(&raw);
        let payload: Vec<_> = reader.payload_words().collect();
        assert_eq!(payload.len(), 2);
        assert_eq!(payload[0], Ok(0x4000_0001));
        assert!(payload[1].is_err());
    }
}
