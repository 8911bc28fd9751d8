//! Line-aligned splitting of a script into size-bounded chunks.
//!
//! The speech service rejects requests above a byte budget, and chunk audio is
//! joined by plain concatenation, so chunks may only break between lines.

use crate::error::PodcastError;
use serde::{Deserialize, Serialize};

/// Encoding in which a chunk's size is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf16,
}

impl TextEncoding {
    /// Size of `text` in bytes once encoded.
    pub fn encoded_len(&self, text: &str) -> usize {
        match self {
            TextEncoding::Utf8 => text.len(),
            TextEncoding::Utf16 => text.encode_utf16().count() * 2,
        }
    }
}

/// Greedily pack whole lines into chunks of at most `max_bytes`.
///
/// A line includes its terminator. Lines are appended to the current chunk
/// while it stays within the budget; the line that would overflow starts the
/// next chunk. Concatenating the result reproduces `text` exactly.
///
/// # Errors
///
/// [`PodcastError::SizeViolation`] if any single line is larger than
/// `max_bytes`, since a line is never split.
pub fn split(text: &str, max_bytes: usize, encoding: TextEncoding) -> Result<Vec<String>, PodcastError> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_bytes = 0usize;

    for (index, line) in text.split_inclusive('\n').enumerate() {
        let line_bytes = encoding.encoded_len(line);
        if line_bytes > max_bytes {
            return Err(PodcastError::SizeViolation {
                line: index + 1,
                bytes: line_bytes,
                max: max_bytes,
            });
        }
        if current_bytes + line_bytes > max_bytes {
            chunks.push(std::mem::take(&mut current));
            current_bytes = 0;
        }
        current.push_str(line);
        current_bytes += line_bytes;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(lines: &[&str]) -> String {
        lines.iter().map(|l| format!("{l}\n")).collect()
    }

    #[test]
    fn test_join_reproduces_input() {
        let text = "Speaker1: hello\nSpeaker2: hi there\n\nSpeaker1: bye";
        for max in [20, 32, 64, 1000] {
            let chunks = split(text, max, TextEncoding::Utf8).unwrap();
            assert_eq!(chunks.concat(), text, "max={max}");
        }
    }

    #[test]
    fn test_every_chunk_fits_budget() {
        let text = script(&["aaaa", "bbbbbbb", "cc", "dddddd", "e", "ffffffff"]);
        let chunks = split(&text, 10, TextEncoding::Utf8).unwrap();
        assert!(chunks.iter().all(|c| c.len() <= 10));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_greedy_packing() {
        // Lines of 5, 5, 5 bytes with a budget of 10 -> [10, 5].
        let text = script(&["aaaa", "bbbb", "cccc"]);
        let chunks = split(&text, 10, TextEncoding::Utf8).unwrap();
        assert_eq!(chunks, vec!["aaaa\nbbbb\n".to_string(), "cccc\n".to_string()]);
    }

    #[test]
    fn test_line_exactly_at_budget_is_allowed() {
        let text = script(&["123456789", "x"]);
        let chunks = split(&text, 10, TextEncoding::Utf8).unwrap();
        assert_eq!(chunks, vec!["123456789\n".to_string(), "x\n".to_string()]);
    }

    #[test]
    fn test_oversized_line_fails() {
        let long = "가".repeat(1667); // 5001 bytes in UTF-8
        let text = format!("Speaker1: short\n{long}\n");
        let err = split(&text, 4000, TextEncoding::Utf8).unwrap_err();
        match err {
            PodcastError::SizeViolation { line, bytes, max } => {
                assert_eq!(line, 2);
                assert_eq!(bytes, 5002);
                assert_eq!(max, 4000);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_multibyte_text_measured_in_encoding() {
        let text = "가나다\n"; // 10 bytes UTF-8, 8 bytes UTF-16
        assert!(split(text, 9, TextEncoding::Utf8).is_err());
        assert_eq!(split(text, 9, TextEncoding::Utf16).unwrap(), vec![text.to_string()]);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(split("", 10, TextEncoding::Utf8).unwrap().is_empty());
    }

    #[test]
    fn test_text_without_trailing_newline() {
        let chunks = split("abc\ndef", 4, TextEncoding::Utf8).unwrap();
        assert_eq!(chunks, vec!["abc\n".to_string(), "def".to_string()]);
    }
}
