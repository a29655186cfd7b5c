//! Text chunking
//!
//! Splits raw document text into overlapping fixed-size segments carrying
//! source metadata. Window sizes are measured in characters, not bytes, so
//! multi-byte text never splits inside a code point.

use crate::{Chunk, DocentError, Result};

/// Split `text` into overlapping chunks of at most `chunk_size` characters.
///
/// A window of `chunk_size` characters slides across the text, advancing by
/// `chunk_size - chunk_overlap` each step, so consecutive chunks share
/// exactly `chunk_overlap` characters. The final chunk may be shorter. The
/// output order equals document order.
///
/// Requires `chunk_size > chunk_overlap`; `chunk_overlap` may be zero.
pub fn split(
    text: &str,
    source: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<Chunk>> {
    if chunk_size == 0 || chunk_overlap >= chunk_size {
        return Err(DocentError::Config(format!(
            "chunk overlap {chunk_overlap} must be smaller than chunk size {chunk_size}"
        )));
    }

    if text.is_empty() {
        return Ok(Vec::new());
    }

    // Byte offsets of every char boundary, with the text length as sentinel.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = bounds.len() - 1;
    let step = chunk_size - chunk_overlap;

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + chunk_size).min(char_count);
        chunks.push(Chunk::new(&text[bounds[start]..bounds[end]], source));

        if end == char_count {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_count_formula() {
        // 1000 chars, size 500, overlap 100 -> ceil((1000 - 100) / 400) = 3
        let text = "a".repeat(1000);
        let chunks = split(&text, "doc.txt", 500, 100).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text.len(), 500);
        assert_eq!(chunks[1].text.len(), 500);
        assert_eq!(chunks[2].text.len(), 200);
    }

    #[test]
    fn test_overlap_is_exact() {
        let text: String = ('a'..='z').cycle().take(1000).collect();
        let chunks = split(&text, "doc.txt", 500, 100).unwrap();

        for pair in chunks.windows(2) {
            let tail: String = pair[0].text.chars().skip(500 - 100).collect();
            let head: String = pair[1].text.chars().take(100).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_reconstruction() {
        let text: String = ('a'..='z').cycle().take(937).collect();
        let chunks = split(&text, "doc.txt", 200, 40).unwrap();

        let mut rebuilt = chunks[0].text.clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.text.chars().skip(40));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_determinism() {
        let text: String = ('a'..='z').cycle().take(1234).collect();
        let first = split(&text, "doc.txt", 300, 60).unwrap();
        let second = split(&text, "doc.txt", 300, 60).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        assert!(split("text", "doc.txt", 100, 100).is_err());
        assert!(split("text", "doc.txt", 100, 200).is_err());
        assert!(split("text", "doc.txt", 0, 0).is_err());
    }

    #[test]
    fn test_zero_overlap_allowed() {
        let text = "a".repeat(100);
        let chunks = split(&text, "doc.txt", 25, 0).unwrap();
        assert_eq!(chunks.len(), 4);
    }

    #[test]
    fn test_short_text_yields_single_chunk() {
        let chunks = split("short", "doc.txt", 500, 100).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short");
    }

    #[test]
    fn test_empty_text() {
        let chunks = split("", "doc.txt", 500, 100).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_multibyte_boundaries() {
        let text: String = "안녕하세요 세계".chars().cycle().take(300).collect();
        let chunks = split(&text, "doc.txt", 120, 30).unwrap();

        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 120);
        }

        let mut rebuilt = chunks[0].text.clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.text.chars().skip(30));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_source_metadata_on_every_chunk() {
        let text = "b".repeat(600);
        let chunks = split(&text, "policies.txt", 200, 50).unwrap();
        assert!(chunks.iter().all(|c| c.metadata.source == "policies.txt"));
    }
}
