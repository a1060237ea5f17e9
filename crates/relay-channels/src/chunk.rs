//! Split long answers into channel-sized messages.
//!
//! Slicing is fixed-width on characters, not bytes, and ignores word
//! boundaries. Every chunk after the first starts with `"(i/total)\n\n"`.
//! The marker is not subtracted from `max_len`, so a prefixed chunk can be
//! up to `pagination_prefix(i, total).len()` characters over the limit.

use relay_core::Chunk;

/// Split `text` into chunks of at most `max_len` characters of content.
///
/// A `max_len` of zero disables splitting.
pub fn chunk(text: &str, max_len: usize) -> Vec<Chunk> {
    let char_count = text.chars().count();
    if max_len == 0 || char_count <= max_len {
        return vec![Chunk {
            index: 1,
            total_count: 1,
            text: text.to_string(),
        }];
    }

    let chars: Vec<char> = text.chars().collect();
    let total = char_count.div_ceil(max_len);

    chars
        .chunks(max_len)
        .enumerate()
        .map(|(i, slice)| {
            let index = i + 1;
            let body: String = slice.iter().collect();
            let text = if index == 1 {
                body
            } else {
                format!("{}{body}", pagination_prefix(index, total))
            };
            Chunk {
                index,
                total_count: total,
                text,
            }
        })
        .collect()
}

/// [`chunk`] with an optional limit; `None` always yields one chunk.
pub fn chunk_for(text: &str, max_len: Option<usize>) -> Vec<Chunk> {
    chunk(text, max_len.unwrap_or(0))
}

pub fn pagination_prefix(index: usize, total: usize) -> String {
    format!("({index}/{total})\n\n")
}

/// Chunk content without its pagination marker.
pub fn content(chunk: &Chunk) -> &str {
    if chunk.index == 1 {
        return &chunk.text;
    }
    chunk
        .text
        .strip_prefix(&pagination_prefix(chunk.index, chunk.total_count))
        .unwrap_or(&chunk.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble(chunks: &[Chunk]) -> String {
        chunks.iter().map(content).collect()
    }

    #[test]
    fn short_text_is_one_chunk() {
        let out = chunk("hello", 4096);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].index, 1);
        assert_eq!(out[0].total_count, 1);
        assert_eq!(out[0].text, "hello");
    }

    #[test]
    fn text_at_exact_limit_is_not_split() {
        let text = "x".repeat(4096);
        assert_eq!(chunk(&text, 4096).len(), 1);
        assert_eq!(chunk(&format!("{text}y"), 4096).len(), 2);
    }

    #[test]
    fn nine_thousand_chars_at_4096_make_three_chunks() {
        let text: String = (0..9000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let out = chunk(&text, 4096);

        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|c| c.total_count == 3));
        assert!(!out[0].text.starts_with('('));
        assert!(out[1].text.starts_with("(2/3)\n\n"));
        assert!(out[2].text.starts_with("(3/3)\n\n"));
        assert_eq!(content(&out[2]).chars().count(), 9000 - 2 * 4096);
        assert_eq!(reassemble(&out), text);
    }

    #[test]
    fn prefixed_chunk_may_exceed_limit_by_prefix_length() {
        let text = "z".repeat(250);
        let out = chunk(&text, 100);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].text.chars().count(), 100);

        let prefix_len = pagination_prefix(2, 3).chars().count();
        assert_eq!(out[1].text.chars().count(), 100 + prefix_len);
        assert!(out[1].text.chars().count() > 100);
    }

    #[test]
    fn chunk_count_is_minimal_and_content_reconstructs() {
        let text = "abcdefghij".repeat(37);
        for max in [1usize, 3, 7, 10, 64, 369, 370, 371] {
            let out = chunk(&text, max);
            let len = text.chars().count();
            assert_eq!(out.len(), len.div_ceil(max).max(1), "max={max}");
            assert_eq!(reassemble(&out), text, "max={max}");
            assert!(out.iter().all(|c| content(c).chars().count() <= max));
        }
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "é".repeat(10);
        let out = chunk(&text, 4);
        assert_eq!(out.len(), 3);
        assert_eq!(content(&out[0]), "éééé");
        assert_eq!(content(&out[2]), "éé");
        assert_eq!(reassemble(&out), text);
    }

    #[test]
    fn unbounded_channels_get_one_chunk() {
        let text = "y".repeat(20_000);
        assert_eq!(chunk_for(&text, None).len(), 1);
        assert_eq!(chunk(&text, 0).len(), 1);
        assert_eq!(chunk_for(&text, Some(10_000)).len(), 2);
    }

    #[test]
    fn empty_text_is_a_single_empty_chunk() {
        let out = chunk("", 10);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "");
    }
}
