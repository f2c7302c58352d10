/// Concatenates MP3 streams back to back. MP3 is frame based, so the joined
/// bytes play as one continuous clip.
pub fn merge_mp3_chunks(chunks: &[Vec<u8>]) -> Vec<u8> {
    let total = chunks.iter().map(Vec::len).sum();
    let mut merged = Vec::with_capacity(total);
    for chunk in chunks {
        merged.extend_from_slice(chunk);
    }
    merged
}

/// Splits `text` into pieces of at most `max_chars` characters, breaking on
/// whitespace where possible. Words longer than `max_chars` are hard-split.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let letters: Vec<char> = word.chars().collect();
            for piece in letters.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_mp3_chunks() {
        let merged = merge_mp3_chunks(&[b"Hello".to_vec(), Vec::new(), b"World".to_vec()]);
        assert_eq!(merged, b"HelloWorld");
    }

    #[test]
    fn test_split_text_respects_limit() {
        let text = "Paul Atreides arrives on the desert planet Arrakis with his family";
        let chunks = split_text(text, 20);

        assert!(chunks.iter().all(|c| c.chars().count() <= 20));
        assert_eq!(chunks.join(" "), text);
        assert_eq!(chunks[0], "Paul Atreides");
    }

    #[test]
    fn test_split_text_short_input() {
        assert_eq!(split_text("  Dune  ", 100), vec!["Dune".to_string()]);
        assert!(split_text("   ", 100).is_empty());
    }

    #[test]
    fn test_split_text_long_word() {
        let chunks = split_text("a abcdefghij b", 4);
        assert_eq!(chunks, vec!["a", "abcd", "efgh", "ij", "b"]);
    }
}
