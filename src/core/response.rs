//! Reply splitting for Discord's message size limit
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;

/// Split `text` into pieces of at most `max_size` bytes.
///
/// Pieces break on newlines where possible; a single line that is too long
/// is cut on character boundaries.
pub fn chunk_text(text: &str, max_size: usize) -> Vec<String> {
    if text.len() <= max_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.split('\n') {
        let needed = if current.is_empty() { line.len() } else { line.len() + 1 };
        if current.len() + needed <= max_size {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        if line.len() <= max_size {
            current.push_str(line);
            continue;
        }

        for ch in line.chars() {
            if current.len() + ch.len_utf8() > max_size {
                chunks.push(std::mem::take(&mut current));
            }
            current.push(ch);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

pub fn chunk_for_message(text: &str) -> Vec<String> {
    chunk_text(text, MESSAGE_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        assert_eq!(chunk_text("hello", 10), vec!["hello"]);
        assert_eq!(chunk_for_message(""), vec![""]);
    }

    #[test]
    fn test_splits_on_lines() {
        let chunks = chunk_text("aaaa\nbbbb\ncccc", 9);
        assert_eq!(chunks, vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn test_long_line_respects_char_boundaries() {
        let text = "あいうえお"; // 3 bytes each
        let chunks = chunk_text(text, 7);
        assert_eq!(chunks, vec!["あい", "うえ", "お"]);
        assert!(chunks.iter().all(|c| c.len() <= 7));
    }

    #[test]
    fn test_message_limit() {
        let line = "x".repeat(1500);
        let text = format!("{line}\n{line}");
        let chunks = chunk_for_message(&text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() <= MESSAGE_LIMIT));
    }
}
