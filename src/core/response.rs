//! Text fitting for Discord limits
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Add `ellipsize` for QR titles and thread names
//! - 1.0.0: Message chunking and embed truncation

/// Discord embed description limit
pub const EMBED_LIMIT: usize = 4096;
/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;

/// Split text into pieces of at most `max_size` bytes, preferring line breaks.
///
/// Never splits inside a UTF-8 character.
pub fn chunk_text(text: &str, max_size: usize) -> Vec<String> {
    if text.len() <= max_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if current.len() + line.len() + 1 > max_size && !current.is_empty() {
            chunks.push(current.trim_end().to_string());
            current.clear();
        }
        if line.len() + 1 > max_size {
            chunks.extend(split_on_char_boundaries(line, max_size));
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    if !current.is_empty() {
        chunks.push(current.trim_end().to_string());
    }
    chunks
}

fn split_on_char_boundaries(line: &str, max_size: usize) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();

    for ch in line.chars() {
        if current.len() + ch.len_utf8() > max_size && !current.is_empty() {
            result.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        result.push(current);
    }
    result
}

/// Chunk text for message content (2000 byte limit)
pub fn chunk_for_message(text: &str) -> Vec<String> {
    chunk_text(text, MESSAGE_LIMIT)
}

/// Truncate text to fit an embed description, adding an ellipsis if needed
pub fn truncate_for_embed(text: &str) -> String {
    if text.len() <= EMBED_LIMIT {
        return text.to_string();
    }
    let mut end = EMBED_LIMIT - 3;
    while !text.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Keep the first `max_chars` characters, appending `...` when anything was cut.
pub fn ellipsize(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_no_chunk() {
        assert_eq!(chunk_text("hello", 100), vec!["hello"]);
    }

    #[test]
    fn test_chunk_respects_lines() {
        let result = chunk_text("line1\nline2\nline3", 12);
        assert!(result.len() >= 2);
        for chunk in &result {
            assert!(!chunk.ends_with('\n'));
            assert!(chunk.len() <= 12);
        }
    }

    #[test]
    fn test_chunk_handles_long_lines() {
        let result = chunk_text(&"a".repeat(100), 30);
        assert_eq!(result.len(), 4);
        assert!(result.iter().all(|c| c.len() <= 30));
    }

    #[test]
    fn test_message_limit_utf8_safe() {
        let text = "Hello 世界! ".repeat(500);
        for chunk in chunk_for_message(&text) {
            assert!(chunk.len() <= MESSAGE_LIMIT);
        }
    }

    #[test]
    fn test_truncate_for_embed() {
        assert_eq!(truncate_for_embed("short"), "short");
        let long = truncate_for_embed(&"a".repeat(5000));
        assert!(long.len() <= EMBED_LIMIT);
        assert!(long.ends_with("..."));
    }

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("short title", 36), "short title");
        let exact = "x".repeat(36);
        assert_eq!(ellipsize(&exact, 36), exact);
        let long = "y".repeat(40);
        assert_eq!(ellipsize(&long, 36), format!("{}...", "y".repeat(36)));
        assert_eq!(ellipsize("héllo wörld", 4), "héll...");
    }
}
