//! Splitting of long replies into platform-sized messages.

/// Telegram hard limit for a single text message, in UTF-16 code units.
pub const TELEGRAM_MAX_LEN: usize = 4096;

/// Split `text` into chunks of at most `max_len` UTF-16 code units.
///
/// Splits at the last paragraph break (`\n\n`) inside the window, else at the
/// last line break, else hard-cuts on a character boundary. Newlines at the
/// start of the following chunk are dropped.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut remaining = text;

    while let Some(limit) = window_end(remaining, max_len) {
        let window = &remaining[..limit];
        let split_at = window
            .rfind("\n\n")
            .filter(|&pos| pos > 0)
            .or_else(|| window.rfind('\n').filter(|&pos| pos > 0))
            .unwrap_or(limit);

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start_matches(['\n', '\r']);
    }

    if !remaining.is_empty() {
        chunks.push(remaining.to_string());
    }

    chunks
}

/// Byte offset of the first character that overflows `max_len` units, or
/// `None` when the whole text fits. Never returns 0.
fn window_end(text: &str, max_len: usize) -> Option<usize> {
    let mut units = 0;
    for (idx, ch) in text.char_indices() {
        units += ch.len_utf16();
        if units > max_len {
            return Some(if idx == 0 { ch.len_utf8() } else { idx });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        assert_eq!(split_message("Hello, world!", 100), vec!["Hello, world!"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(split_message("", 100).is_empty());
    }

    #[test]
    fn test_exact_limit() {
        let text = "a".repeat(100);
        assert_eq!(split_message(&text, 100), vec![text]);
    }

    #[test]
    fn test_prefers_paragraph_boundary() {
        let first = format!("{}\n{}", "a".repeat(20), "a".repeat(20));
        let text = format!("{}\n\n{}", first, "b".repeat(50));
        let chunks = split_message(&text, 60);
        assert_eq!(chunks, vec![first, "b".repeat(50)]);
    }

    #[test]
    fn test_falls_back_to_line_boundary() {
        let text = format!("{}\n{}", "a".repeat(50), "b".repeat(50));
        let chunks = split_message(&text, 60);
        assert_eq!(chunks, vec!["a".repeat(50), "b".repeat(50)]);
    }

    #[test]
    fn test_hard_cut_without_newlines() {
        let chunks = split_message(&"x".repeat(250), 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[1].len(), 100);
        assert_eq!(chunks[2].len(), 50);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // Cyrillic letters are two bytes each in UTF-8.
        let text = "привіт".repeat(50);
        let chunks = split_message(&text, 100);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 100));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_emoji_count_as_two_units() {
        let text = "😀".repeat(3000);
        let chunks = split_message(&text, TELEGRAM_MAX_LEN);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 2048);
        assert!(
            chunks
                .iter()
                .all(|c| c.encode_utf16().count() <= TELEGRAM_MAX_LEN)
        );
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_wide_character_larger_than_limit_still_progresses() {
        assert_eq!(split_message("😀😀", 1), vec!["😀", "😀"]);
    }
}
