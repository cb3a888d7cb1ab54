//! Splitting long text into bounded pieces for translation.
//!
//! Breaks prefer sentence-ending punctuation, then whitespace; a break is
//! only taken in the second half of the window so chunks stay near their
//! target size. With no usable boundary the split is a hard cut at the
//! size limit — never dropping content either way.

/// Split `text` into chunks of at most `max_chars` characters.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        let trimmed = text.trim();
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let remaining = chars.len() - start;
        if remaining <= max_chars {
            let tail: String = chars[start..].iter().collect();
            let trimmed = tail.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }
            break;
        }

        let window_end = start + max_chars;
        let half = start + max_chars / 2;

        let sentence_cut = (start..window_end)
            .rev()
            .find(|&i| is_sentence_end(chars[i]))
            .map(|i| i + 1)
            .filter(|&cut| cut > half);

        let cut = sentence_cut.or_else(|| {
            (start..window_end)
                .rev()
                .find(|&i| chars[i].is_whitespace())
                .filter(|&i| i > half)
        });

        let end = cut.unwrap_or(window_end);

        let piece: String = chars[start..end].iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        let mut next = end;
        while next < chars.len() && chars[next].is_whitespace() {
            next += 1;
        }
        start = next;
    }

    chunks
}

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '。' | '！' | '？')
}
