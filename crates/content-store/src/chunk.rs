/// Approximate tokens-per-char heuristic: ~4 characters per token, the
/// common rough estimate for English prose and source text alike. This is
/// intentionally cheap — an exact tokenizer is a provider concern, not a
/// storage concern.
const CHARS_PER_TOKEN: usize = 4;

#[must_use]
pub fn token_estimate(content: &str) -> usize {
    content.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Split `content` into ordered chunks, each with `token_estimate` at most
/// `max_tokens`. Prefers to break on a newline or whitespace boundary near
/// the target length so chunks don't sever mid-word, but never leaves a
/// chunk over the limit to honor the boundary.
#[must_use]
pub fn split_into_chunks(content: &str, max_tokens: usize) -> Vec<String> {
    if content.is_empty() {
        return vec![String::new()];
    }
    let max_chars = (max_tokens * CHARS_PER_TOKEN).max(1);
    let chars: Vec<char> = content.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let mut end = (start + max_chars).min(chars.len());
        if end < chars.len() {
            // Walk back to the nearest newline/space within the chunk so we
            // don't split mid-word, but never shrink below half the budget.
            let floor = start + max_chars / 2;
            if let Some(back) = (floor..end).rev().find(|&i| chars[i] == '\n' || chars[i] == ' ')
            {
                end = back + 1;
            }
        }
        chunks.push(chars[start..end].iter().collect());
        start = end;
    }
    chunks
}

/// First ~500 chars of `chunk`, the preview shown inline alongside a
/// `content_ref_preview` part.
pub const PREVIEW_CHARS: usize = 500;

#[must_use]
pub fn truncate_preview(chunk: &str) -> String {
    match chunk.char_indices().nth(PREVIEW_CHARS) {
        Some((byte_idx, _)) => chunk[..byte_idx].to_string(),
        None => chunk.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_matches_boundary() {
        let exact = "a".repeat(20_000);
        assert_eq!(token_estimate(&exact), 5_000);
        let over = "a".repeat(20_004);
        assert_eq!(token_estimate(&over), 5_001);
    }

    #[test]
    fn split_respects_budget_and_reassembles() {
        let content = (0..2000)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = split_into_chunks(&content, 100);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(token_estimate(c) <= 100 + 1);
        }
        assert_eq!(chunks.concat(), content);
    }

    #[test]
    fn truncate_preview_caps_at_500_chars() {
        let content = "x".repeat(1000);
        let preview = truncate_preview(&content);
        assert_eq!(preview.chars().count(), PREVIEW_CHARS);
    }
}
