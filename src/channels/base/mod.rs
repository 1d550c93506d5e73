use crate::errors::RelayResult;
use async_trait::async_trait;

/// Platform receipt for a delivered message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentMessage {
    pub sid: String,
    pub status: String,
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait ReplySender: Send + Sync {
    fn name(&self) -> &'static str;

    /// Deliver `text` to `recipient`. Long texts may be sent as several
    /// messages; the receipt of the last one is returned.
    async fn send(&self, recipient: &str, text: &str) -> RelayResult<SentMessage>;
}

/// Split a message into chunks of at most `limit` bytes, respecting UTF-8
/// character boundaries and preferring paragraph, then line breaks.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if text.len() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while remaining.len() > limit {
        // Largest char boundary at or below the limit
        let mut split_at = limit;
        while split_at > 0 && !remaining.is_char_boundary(split_at) {
            split_at -= 1;
        }
        if split_at == 0 {
            // Single character wider than limit
            split_at = remaining
                .char_indices()
                .nth(1)
                .map_or(remaining.len(), |(i, _)| i);
        }

        // Prefer a paragraph break inside the window
        if let Some(idx) = remaining[..split_at].rfind("\n\n") {
            chunks.push(remaining[..idx].trim().to_string());
            remaining = &remaining[idx + 2..];
            continue;
        }

        // Then a single newline
        if let Some(idx) = remaining[..split_at].rfind('\n') {
            chunks.push(remaining[..idx].trim().to_string());
            remaining = &remaining[idx + 1..];
            continue;
        }

        // Hard cut at char boundary
        chunks.push(remaining[..split_at].to_string());
        remaining = &remaining[split_at..];
    }

    if !remaining.is_empty() {
        chunks.push(remaining.trim().to_string());
    }

    // Trimming a chunk that was only whitespace leaves it empty
    chunks.into_iter().filter(|c| !c.is_empty()).collect()
}
