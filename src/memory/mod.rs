//! Bounded Conversation Memory
//!
//! Information Hiding:
//! - Token counting pluggable behind `TokenCounter`
//! - Eviction bookkeeping (per-turn counts, running total) hidden
//! - Buffer is owned by exactly one engine; no interior locking

use crate::core::llm::ChatMessage;
use std::collections::VecDeque;
use std::sync::Arc;

/// Counts tokens in a piece of text.
///
/// Implementations must be deterministic and never count a longer text as
/// fewer tokens than a prefix of it, so eviction order is reproducible.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

impl<F> TokenCounter for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn count(&self, text: &str) -> usize {
        self(text)
    }
}

/// Character-based estimate: one token per `chars_per_token` characters, rounded up.
#[derive(Debug, Clone, Copy)]
pub struct CharEstimateCounter {
    chars_per_token: usize,
}

impl CharEstimateCounter {
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }
}

impl Default for CharEstimateCounter {
    fn default() -> Self {
        Self::new(4)
    }
}

impl TokenCounter for CharEstimateCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token)
    }
}

/// Conversation turns bounded by a token budget, evicted oldest first.
pub struct MemoryBuffer {
    turns: VecDeque<(ChatMessage, usize)>,
    token_limit: usize,
    used: usize,
    counter: Arc<dyn TokenCounter>,
}

impl MemoryBuffer {
    pub fn new(token_limit: usize, counter: Arc<dyn TokenCounter>) -> Self {
        Self {
            turns: VecDeque::new(),
            token_limit,
            used: 0,
            counter,
        }
    }

    /// Buffer using the default character estimate.
    pub fn with_limit(token_limit: usize) -> Self {
        Self::new(token_limit, Arc::new(CharEstimateCounter::default()))
    }

    /// Append a turn, evicting from the front until it fits.
    ///
    /// A turn larger than the whole budget empties the buffer and is kept alone.
    pub fn append(&mut self, turn: ChatMessage) {
        let tokens = self.counter.count(&turn.content);

        let mut evicted = 0;
        while !self.turns.is_empty() && self.used + tokens > self.token_limit {
            if let Some((_, old_tokens)) = self.turns.pop_front() {
                self.used -= old_tokens;
                evicted += 1;
            }
        }

        if evicted > 0 {
            tracing::debug!(
                "[MemoryBuffer] Evicted {} turns to fit {} tokens (limit {})",
                evicted,
                tokens,
                self.token_limit
            );
        }
        if tokens > self.token_limit {
            tracing::warn!(
                "[MemoryBuffer] Single turn of {} tokens exceeds limit {}, keeping it alone",
                tokens,
                self.token_limit
            );
        }

        self.used += tokens;
        self.turns.push_back((turn, tokens));
    }

    /// Retained turns, oldest first.
    pub fn turns(&self) -> Vec<ChatMessage> {
        self.turns.iter().map(|(turn, _)| turn.clone()).collect()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.used = 0;
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.used
    }

    pub fn token_limit(&self) -> usize {
        self.token_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_buffer(limit: usize) -> MemoryBuffer {
        MemoryBuffer::new(limit, Arc::new(|s: &str| s.split_whitespace().count()))
    }

    #[test]
    fn test_char_estimate_is_monotonic() {
        let counter = CharEstimateCounter::default();
        assert_eq!(counter.count(""), 0);
        assert_eq!(counter.count("abc"), 1);
        assert_eq!(counter.count("abcd"), 1);
        assert_eq!(counter.count("abcde"), 2);

        let mut previous = 0;
        for len in 0..64 {
            let count = counter.count(&"x".repeat(len));
            assert!(count >= previous);
            previous = count;
        }
    }

    #[test]
    fn test_append_within_budget_keeps_everything() {
        let mut buffer = word_buffer(10);
        buffer.append(ChatMessage::user("one two three"));
        buffer.append(ChatMessage::assistant("four five"));

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.token_count(), 5);
    }

    #[test]
    fn test_eviction_is_fifo() {
        let mut buffer = word_buffer(6);
        buffer.append(ChatMessage::user("a a"));
        buffer.append(ChatMessage::assistant("b b"));
        buffer.append(ChatMessage::user("c c"));
        buffer.append(ChatMessage::assistant("d d d"));

        let contents: Vec<String> = buffer.turns().into_iter().map(|t| t.content).collect();
        assert_eq!(contents, vec!["c c", "d d d"]);
        assert_eq!(buffer.token_count(), 5);
    }

    #[test]
    fn test_oversized_turn_is_kept_alone() {
        let mut buffer = word_buffer(3);
        buffer.append(ChatMessage::user("a"));
        buffer.append(ChatMessage::user("one two three four five"));

        let turns = buffer.turns();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].content, "one two three four five");

        buffer.append(ChatMessage::assistant("ok"));
        assert_eq!(buffer.turns()[0].content, "ok");
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_budget_holds_for_many_appends() {
        let limit = 7;
        let mut buffer = word_buffer(limit);
        for i in 0..50 {
            let words = vec!["w"; (i * 7) % 5 + 1].join(" ");
            buffer.append(ChatMessage::user(words));

            let total: usize = buffer
                .turns()
                .iter()
                .map(|t| t.content.split_whitespace().count())
                .sum();
            assert_eq!(total, buffer.token_count());
            assert!(total <= limit || buffer.len() == 1);
        }
    }

    #[test]
    fn test_clear_empties_buffer() {
        let mut buffer = MemoryBuffer::with_limit(1000);
        buffer.append(ChatMessage::user("Who was Marie Curie?"));
        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.token_count(), 0);
        assert_eq!(buffer.token_limit(), 1000);
    }
}
