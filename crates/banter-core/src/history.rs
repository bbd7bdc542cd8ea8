//! Bounded rolling context of recent chat lines.
//!
//! Every inbound chat line and every outbound bot line is appended, so
//! generation calls see the bot's own prior utterances. Outbound lines carry
//! a `"{bot_name}: "` prefix; the idle emitter uses that signature to avoid
//! replying to its own last message.

use std::collections::VecDeque;

/// FIFO buffer of chat lines with a hard capacity.
#[derive(Debug, Clone)]
pub struct RollingContext {
    lines: VecDeque<String>,
    capacity: usize,
}

impl RollingContext {
    /// Create an empty context. Capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a line, evicting from the head if over capacity.
    pub fn append(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
        while self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
    }

    /// The current context, oldest first, joined with newlines.
    pub fn snapshot(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(line);
        }
        out
    }

    /// Change capacity, immediately evicting from the head until in bound.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
    }

    /// Whether the most recent line starts with the given prefix.
    pub fn last_line_starts_with(&self, prefix: &str) -> bool {
        self.lines
            .back()
            .is_some_and(|line| line.starts_with(prefix))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_stays_within_capacity() {
        let mut ctx = RollingContext::new(3);
        for i in 0..50 {
            ctx.append(format!("line {i}"));
            assert!(ctx.len() <= 3);
        }
    }

    #[test]
    fn eviction_is_oldest_first() {
        let mut ctx = RollingContext::new(3);
        for line in ["a", "b", "c", "d"] {
            ctx.append(line);
        }
        assert_eq!(ctx.snapshot(), "b\nc\nd");
    }

    #[test]
    fn snapshot_preserves_insertion_order() {
        let mut ctx = RollingContext::new(10);
        ctx.append("first");
        ctx.append("second");
        ctx.append("third");
        assert_eq!(ctx.snapshot(), "first\nsecond\nthird");
    }

    #[test]
    fn shrinking_capacity_evicts_immediately() {
        let mut ctx = RollingContext::new(5);
        for line in ["a", "b", "c", "d", "e"] {
            ctx.append(line);
        }
        ctx.set_capacity(2);
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.snapshot(), "d\ne");
    }

    #[test]
    fn capacity_clamped_to_one() {
        let mut ctx = RollingContext::new(0);
        assert_eq!(ctx.capacity(), 1);
        ctx.append("a");
        ctx.append("b");
        assert_eq!(ctx.snapshot(), "b");
    }

    #[test]
    fn last_line_prefix_check() {
        let mut ctx = RollingContext::new(5);
        assert!(!ctx.last_line_starts_with("banter:"));
        ctx.append("alice: hi");
        assert!(!ctx.last_line_starts_with("banter:"));
        ctx.append("banter: hello alice");
        assert!(ctx.last_line_starts_with("banter:"));
    }

    #[test]
    fn clear_empties_the_buffer() {
        let mut ctx = RollingContext::new(5);
        ctx.append("a");
        ctx.clear();
        assert!(ctx.is_empty());
        assert_eq!(ctx.snapshot(), "");
    }
}
