//! Burst aggregator for gifted subscriptions.
//!
//! A single gifter dumping N gift subs fires N discrete platform events
//! within a few hundred milliseconds. The buffer collects them and a
//! 1-second drain tick decides: 1-2 entries are acknowledged individually,
//! 3 or more collapse into one grouped acknowledgment. The trade is a
//! <= 1 second acknowledgment delay for bounded chat output and generation
//! cost.
//!
//! Anonymous gifts and gifts whose community-gift id was already surfaced by
//! a `MysteryGift` batch event are dropped before entering the buffer, so
//! the same underlying burst is never acknowledged twice.

use std::collections::HashSet;

use banter_types::event::SubTier;
use uuid::Uuid;

/// Number of buffered gifts at which the drain collapses to one grouped
/// acknowledgment.
pub const GROUP_THRESHOLD: usize = 3;

/// One accepted gift sub waiting for the next drain tick.
#[derive(Debug, Clone)]
pub struct GiftEntry {
    pub gifter: String,
    pub recipient: String,
    pub tier: SubTier,
}

/// What the drain tick decided to do with the buffered gifts.
#[derive(Debug)]
pub enum DrainPlan {
    /// Buffer was empty; nothing to do.
    Empty,
    /// Few enough gifts to thank each one individually.
    Individual(Vec<GiftEntry>),
    /// A real burst: one grouped acknowledgment.
    Grouped {
        /// Distinct gifters in first-seen order.
        gifters: Vec<String>,
        total: usize,
    },
}

/// Collecting buffer for gift-sub events.
///
/// Idle (empty) -> Collecting (non-empty) -> Idle after a drain. The buffer
/// is cleared unconditionally by any drain that found entries.
#[derive(Debug, Default)]
pub struct GiftBuffer {
    entries: Vec<GiftEntry>,
    seen_batches: HashSet<Uuid>,
}

impl GiftBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a gift event to the buffer.
    ///
    /// Returns false (dropped) for anonymous gifts and for gifts belonging
    /// to an already-acknowledged community batch.
    pub fn push(
        &mut self,
        gifter: &str,
        recipient: &str,
        tier: SubTier,
        anonymous: bool,
        community_gift_id: Option<Uuid>,
    ) -> bool {
        if anonymous {
            return false;
        }
        if let Some(id) = community_gift_id {
            if self.seen_batches.contains(&id) {
                return false;
            }
        }
        self.entries.push(GiftEntry {
            gifter: gifter.to_string(),
            recipient: recipient.to_string(),
            tier,
        });
        true
    }

    /// Record a community-gift batch id surfaced by a MysteryGift event, so
    /// the individual gift events that follow are dropped.
    pub fn note_batch(&mut self, id: Uuid) {
        self.seen_batches.insert(id);
    }

    /// Drain the buffer and return what to acknowledge.
    pub fn drain(&mut self) -> DrainPlan {
        if self.entries.is_empty() {
            return DrainPlan::Empty;
        }
        let entries = std::mem::take(&mut self.entries);
        if entries.len() < GROUP_THRESHOLD {
            return DrainPlan::Individual(entries);
        }

        let total = entries.len();
        let mut gifters = Vec::new();
        for entry in &entries {
            if !gifters.iter().any(|g: &String| g == &entry.gifter) {
                gifters.push(entry.gifter.clone());
            }
        }
        DrainPlan::Grouped { gifters, total }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_n(buffer: &mut GiftBuffer, gifter: &str, n: usize) {
        for i in 0..n {
            assert!(buffer.push(
                gifter,
                &format!("viewer{i}"),
                SubTier::Tier1,
                false,
                None
            ));
        }
    }

    #[test]
    fn empty_drain_is_noop() {
        let mut buffer = GiftBuffer::new();
        assert!(matches!(buffer.drain(), DrainPlan::Empty));
    }

    #[test]
    fn two_gifts_acknowledged_individually() {
        let mut buffer = GiftBuffer::new();
        push_n(&mut buffer, "generous", 2);
        match buffer.drain() {
            DrainPlan::Individual(entries) => assert_eq!(entries.len(), 2),
            other => panic!("expected Individual, got {other:?}"),
        }
        assert!(buffer.is_empty(), "buffer cleared after drain");
    }

    #[test]
    fn five_gifts_collapse_to_one_group() {
        let mut buffer = GiftBuffer::new();
        push_n(&mut buffer, "whale", 5);
        match buffer.drain() {
            DrainPlan::Grouped { gifters, total } => {
                assert_eq!(total, 5);
                assert_eq!(gifters, vec!["whale".to_string()]);
            }
            other => panic!("expected Grouped, got {other:?}"),
        }
        assert!(buffer.is_empty());
    }

    #[test]
    fn grouped_gifters_are_distinct_in_first_seen_order() {
        let mut buffer = GiftBuffer::new();
        for gifter in ["a", "b", "a", "c", "b"] {
            buffer.push(gifter, "someone", SubTier::Tier1, false, None);
        }
        match buffer.drain() {
            DrainPlan::Grouped { gifters, total } => {
                assert_eq!(total, 5);
                assert_eq!(gifters, vec!["a", "b", "c"]);
            }
            other => panic!("expected Grouped, got {other:?}"),
        }
    }

    #[test]
    fn anonymous_gifts_are_dropped() {
        let mut buffer = GiftBuffer::new();
        assert!(!buffer.push("anon", "viewer", SubTier::Tier1, true, None));
        assert!(buffer.is_empty());
    }

    #[test]
    fn gifts_from_noted_batches_are_dropped() {
        let mut buffer = GiftBuffer::new();
        let batch = Uuid::now_v7();
        buffer.note_batch(batch);

        assert!(!buffer.push("whale", "viewer", SubTier::Tier1, false, Some(batch)));
        // A different batch id still gets through
        assert!(buffer.push(
            "whale",
            "viewer",
            SubTier::Tier1,
            false,
            Some(Uuid::now_v7())
        ));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn threshold_boundary_three_is_grouped() {
        let mut buffer = GiftBuffer::new();
        push_n(&mut buffer, "giver", 3);
        assert!(matches!(buffer.drain(), DrainPlan::Grouped { total: 3, .. }));
    }
}
