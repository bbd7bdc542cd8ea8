//! Rate and quota accounting.
//!
//! Two independent ledgers gate the paid/noisy paths:
//!
//! - [`ResponseLedger`]: per-user reply counts with a hard cap per window.
//!   The whole map is dropped on a fixed 5-minute timer -- a cliff reset,
//!   not a per-user sliding expiry.
//! - [`ImageQuota`]: one shared counter for every image-generation trigger
//!   path. Callers reserve optimistically before the awaited call and refund
//!   on failure, so two interleaved requests can never both squeeze through
//!   the last slot.

use std::collections::HashMap;

use banter_types::error::QuotaExceeded;

/// Maximum replies a single user gets per reset window.
pub const MAX_REPLIES_PER_WINDOW: u8 = 5;

/// Per-user reply counter with a cliff reset.
#[derive(Debug, Default)]
pub struct ResponseLedger {
    counts: HashMap<String, u8>,
}

impl ResponseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one reply to `user` and return the new count.
    ///
    /// Saturates at the cap; callers are expected to have checked
    /// [`can_respond`](Self::can_respond) first.
    pub fn increment(&mut self, user: &str) -> u8 {
        let count = self.counts.entry(user.to_string()).or_insert(0);
        *count = count.saturating_add(1).min(MAX_REPLIES_PER_WINDOW);
        *count
    }

    /// Whether `user` may still receive a reply this window.
    pub fn can_respond(&self, user: &str) -> bool {
        self.count(user) < MAX_REPLIES_PER_WINDOW
    }

    /// Whether the next reply to `user` is the last one allowed, so the
    /// dispatcher can request goodbye framing.
    pub fn is_limit_response(&self, user: &str) -> bool {
        self.count(user) == MAX_REPLIES_PER_WINDOW - 1
    }

    pub fn count(&self, user: &str) -> u8 {
        self.counts.get(user).copied().unwrap_or(0)
    }

    /// Drop every count. After this, any user can respond again regardless
    /// of prior count.
    pub fn reset(&mut self) {
        self.counts.clear();
    }
}

/// Shared counter for cost-bound image generation.
#[derive(Debug)]
pub struct ImageQuota {
    usage: u32,
    limit: u32,
}

impl ImageQuota {
    pub fn new(limit: u32) -> Self {
        Self { usage: 0, limit }
    }

    /// Reserve one slot before the expensive call.
    ///
    /// Increments immediately so a second request interleaving during the
    /// awaited call cannot read a stale usage value. The caller must
    /// [`refund`](Self::refund) if the downstream call fails.
    pub fn try_reserve(&mut self) -> Result<(), QuotaExceeded> {
        if self.usage >= self.limit {
            return Err(QuotaExceeded);
        }
        self.usage += 1;
        Ok(())
    }

    /// Roll back a reservation after a failed call. Floors at zero.
    pub fn refund(&mut self) {
        self.usage = self.usage.saturating_sub(1);
    }

    /// Reset usage to zero (24-hour timer or manual command).
    pub fn reset(&mut self) {
        self.usage = 0;
    }

    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit;
    }

    /// Restore persisted usage at startup, clamped to the limit.
    pub fn restore_usage(&mut self, usage: u32) {
        self.usage = usage.min(self.limit);
    }

    pub fn usage(&self) -> u32 {
        self.usage
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}
