//! Chat platform event types.
//!
//! `ChatEvent` is the unified inbound event type the engine consumes. Each
//! platform notification kind gets its own variant so the dispatcher can
//! match exhaustively instead of probing optional fields on a loosely
//! shaped payload.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who sent a chat message, with the badges the router cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sender {
    /// Lowercase login name.
    pub login: String,
    /// Display name as shown in chat.
    pub display_name: String,
    pub broadcaster: bool,
    pub moderator: bool,
}

impl Sender {
    /// Whether this sender may run elevated commands.
    ///
    /// Broadcaster badge OR moderator badge OR the configured owner login.
    pub fn elevated(&self, owner: &str) -> bool {
        self.broadcaster || self.moderator || self.login.eq_ignore_ascii_case(owner)
    }

    /// Convenience constructor for a plain viewer.
    pub fn viewer(login: impl Into<String>) -> Self {
        let login = login.into();
        Self {
            display_name: login.clone(),
            login,
            broadcaster: false,
            moderator: false,
        }
    }
}

/// Subscription tier, classified from the platform plan string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubTier {
    Prime,
    Tier1,
    Tier2,
    Tier3,
}

impl SubTier {
    /// Classify a raw plan string ("Prime", "1000", "2000", "3000").
    ///
    /// Unknown plan strings fall back to Tier1, which is what the platform
    /// sends for the overwhelming majority of subs anyway.
    pub fn from_plan(plan: &str) -> Self {
        match plan {
            "Prime" | "prime" => SubTier::Prime,
            "2000" => SubTier::Tier2,
            "3000" => SubTier::Tier3,
            _ => SubTier::Tier1,
        }
    }

    /// Human-readable label used in acknowledgment framing.
    pub fn label(&self) -> &'static str {
        match self {
            SubTier::Prime => "Prime",
            SubTier::Tier1 => "Tier 1",
            SubTier::Tier2 => "Tier 2",
            SubTier::Tier3 => "Tier 3",
        }
    }
}

/// Inbound events delivered by the chat transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A plain chat message (may be a command).
    Message {
        channel: String,
        sender: Sender,
        text: String,
    },

    /// A new subscription or a resub.
    Subscription {
        channel: String,
        user: String,
        tier: SubTier,
        months: u32,
        resub: bool,
    },

    /// A single gifted subscription. Bursts of these arrive within a few
    /// hundred milliseconds when someone gifts in bulk.
    GiftSub {
        channel: String,
        gifter: String,
        recipient: String,
        tier: SubTier,
        anonymous: bool,
        /// Correlation id linking this gift to a `MysteryGift` batch.
        community_gift_id: Option<Uuid>,
    },

    /// The batch-level "community gift" event the platform fires once per
    /// bulk gift, before the individual `GiftSub` events.
    MysteryGift {
        channel: String,
        gifter: String,
        count: u32,
        tier: SubTier,
        community_gift_id: Uuid,
    },

    /// Bits cheered with a message.
    Cheer {
        channel: String,
        user: String,
        bits: u32,
        text: String,
    },

    /// An incoming raid.
    Raid {
        channel: String,
        raider: String,
        viewers: u32,
    },
}

impl ChatEvent {
    /// The channel this event belongs to.
    pub fn channel(&self) -> &str {
        match self {
            ChatEvent::Message { channel, .. }
            | ChatEvent::Subscription { channel, .. }
            | ChatEvent::GiftSub { channel, .. }
            | ChatEvent::MysteryGift { channel, .. }
            | ChatEvent::Cheer { channel, .. }
            | ChatEvent::Raid { channel, .. } => channel,
        }
    }
}

/// A resolved user profile, used by the shoutout command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub login: String,
    pub display_name: String,
    pub description: String,
}
