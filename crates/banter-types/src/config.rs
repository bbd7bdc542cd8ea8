//! Bot configuration loaded from `banter.toml`.
//!
//! Everything here is a startup default. The runtime-mutable knobs (history
//! capacity, timer thresholds, feature toggles, quota usage) are additionally
//! persisted through the settings store and re-seeded at startup, so a value
//! changed by a chat command survives a restart even when the TOML file does
//! not change.

use serde::{Deserialize, Serialize};

/// Top-level bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// The bot's own chat name; mention detection matches this
    /// case-insensitively and outbound history lines are prefixed with it.
    pub bot_name: String,
    /// Channel the bot joins.
    pub channel: String,
    /// Owner login, always granted elevated commands.
    pub owner: String,

    /// Rolling context capacity (lines).
    pub history_capacity: usize,
    /// Base system prompt for all generation calls.
    pub base_prompt: String,
    /// Posted whenever the gateway fails or returns an empty reply.
    pub fallback_reply: String,

    /// Minutes of chat inactivity before the idle emitter fires.
    pub idle_minutes: u32,
    /// Minutes between scheduled rotation messages.
    pub rotation_minutes: u32,
    /// Daily ceiling for image generations across all trigger paths.
    pub quota_limit: u32,
    /// Cheers below this many bits are not acknowledged.
    pub min_cheer_bits: u32,

    pub automsg_enabled: bool,
    pub rotation_enabled: bool,
    pub learn_enabled: bool,
    pub images_enabled: bool,

    /// Ordered rotation playlist.
    pub rotation: Vec<RotationEntry>,

    /// Base URL of the OpenAI-compatible generation backend.
    pub gateway_url: String,
    /// Model name sent to the backend.
    pub model: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_name: "banter".to_string(),
            channel: "banter".to_string(),
            owner: "banter".to_string(),
            history_capacity: 18,
            base_prompt: "You are a witty chat bot hanging out in a live \
                          stream chat. Keep replies short, casual, and in \
                          plain text with no markdown."
                .to_string(),
            fallback_reply: "brain lagged out, give me a second".to_string(),
            idle_minutes: 10,
            rotation_minutes: 20,
            quota_limit: 30,
            min_cheer_bits: 100,
            automsg_enabled: true,
            rotation_enabled: true,
            learn_enabled: false,
            images_enabled: true,
            rotation: Vec::new(),
            gateway_url: "http://localhost:11434/v1".to_string(),
            model: "llama3".to_string(),
        }
    }
}

/// One entry of the scheduled rotation playlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationEntry {
    pub kind: RotationKind,
    /// For `Static`, posted verbatim. For `Ai`, used as the generation
    /// instruction with the current context.
    pub content: String,
}

/// How a rotation entry produces its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationKind {
    Static,
    Ai,
}
