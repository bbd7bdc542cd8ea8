//! Collaborator traits: the seams between the state machine and the world.
//!
//! Implementations live in banter-infra (HTTP gateway, JSON settings store)
//! and in the binary (console transport). Uses native async fn in traits
//! (RPITIT, Rust 2024 edition); the engine is generic over these, so no
//! boxing is needed.

use banter_types::error::{GatewayError, SettingsError};
use banter_types::event::Profile;

/// Text and image generation backend. May fail; callers substitute
/// fallbacks and never surface errors to chat.
pub trait GenerationGateway: Send + Sync {
    /// Generate a reply from (user text, context snapshot, system prompt).
    fn complete(
        &self,
        user_text: &str,
        context: &str,
        system_prompt: &str,
    ) -> impl std::future::Future<Output = Result<String, GatewayError>> + Send;

    /// Generate an image, returning a URL or handle to post in chat.
    ///
    /// Cost-bound: callers must hold an [`ImageQuota`](crate::ledger::ImageQuota)
    /// reservation before calling this.
    fn render_image(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<String, GatewayError>> + Send;
}

/// The chat platform: outbound messages and profile lookups.
pub trait ChatPlatform: Send + Sync {
    /// Post a message to a channel.
    fn say(
        &self,
        channel: &str,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;

    /// Look up a user profile for shoutouts. `Ok(None)` means no such user.
    fn profile(
        &self,
        login: &str,
    ) -> impl std::future::Future<Output = Result<Option<Profile>, GatewayError>> + Send;
}

/// Key-value settings with synchronous reads/writes against an in-memory
/// map and an explicit async durable flush.
pub trait SettingsStore: Send + Sync {
    fn get_u32(&self, key: &str, default: u32) -> u32;
    fn set_u32(&self, key: &str, value: u32);

    fn get_bool(&self, key: &str, default: bool) -> bool;
    fn set_bool(&self, key: &str, value: bool);

    fn get_string(&self, key: &str) -> Option<String>;
    fn set_string(&self, key: &str, value: &str);

    fn get_strings(&self, key: &str) -> Vec<String>;
    fn set_strings(&self, key: &str, values: &[String]);

    /// Flush the in-memory map to durable storage.
    fn persist(&self) -> impl std::future::Future<Output = Result<(), SettingsError>> + Send;
}

/// Passive-learning collaborator fed with unaddressed chat lines.
/// Fire-and-forget: failures are logged, never propagated.
pub trait PassiveLearner: Send + Sync {
    fn observe(
        &self,
        text: &str,
        user: &str,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;
}

/// Settings keys shared between the engine and the binary's startup seeding.
pub mod keys {
    pub const QUOTA_USAGE: &str = "quota_usage";
    pub const QUOTA_LIMIT: &str = "quota_limit";
    pub const WAIFUS: &str = "waifus";
    pub const BASE_PROMPT: &str = "base_prompt";
    pub const HISTORY_CAPACITY: &str = "history_capacity";
    pub const IDLE_MINUTES: &str = "idle_minutes";
    pub const ROTATION_MINUTES: &str = "rotation_minutes";
    pub const AUTOMSG_ENABLED: &str = "automsg_enabled";
    pub const ROTATION_ENABLED: &str = "rotation_enabled";
    pub const LEARN_ENABLED: &str = "learn_enabled";
}
