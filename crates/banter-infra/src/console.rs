//! Console chat adapter.
//!
//! Stands in for a real chat connection during local runs: outbound lines
//! are printed to stdout and profile lookups come from a static roster
//! (usually empty).

use std::collections::HashMap;

use banter_core::gateway::ChatPlatform;
use banter_types::error::GatewayError;
use banter_types::event::Profile;

/// Chat platform that writes to the terminal.
pub struct ConsolePlatform {
    profiles: HashMap<String, Profile>,
}

impl ConsolePlatform {
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    /// Seed a profile so `!shoutout` has someone to find in local runs.
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profiles.insert(profile.login.to_lowercase(), profile);
        self
    }
}

impl Default for ConsolePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatPlatform for ConsolePlatform {
    async fn say(&self, channel: &str, text: &str) -> Result<(), GatewayError> {
        println!("[#{channel}] {text}");
        Ok(())
    }

    async fn profile(&self, login: &str) -> Result<Option<Profile>, GatewayError> {
        Ok(self.profiles.get(&login.to_lowercase()).cloned())
    }
}
