//! Unprompted speech: the idle reviver and the scheduled rotation.
//!
//! Both emitters are polled by intervals in the binary and decide under the
//! state lock whether their window has elapsed. The window is claimed (the
//! timestamp advanced, the cursor moved) at decision time, before any await,
//! so overlapping polls can never double-fire and a failed generation costs
//! the whole window instead of retrying on the next poll.

use banter_types::config::RotationKind;

use crate::clock::Clock;
use crate::engine::BotEngine;
use crate::gateway::{ChatPlatform, GenerationGateway, PassiveLearner, SettingsStore};
use crate::prompt::{self, PersonaFlags};

impl<G, P, S, L, C> BotEngine<G, P, S, L, C>
where
    G: GenerationGateway,
    P: ChatPlatform,
    S: SettingsStore,
    L: PassiveLearner + 'static,
    C: Clock,
{
    /// Fire a conversation reviver when chat has been quiet for the
    /// configured number of minutes.
    ///
    /// Skipped when paused, when auto messages are off, when nothing has
    /// been said yet, and when the bot itself spoke last (otherwise it would
    /// keep answering its own reviver).
    pub async fn tick_idle(&self) {
        let bot_prefix = format!("{}: ", self.cfg.bot_name);
        let prepared = {
            let mut state = self.state.lock().await;
            if state.paused || !state.automsg_enabled || state.history.is_empty() {
                return;
            }
            if state.history.last_line_starts_with(&bot_prefix) {
                return;
            }
            let elapsed = self.clock.now() - state.last_mention;
            if elapsed < chrono::Duration::minutes(i64::from(state.idle_minutes)) {
                return;
            }
            // Claim the window before awaiting anything
            state.last_mention = self.clock.now();
            (
                state.history.snapshot(),
                prompt::build_prompt(&state.base_prompt, PersonaFlags::default()),
            )
        };

        let (context, system_prompt) = prepared;
        let instruction = "Chat has gone quiet. Say something short to get the \
                           conversation going again, picking up on whatever was \
                           being discussed.";
        let reply = self
            .try_generate(instruction, &context, &system_prompt)
            .await
            .unwrap_or_else(|| self.cfg.fallback_reply.clone());
        self.post(&reply).await;
    }

    /// Post the next rotation entry when the rotation window has elapsed.
    ///
    /// The cursor advances when the window is claimed, so a failed `ai`
    /// entry is skipped rather than retried.
    pub async fn tick_rotation(&self) {
        let claimed = {
            let mut state = self.state.lock().await;
            if state.paused || !state.rotation_enabled {
                return;
            }
            let elapsed = self.clock.now() - state.last_rotation;
            if elapsed < chrono::Duration::minutes(i64::from(state.rotation_minutes)) {
                return;
            }
            let Some(entry) = state.next_rotation_entry() else {
                return;
            };
            state.last_rotation = self.clock.now();
            (
                entry,
                state.history.snapshot(),
                prompt::build_prompt(&state.base_prompt, PersonaFlags::default()),
            )
        };

        let (entry, context, system_prompt) = claimed;
        match entry.kind {
            RotationKind::Static => self.post(&entry.content).await,
            RotationKind::Ai => {
                match self
                    .try_generate(&entry.content, &context, &system_prompt)
                    .await
                {
                    Some(reply) => self.post(&reply).await,
                    None => {
                        tracing::debug!("rotation generation failed, skipping this entry");
                    }
                }
            }
        }
    }
}
