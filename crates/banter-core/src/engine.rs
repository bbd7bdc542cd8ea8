//! The bot engine: owned state plus collaborators.
//!
//! `BotEngine` is the composition root. It owns the [`BotState`] behind a
//! single mutex and is generic over the collaborator traits, so tests drive
//! it with in-memory fakes and the binary wires real implementations.
//!
//! Locking discipline: the state mutex is never held across an awaited
//! external call. Decisions and counter reservations happen synchronously
//! under the lock; the lock is released before the gateway is awaited and
//! re-taken to apply results.

use std::sync::Arc;

use banter_types::config::BotConfig;
use banter_types::event::{ChatEvent, Sender, SubTier};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::clock::Clock;
use crate::gateway::{ChatPlatform, GenerationGateway, PassiveLearner, SettingsStore, keys};
use crate::gift::DrainPlan;
use crate::prompt::{self, PersonaFlags};
use crate::state::BotState;

/// External collaborators the engine calls through narrow interfaces.
pub struct Collaborators<G, P, S, L> {
    pub gateway: G,
    pub platform: P,
    pub settings: S,
    /// Arc so unaddressed lines can be forwarded fire-and-forget.
    pub learner: Arc<L>,
}

/// Immutable identity and wording the engine needs on every path.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub bot_name: String,
    pub channel: String,
    pub owner: String,
    pub fallback_reply: String,
    /// The configured base prompt, kept so `!promptreset` can restore it.
    pub default_prompt: String,
}

impl EngineConfig {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            bot_name: config.bot_name.clone(),
            channel: config.channel.clone(),
            owner: config.owner.clone(),
            fallback_reply: config.fallback_reply.clone(),
            default_prompt: config.base_prompt.clone(),
        }
    }
}

/// The event-driven conversational state machine.
pub struct BotEngine<G, P, S, L, C> {
    pub(crate) cfg: EngineConfig,
    pub(crate) state: Mutex<BotState>,
    pub deps: Collaborators<G, P, S, L>,
    pub(crate) clock: C,
}

impl<G, P, S, L, C> BotEngine<G, P, S, L, C>
where
    G: GenerationGateway,
    P: ChatPlatform,
    S: SettingsStore,
    L: PassiveLearner + 'static,
    C: Clock,
{
    pub fn new(config: &BotConfig, deps: Collaborators<G, P, S, L>, clock: C) -> Self {
        let state = BotState::from_config(config, clock.now());
        Self {
            cfg: EngineConfig::from_config(config),
            state: Mutex::new(state),
            deps,
            clock,
        }
    }

    /// Re-seed runtime-mutable knobs from the persisted settings store.
    ///
    /// Config supplies the defaults; anything a chat command changed in a
    /// previous run wins over the TOML value.
    pub async fn hydrate(&self) {
        let settings = &self.deps.settings;
        let mut state = self.state.lock().await;

        let limit = settings.get_u32(keys::QUOTA_LIMIT, state.quota.limit());
        state.quota.set_limit(limit);
        state.quota.restore_usage(settings.get_u32(keys::QUOTA_USAGE, 0));

        state.waifus = settings
            .get_strings(keys::WAIFUS)
            .into_iter()
            .map(|login| login.to_lowercase())
            .collect();

        if let Some(prompt) = settings.get_string(keys::BASE_PROMPT) {
            state.base_prompt = prompt;
        }

        let capacity = settings.get_u32(keys::HISTORY_CAPACITY, state.history.capacity() as u32);
        state.history.set_capacity(capacity as usize);
        state.idle_minutes = settings.get_u32(keys::IDLE_MINUTES, state.idle_minutes);
        state.rotation_minutes = settings.get_u32(keys::ROTATION_MINUTES, state.rotation_minutes);
        state.automsg_enabled = settings.get_bool(keys::AUTOMSG_ENABLED, state.automsg_enabled);
        state.rotation_enabled = settings.get_bool(keys::ROTATION_ENABLED, state.rotation_enabled);
        state.learn_enabled = settings.get_bool(keys::LEARN_ENABLED, state.learn_enabled);

        tracing::info!(
            quota = state.quota.usage(),
            waifus = state.waifus.len(),
            "state hydrated from settings"
        );
    }

    /// Entry point for every inbound event.
    ///
    /// Handlers absorb their own failures; nothing thrown here may stop
    /// subsequent events from being processed.
    pub async fn handle_event(&self, event: ChatEvent) {
        match event {
            ChatEvent::Message { sender, text, .. } => self.on_message(sender, text).await,
            ChatEvent::Subscription {
                user,
                tier,
                months,
                resub,
                ..
            } => self.on_subscription(&user, tier, months, resub).await,
            ChatEvent::GiftSub {
                gifter,
                recipient,
                tier,
                anonymous,
                community_gift_id,
                ..
            } => {
                let mut state = self.state.lock().await;
                let accepted =
                    state
                        .gifts
                        .push(&gifter, &recipient, tier, anonymous, community_gift_id);
                if !accepted {
                    tracing::debug!(%gifter, "gift event filtered before buffering");
                }
            }
            ChatEvent::MysteryGift {
                gifter,
                count,
                tier,
                community_gift_id,
                ..
            } => {
                self.on_mystery_gift(&gifter, count, tier, community_gift_id)
                    .await
            }
            ChatEvent::Cheer {
                user, bits, text, ..
            } => self.on_cheer(&user, bits, &text).await,
            ChatEvent::Raid {
                raider, viewers, ..
            } => self.on_raid(&raider, viewers).await,
        }
    }

    async fn on_message(&self, sender: Sender, text: String) {
        {
            let mut state = self.state.lock().await;
            state
                .history
                .append(format!("{}: {}", sender.display_name, text));
        }
        if self.route_command(&sender, &text).await {
            return;
        }
        self.handle_plain_message(&sender, &text).await;
    }

    async fn on_subscription(&self, user: &str, tier: SubTier, months: u32, resub: bool) {
        if self.paused().await {
            return;
        }
        let instruction = if resub {
            format!(
                "{user} just resubscribed with a {} sub for {months} months total. \
                 Thank them warmly in one short message.",
                tier.label()
            )
        } else {
            format!(
                "{user} just subscribed with a {} sub. Welcome them in one short message.",
                tier.label()
            )
        };
        let fallback = format!("Thank you {user} for the {} sub!", tier.label());
        self.acknowledge(&instruction, &fallback).await;
    }

    async fn on_mystery_gift(&self, gifter: &str, count: u32, tier: SubTier, batch: Uuid) {
        let paused = {
            let mut state = self.state.lock().await;
            // Record the batch id even while paused so the individual gift
            // events that follow are still filtered.
            state.gifts.note_batch(batch);
            state.paused
        };
        if paused {
            return;
        }
        let instruction = format!(
            "{gifter} is gifting {count} {} subs to the community. \
             Thank them for the burst of generosity in one short message.",
            tier.label()
        );
        let fallback = format!("{gifter} is dropping {count} gifted subs, thank you!");
        self.acknowledge(&instruction, &fallback).await;
    }

    async fn on_cheer(&self, user: &str, bits: u32, text: &str) {
        let skip = {
            let state = self.state.lock().await;
            state.paused || bits < state.min_cheer_bits
        };
        if skip {
            return;
        }
        let instruction = format!(
            "{user} just cheered {bits} bits saying: \"{text}\". \
             Thank them in one short message."
        );
        let fallback = format!("Thanks for the {bits} bits, {user}!");
        self.acknowledge(&instruction, &fallback).await;
    }

    async fn on_raid(&self, raider: &str, viewers: u32) {
        if self.paused().await {
            return;
        }
        let instruction = format!(
            "{raider} just raided the channel with {viewers} viewers. \
             Welcome the raiders in one short message."
        );
        let fallback = format!("Welcome raiders! Thanks for the raid, {raider}!");
        self.acknowledge(&instruction, &fallback).await;
    }

    /// Drain the gift buffer. Driven by a 1-second interval in the binary.
    pub async fn tick_gifts(&self) {
        let (plan, paused) = {
            let mut state = self.state.lock().await;
            (state.gifts.drain(), state.paused)
        };
        if paused {
            if !matches!(plan, DrainPlan::Empty) {
                tracing::debug!("discarding buffered gift acknowledgments while paused");
            }
            return;
        }
        match plan {
            DrainPlan::Empty => {}
            DrainPlan::Individual(entries) => {
                for entry in entries {
                    let instruction = format!(
                        "{} just gifted a {} sub to {}. Thank them in one short message.",
                        entry.gifter,
                        entry.tier.label(),
                        entry.recipient
                    );
                    let fallback = format!(
                        "Thank you {} for gifting a {} sub to {}!",
                        entry.gifter,
                        entry.tier.label(),
                        entry.recipient
                    );
                    self.acknowledge(&instruction, &fallback).await;
                }
            }
            DrainPlan::Grouped { gifters, total } => {
                let names = gifters.join(", ");
                let instruction = format!(
                    "{names} just gifted {total} subs to the channel. \
                     Thank all of them together in one short message."
                );
                // Deterministic fallback naming the same gifters: a drain
                // must never silently lose an acknowledgment.
                let fallback = format!("Huge thanks to {names} for the {total} gifted subs!");
                self.acknowledge(&instruction, &fallback).await;
            }
        }
    }

    /// Drop all per-user reply counts. Driven by a 5-minute interval.
    pub async fn reset_ledger(&self) {
        let mut state = self.state.lock().await;
        state.ledger.reset();
        tracing::debug!("per-user reply counts reset");
    }

    /// Zero the image quota. Driven by a 24-hour interval or `!quotareset`.
    pub async fn reset_quota(&self) {
        {
            let mut state = self.state.lock().await;
            state.quota.reset();
        }
        self.persist_quota_usage().await;
        tracing::info!("image quota reset");
    }

    /// Final flush before process exit.
    pub async fn shutdown(&self) {
        if let Err(err) = self.deps.settings.persist().await {
            tracing::warn!(error = %err, "failed to persist settings on shutdown");
        }
    }

    // --- shared plumbing used by the router, dispatcher, and emitters ---

    pub(crate) async fn paused(&self) -> bool {
        self.state.lock().await.paused
    }

    /// Send a line to chat and append it to the rolling context with the
    /// bot-name prefix.
    pub(crate) async fn post(&self, text: &str) {
        if let Err(err) = self.deps.platform.say(&self.cfg.channel, text).await {
            tracing::warn!(error = %err, "failed to send chat line");
        }
        let mut state = self.state.lock().await;
        state
            .history
            .append(format!("{}: {}", self.cfg.bot_name, text));
    }

    /// One generation call with the current context and base prompt; `None`
    /// on gateway failure or an empty post-processed reply.
    pub(crate) async fn try_generate(
        &self,
        instruction: &str,
        context: &str,
        system_prompt: &str,
    ) -> Option<String> {
        match self
            .deps
            .gateway
            .complete(instruction, context, system_prompt)
            .await
        {
            Ok(raw) => {
                let cleaned = prompt::scrub_reply(&raw);
                if cleaned.is_empty() { None } else { Some(cleaned) }
            }
            Err(err) => {
                tracing::warn!(error = %err, "generation call failed");
                None
            }
        }
    }

    /// Generate an event acknowledgment and post it, falling back to the
    /// given template when the gateway fails or returns nothing.
    pub(crate) async fn acknowledge(&self, instruction: &str, fallback: &str) {
        let (context, system_prompt) = {
            let state = self.state.lock().await;
            (
                state.history.snapshot(),
                prompt::build_prompt(&state.base_prompt, PersonaFlags::default()),
            )
        };
        let reply = self
            .try_generate(instruction, &context, &system_prompt)
            .await
            .unwrap_or_else(|| fallback.to_string());
        self.post(&reply).await;
    }

    /// Write the current quota usage through the settings store.
    pub(crate) async fn persist_quota_usage(&self) {
        let usage = {
            let state = self.state.lock().await;
            state.quota.usage()
        };
        self.deps.settings.set_u32(keys::QUOTA_USAGE, usage);
        self.persist_settings().await;
    }

    /// Flush settings, logging instead of propagating: a failed write must
    /// not break a chat handler.
    pub(crate) async fn persist_settings(&self) {
        if let Err(err) = self.deps.settings.persist().await {
            tracing::warn!(error = %err, "failed to persist settings");
        }
    }
}
