//! The owned, composed bot state.
//!
//! One `BotState` instance lives behind the engine's mutex for the process
//! lifetime. Each subsystem is its own struct with its own constructor; no
//! ambient globals. Handlers and timer callbacks receive the state through
//! the engine, never through module-level statics.

use std::collections::HashSet;

use banter_types::config::{BotConfig, RotationEntry};
use chrono::{DateTime, Utc};

use crate::gift::GiftBuffer;
use crate::history::RollingContext;
use crate::ledger::{ImageQuota, ResponseLedger};

/// All mutable bot state, re-seeded from persisted settings at startup.
#[derive(Debug)]
pub struct BotState {
    pub history: RollingContext,
    pub ledger: ResponseLedger,
    pub quota: ImageQuota,
    pub gifts: GiftBuffer,

    /// Users granted the persona modifier. Mutated only by explicit
    /// commands; persisted.
    pub waifus: HashSet<String>,

    /// Suspend switch gating all reactive behavior. Not persisted;
    /// restarts come up unpaused.
    pub paused: bool,

    /// Base system prompt; the effective prompt is always built fresh from
    /// this by `prompt::build_prompt`.
    pub base_prompt: String,

    pub idle_minutes: u32,
    pub rotation_minutes: u32,
    pub min_cheer_bits: u32,

    pub automsg_enabled: bool,
    pub rotation_enabled: bool,
    pub learn_enabled: bool,
    pub images_enabled: bool,

    pub rotation: Vec<RotationEntry>,
    pub rotation_cursor: usize,

    pub last_mention: DateTime<Utc>,
    pub last_rotation: DateTime<Utc>,
}

impl BotState {
    /// Build fresh state from configuration defaults.
    ///
    /// Both emitter timestamps start at `now` so neither fires immediately
    /// after startup.
    pub fn from_config(config: &BotConfig, now: DateTime<Utc>) -> Self {
        Self {
            history: RollingContext::new(config.history_capacity),
            ledger: ResponseLedger::new(),
            quota: ImageQuota::new(config.quota_limit),
            gifts: GiftBuffer::new(),
            waifus: HashSet::new(),
            paused: false,
            base_prompt: config.base_prompt.clone(),
            idle_minutes: config.idle_minutes,
            rotation_minutes: config.rotation_minutes,
            min_cheer_bits: config.min_cheer_bits,
            automsg_enabled: config.automsg_enabled,
            rotation_enabled: config.rotation_enabled,
            learn_enabled: config.learn_enabled,
            images_enabled: config.images_enabled,
            rotation: config.rotation.clone(),
            rotation_cursor: 0,
            last_mention: now,
            last_rotation: now,
        }
    }

    /// Whether `login` gets the persona modifier. Matching is by lowercase
    /// login because that is how the waifu set is stored.
    pub fn is_waifu(&self, login: &str) -> bool {
        self.waifus.contains(&login.to_lowercase())
    }

    /// Advance the rotation cursor circularly and return the entry it was
    /// pointing at. `None` when the playlist is empty.
    pub fn next_rotation_entry(&mut self) -> Option<RotationEntry> {
        if self.rotation.is_empty() {
            return None;
        }
        let entry = self.rotation[self.rotation_cursor % self.rotation.len()].clone();
        self.rotation_cursor = (self.rotation_cursor + 1) % self.rotation.len();
        Some(entry)
    }
}
