//! Command routing for `!`-prefixed chat lines.
//!
//! An ordered rule list is scanned top to bottom; the first rule whose name
//! matches at a word boundary wins and the message is consumed, even when
//! the feature behind it is disabled. The one deliberate exception:
//! elevated commands from non-elevated senders return `false` and fall
//! through to the plain-message path, so their existence is never leaked to
//! regular viewers.

use banter_types::event::Sender;

use crate::clock::Clock;
use crate::engine::BotEngine;
use crate::gateway::{ChatPlatform, GenerationGateway, PassiveLearner, SettingsStore, keys};
use crate::prompt::{self, PersonaFlags};

/// Everything the router can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    Help,
    Status,
    Ask,
    Image,
    Quota,
    QuotaReset,
    Pause,
    Resume,
    Say,
    Waifu,
    Unwaifu,
    Prompt,
    PromptReset,
    Context,
    Idle,
    Rotation,
    AutoMsg,
    Rotate,
    Learn,
    Shoutout,
    Clear,
}

impl Command {
    /// Whether this command requires the broadcaster/moderator/owner check.
    pub fn elevated(self) -> bool {
        !matches!(
            self,
            Command::Ping | Command::Help | Command::Status | Command::Ask | Command::Image
                | Command::Quota
        )
    }
}

/// Ordered rule list; first match wins. Longer names come before their
/// prefixes so the scan order alone documents the precedence.
const RULES: &[(&str, Command)] = &[
    ("!ping", Command::Ping),
    ("!help", Command::Help),
    ("!status", Command::Status),
    ("!ask", Command::Ask),
    ("!image", Command::Image),
    ("!quotareset", Command::QuotaReset),
    ("!quota", Command::Quota),
    ("!pause", Command::Pause),
    ("!resume", Command::Resume),
    ("!say", Command::Say),
    ("!waifu", Command::Waifu),
    ("!unwaifu", Command::Unwaifu),
    ("!promptreset", Command::PromptReset),
    ("!prompt", Command::Prompt),
    ("!context", Command::Context),
    ("!idle", Command::Idle),
    ("!rotation", Command::Rotation),
    ("!rotate", Command::Rotate),
    ("!automsg", Command::AutoMsg),
    ("!learn", Command::Learn),
    ("!shoutout", Command::Shoutout),
    ("!clear", Command::Clear),
];

/// Match a chat line against the rule list.
///
/// Returns the command and its (trimmed) argument string. A rule only
/// matches at a word boundary: `!quotax` matches nothing, `!quota extra`
/// matches `!quota` with args `"extra"`.
pub fn parse_command(text: &str) -> Option<(Command, &str)> {
    let trimmed = text.trim();
    if !trimmed.starts_with('!') {
        return None;
    }
    for (name, command) in RULES {
        let Some(head) = trimmed.get(..name.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(name) {
            continue;
        }
        let rest = &trimmed[name.len()..];
        if rest.is_empty() {
            return Some((*command, ""));
        }
        if rest.starts_with(' ') {
            return Some((*command, rest.trim()));
        }
    }
    None
}

/// Numeric knobs settable from chat, with their valid ranges.
#[derive(Debug, Clone, Copy)]
enum NumericKnob {
    Context,
    Idle,
    Rotation,
}

impl NumericKnob {
    fn range(self) -> (u32, u32) {
        match self {
            NumericKnob::Context => (1, 100),
            NumericKnob::Idle | NumericKnob::Rotation => (1, 240),
        }
    }

    fn label(self) -> &'static str {
        match self {
            NumericKnob::Context => "context length",
            NumericKnob::Idle => "idle minutes",
            NumericKnob::Rotation => "rotation minutes",
        }
    }

    fn key(self) -> &'static str {
        match self {
            NumericKnob::Context => keys::HISTORY_CAPACITY,
            NumericKnob::Idle => keys::IDLE_MINUTES,
            NumericKnob::Rotation => keys::ROTATION_MINUTES,
        }
    }
}

/// Boolean feature toggles settable from chat.
#[derive(Debug, Clone, Copy)]
enum Toggle {
    AutoMsg,
    Rotate,
    Learn,
}

impl Toggle {
    fn label(self) -> &'static str {
        match self {
            Toggle::AutoMsg => "auto messages",
            Toggle::Rotate => "rotation",
            Toggle::Learn => "passive learning",
        }
    }

    fn key(self) -> &'static str {
        match self {
            Toggle::AutoMsg => keys::AUTOMSG_ENABLED,
            Toggle::Rotate => keys::ROTATION_ENABLED,
            Toggle::Learn => keys::LEARN_ENABLED,
        }
    }
}

impl<G, P, S, L, C> BotEngine<G, P, S, L, C>
where
    G: GenerationGateway,
    P: ChatPlatform,
    S: SettingsStore,
    L: PassiveLearner + 'static,
    C: Clock,
{
    /// Route a chat line. Returns true when the line was consumed as a
    /// command and must not reach the trigger dispatcher.
    pub(crate) async fn route_command(&self, sender: &Sender, text: &str) -> bool {
        let Some((command, args)) = parse_command(text) else {
            return false;
        };
        if command.elevated() && !sender.elevated(&self.cfg.owner) {
            // Fall through silently: the message continues to the normal
            // mention path as if no command existed.
            return false;
        }

        match command {
            Command::Ping => self.post("pong").await,
            Command::Help => {
                self.post("commands: !ping !help !status !ask <text> !image <prompt> !quota")
                    .await
            }
            Command::Status => self.cmd_status().await,
            Command::Ask => self.cmd_ask(sender, args).await,
            Command::Image => self.cmd_image(args).await,
            Command::Quota => self.cmd_quota().await,
            Command::QuotaReset => {
                self.reset_quota().await;
                self.post("image quota reset").await;
            }
            Command::Pause => {
                self.state.lock().await.paused = true;
                self.post("taking a break, back soon").await;
            }
            Command::Resume => {
                self.state.lock().await.paused = false;
                self.post("and we're back").await;
            }
            Command::Say => {
                if !args.is_empty() {
                    self.post(args).await;
                }
            }
            Command::Waifu => self.cmd_waifu(args, true).await,
            Command::Unwaifu => self.cmd_waifu(args, false).await,
            Command::Prompt => self.cmd_prompt(args).await,
            Command::PromptReset => {
                {
                    let mut state = self.state.lock().await;
                    state.base_prompt = self.cfg.default_prompt.clone();
                }
                self.deps
                    .settings
                    .set_string(keys::BASE_PROMPT, &self.cfg.default_prompt);
                self.persist_settings().await;
                self.post("prompt restored to default").await;
            }
            Command::Context => self.cmd_numeric(args, NumericKnob::Context).await,
            Command::Idle => self.cmd_numeric(args, NumericKnob::Idle).await,
            Command::Rotation => self.cmd_numeric(args, NumericKnob::Rotation).await,
            Command::AutoMsg => self.cmd_toggle(args, Toggle::AutoMsg).await,
            Command::Rotate => self.cmd_toggle(args, Toggle::Rotate).await,
            Command::Learn => self.cmd_toggle(args, Toggle::Learn).await,
            Command::Shoutout => self.cmd_shoutout(args).await,
            Command::Clear => {
                self.state.lock().await.history.clear();
                self.post("context cleared").await;
            }
        }
        true
    }

    async fn cmd_status(&self) {
        let line = {
            let state = self.state.lock().await;
            format!(
                "paused: {} | automsg: {} | rotation: {} | learn: {} | images: {} | quota: {}/{}",
                state.paused,
                state.automsg_enabled,
                state.rotation_enabled,
                state.learn_enabled,
                state.images_enabled,
                state.quota.usage(),
                state.quota.limit(),
            )
        };
        self.post(&line).await;
    }

    async fn cmd_quota(&self) {
        let line = {
            let state = self.state.lock().await;
            format!(
                "image quota: {}/{} used today",
                state.quota.usage(),
                state.quota.limit()
            )
        };
        self.post(&line).await;
    }

    /// Forced generation, bypassing mention detection but not the pause
    /// flag. Not ledger-gated: it is an explicit request, not a mention.
    async fn cmd_ask(&self, sender: &Sender, args: &str) {
        if args.is_empty() {
            self.post("usage: !ask <question>").await;
            return;
        }
        let prepared = {
            let state = self.state.lock().await;
            if state.paused {
                None
            } else {
                let flags = PersonaFlags {
                    waifu: state.is_waifu(&sender.login),
                    final_reply: false,
                };
                Some((
                    state.history.snapshot(),
                    prompt::build_prompt(&state.base_prompt, flags),
                ))
            }
        };
        let Some((context, system_prompt)) = prepared else {
            return;
        };
        let reply = self
            .try_generate(args, &context, &system_prompt)
            .await
            .unwrap_or_else(|| self.cfg.fallback_reply.clone());
        self.post(&reply).await;
    }

    /// Image generation behind the shared quota.
    ///
    /// Reserve happens synchronously under the lock before the awaited
    /// render call; a failed render refunds the slot. Note the asymmetry
    /// kept from the source: a disabled image feature consumes the command
    /// silently instead of falling through.
    async fn cmd_image(&self, args: &str) {
        enum Gate {
            Silent,
            Usage,
            LimitReached,
            Reserved,
        }
        let gate = {
            let mut state = self.state.lock().await;
            if !state.images_enabled || state.paused {
                Gate::Silent
            } else if args.is_empty() {
                Gate::Usage
            } else if state.quota.try_reserve().is_err() {
                Gate::LimitReached
            } else {
                Gate::Reserved
            }
        };

        match gate {
            Gate::Silent => {}
            Gate::Usage => self.post("usage: !image <prompt>").await,
            Gate::LimitReached => {
                self.post("image limit reached for today, try again tomorrow")
                    .await
            }
            Gate::Reserved => {
                match self.deps.gateway.render_image(args).await {
                    Ok(url) => {
                        self.post(&format!("here you go: {url}")).await;
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "image generation failed");
                        self.state.lock().await.quota.refund();
                        self.post("couldn't paint that one, it won't count against the limit")
                            .await;
                    }
                }
                self.persist_quota_usage().await;
            }
        }
    }

    async fn cmd_waifu(&self, args: &str, add: bool) {
        let login = args.trim_start_matches('@').to_lowercase();
        if login.is_empty() {
            self.post(if add {
                "usage: !waifu <user>"
            } else {
                "usage: !unwaifu <user>"
            })
            .await;
            return;
        }
        let roster = {
            let mut state = self.state.lock().await;
            if add {
                state.waifus.insert(login.clone());
            } else {
                state.waifus.remove(&login);
            }
            let mut roster: Vec<String> = state.waifus.iter().cloned().collect();
            roster.sort();
            roster
        };
        self.deps.settings.set_strings(keys::WAIFUS, &roster);
        self.persist_settings().await;
        let verb = if add { "added to" } else { "removed from" };
        self.post(&format!("{login} {verb} the waifu roster")).await;
    }

    async fn cmd_prompt(&self, args: &str) {
        if args.is_empty() {
            self.post("usage: !prompt <new system prompt>").await;
            return;
        }
        {
            let mut state = self.state.lock().await;
            state.base_prompt = args.to_string();
        }
        self.deps.settings.set_string(keys::BASE_PROMPT, args);
        self.persist_settings().await;
        self.post("prompt updated").await;
    }

    async fn cmd_numeric(&self, args: &str, knob: NumericKnob) {
        let (min, max) = knob.range();
        let value = match args.parse::<u32>() {
            Ok(v) if (min..=max).contains(&v) => v,
            _ => {
                self.post(&format!(
                    "{} must be a number between {min} and {max}",
                    knob.label()
                ))
                .await;
                return;
            }
        };
        {
            let mut state = self.state.lock().await;
            match knob {
                NumericKnob::Context => state.history.set_capacity(value as usize),
                NumericKnob::Idle => state.idle_minutes = value,
                NumericKnob::Rotation => state.rotation_minutes = value,
            }
        }
        self.deps.settings.set_u32(knob.key(), value);
        self.persist_settings().await;
        self.post(&format!("{} set to {value}", knob.label())).await;
    }

    async fn cmd_toggle(&self, args: &str, toggle: Toggle) {
        let enabled = match args.to_lowercase().as_str() {
            "on" => true,
            "off" => false,
            _ => {
                self.post(&format!("usage: !{} on|off", match toggle {
                    Toggle::AutoMsg => "automsg",
                    Toggle::Rotate => "rotate",
                    Toggle::Learn => "learn",
                }))
                .await;
                return;
            }
        };
        {
            let mut state = self.state.lock().await;
            match toggle {
                Toggle::AutoMsg => state.automsg_enabled = enabled,
                Toggle::Rotate => state.rotation_enabled = enabled,
                Toggle::Learn => state.learn_enabled = enabled,
            }
        }
        self.deps.settings.set_bool(toggle.key(), enabled);
        self.persist_settings().await;
        let word = if enabled { "on" } else { "off" };
        self.post(&format!("{} turned {word}", toggle.label())).await;
    }

    async fn cmd_shoutout(&self, args: &str) {
        let login = args.trim_start_matches('@').to_lowercase();
        if login.is_empty() {
            self.post("usage: !shoutout <user>").await;
            return;
        }
        match self.deps.platform.profile(&login).await {
            Ok(Some(profile)) => {
                let blurb = if profile.description.is_empty() {
                    format!("go check out {}!", profile.display_name)
                } else {
                    format!("go check out {}! {}", profile.display_name, profile.description)
                };
                self.post(&blurb).await;
            }
            Ok(None) => {
                self.post(&format!("couldn't find anyone called {login}"))
                    .await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "profile lookup failed");
                self.post(&format!("couldn't find anyone called {login}"))
                    .await;
            }
        }
    }
}
