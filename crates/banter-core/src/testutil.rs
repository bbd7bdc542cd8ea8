//! In-memory fakes for the collaborator traits, shared by the unit tests
//! across the router, dispatcher, emitter, and engine modules.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use banter_types::config::BotConfig;
use banter_types::error::{GatewayError, SettingsError};
use banter_types::event::Profile;
use chrono::Utc;

use crate::clock::ManualClock;
use crate::engine::{BotEngine, Collaborators};
use crate::gateway::{ChatPlatform, GenerationGateway, PassiveLearner, SettingsStore};

/// Gateway that replays scripted results and records every call.
///
/// When the reply script runs dry, `complete` returns `Ok("scripted reply")`
/// so tests that don't care about wording keep working.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    images: Mutex<VecDeque<Result<String, GatewayError>>>,
    /// (instruction/user text, system prompt) per `complete` call.
    pub calls: Mutex<Vec<(String, String)>>,
    pub image_calls: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn push_reply(&self, reply: Result<String, GatewayError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn push_image(&self, result: Result<String, GatewayError>) {
        self.images.lock().unwrap().push_back(result);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.calls
            .lock()
            .unwrap()
            .last()
            .map(|(_, prompt)| prompt.clone())
    }
}

impl GenerationGateway for ScriptedGateway {
    async fn complete(
        &self,
        user_text: &str,
        _context: &str,
        system_prompt: &str,
    ) -> Result<String, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((user_text.to_string(), system_prompt.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok("scripted reply".to_string()))
    }

    async fn render_image(&self, prompt: &str) -> Result<String, GatewayError> {
        self.image_calls.lock().unwrap().push(prompt.to_string());
        self.images
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok("http://img.test/pic.png".to_string()))
    }
}

/// Platform that records outbound lines and serves canned profiles.
#[derive(Default)]
pub struct RecordingPlatform {
    pub said: Mutex<Vec<String>>,
    pub profiles: Mutex<HashMap<String, Profile>>,
}

impl ChatPlatform for RecordingPlatform {
    async fn say(&self, _channel: &str, text: &str) -> Result<(), GatewayError> {
        self.said.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn profile(&self, login: &str) -> Result<Option<Profile>, GatewayError> {
        Ok(self.profiles.lock().unwrap().get(login).cloned())
    }
}

/// Settings store backed by a plain map; values stored as display strings.
#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
    pub persist_calls: Mutex<u32>,
}

impl SettingsStore for MemorySettings {
    fn get_u32(&self, key: &str, default: u32) -> u32 {
        self.values
            .lock()
            .unwrap()
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn set_u32(&self, key: &str, value: u32) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values
            .lock()
            .unwrap()
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn set_bool(&self, key: &str, value: bool) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set_string(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn get_strings(&self, key: &str) -> Vec<String> {
        self.values
            .lock()
            .unwrap()
            .get(key)
            .map(|v| {
                v.split('\n')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn set_strings(&self, key: &str, values: &[String]) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), values.join("\n"));
    }

    async fn persist(&self) -> Result<(), SettingsError> {
        *self.persist_calls.lock().unwrap() += 1;
        Ok(())
    }
}

/// Learner that records everything it is shown.
#[derive(Default)]
pub struct RecordingLearner {
    pub observed: Mutex<Vec<(String, String)>>,
}

impl PassiveLearner for RecordingLearner {
    async fn observe(&self, text: &str, user: &str) -> Result<(), GatewayError> {
        self.observed
            .lock()
            .unwrap()
            .push((text.to_string(), user.to_string()));
        Ok(())
    }
}

pub type TestEngine =
    BotEngine<ScriptedGateway, RecordingPlatform, MemorySettings, RecordingLearner, ManualClock>;

/// Engine with default config: bot name "banter", owner "streamlord".
pub fn test_engine() -> TestEngine {
    engine_with(|_| {})
}

/// Engine with the default test config after `tweak` has adjusted it.
pub fn engine_with(tweak: impl FnOnce(&mut BotConfig)) -> TestEngine {
    let mut config = BotConfig {
        bot_name: "banter".to_string(),
        channel: "testchan".to_string(),
        owner: "streamlord".to_string(),
        fallback_reply: "brain lagged out".to_string(),
        ..BotConfig::default()
    };
    tweak(&mut config);

    let deps = Collaborators {
        gateway: ScriptedGateway::default(),
        platform: RecordingPlatform::default(),
        settings: MemorySettings::default(),
        learner: Arc::new(RecordingLearner::default()),
    };
    BotEngine::new(&config, deps, ManualClock::new(Utc::now()))
}

/// Everything the engine has said, in order.
pub fn say_lines(engine: &TestEngine) -> Vec<String> {
    engine.deps.platform.said.lock().unwrap().clone()
}
