//! Trigger dispatch for plain (non-command) messages.
//!
//! Decides, per message: paused? mentioned? still under the per-user reply
//! cap? All decisions are made synchronously under one lock; only then is
//! the gateway awaited. The ledger is incremented after the call regardless
//! of outcome, so forcing gateway errors cannot bypass the rate limit.

use std::sync::Arc;

use banter_types::event::Sender;

use crate::clock::Clock;
use crate::engine::BotEngine;
use crate::gateway::{ChatPlatform, GenerationGateway, PassiveLearner, SettingsStore};
use crate::prompt::{self, PersonaFlags};

/// What to do with a plain message, decided under the state lock.
enum Decision {
    Drop,
    Learn,
    Reply {
        stripped: String,
        context: String,
        system_prompt: String,
    },
}

impl<G, P, S, L, C> BotEngine<G, P, S, L, C>
where
    G: GenerationGateway,
    P: ChatPlatform,
    S: SettingsStore,
    L: PassiveLearner + 'static,
    C: Clock,
{
    pub(crate) async fn handle_plain_message(&self, sender: &Sender, text: &str) {
        let decision = {
            let state = self.state.lock().await;
            if state.paused {
                Decision::Drop
            } else if !text
                .to_lowercase()
                .contains(&self.cfg.bot_name.to_lowercase())
            {
                if state.learn_enabled {
                    Decision::Learn
                } else {
                    Decision::Drop
                }
            } else if !state.ledger.can_respond(&sender.login) {
                // Silent: feedback here would amplify spam
                tracing::debug!(user = %sender.login, "reply cap reached, dropping mention");
                Decision::Drop
            } else {
                let flags = PersonaFlags {
                    waifu: state.is_waifu(&sender.login),
                    final_reply: state.ledger.is_limit_response(&sender.login),
                };
                Decision::Reply {
                    stripped: prompt::strip_mention(text, &self.cfg.bot_name),
                    context: state.history.snapshot(),
                    system_prompt: prompt::build_prompt(&state.base_prompt, flags),
                }
            }
        };

        match decision {
            Decision::Drop => {}
            Decision::Learn => {
                let learner = Arc::clone(&self.deps.learner);
                let text = text.to_string();
                let user = sender.login.clone();
                tokio::spawn(async move {
                    if let Err(err) = learner.observe(&text, &user).await {
                        tracing::debug!(error = %err, "passive learner rejected line");
                    }
                });
            }
            Decision::Reply {
                stripped,
                context,
                system_prompt,
            } => {
                let reply = self
                    .try_generate(&stripped, &context, &system_prompt)
                    .await
                    .unwrap_or_else(|| self.cfg.fallback_reply.clone());
                self.post(&reply).await;

                let mut state = self.state.lock().await;
                state.ledger.increment(&sender.login);
                state.last_mention = self.clock.now();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ledger::MAX_REPLIES_PER_WINDOW;
    use crate::testutil::{engine_with, say_lines, test_engine};
    use banter_types::error::GatewayError;
    use banter_types::event::Sender;

    #[tokio::test]
    async fn mention_gets_a_reply_and_increments_ledger() {
        let engine = test_engine();
        engine.deps.gateway.push_reply(Ok("hey alice".to_string()));

        engine
            .handle_plain_message(&Sender::viewer("alice"), "hey banter what's up")
            .await;

        assert_eq!(say_lines(&engine), vec!["hey alice"]);
        let state = engine.state.lock().await;
        assert_eq!(state.ledger.count("alice"), 1);
        // Bot reply is part of its own future context
        assert!(state.history.snapshot().contains("banter: hey alice"));
    }

    #[tokio::test]
    async fn mention_is_stripped_before_generation() {
        let engine = test_engine();
        engine
            .handle_plain_message(&Sender::viewer("alice"), "@banter tell me a joke")
            .await;

        let calls = engine.deps.gateway.calls.lock().unwrap();
        assert_eq!(calls[0].0, "tell me a joke");
    }

    #[tokio::test]
    async fn empty_reply_substitutes_fallback_and_still_counts() {
        let engine = test_engine();
        engine
            .deps
            .gateway
            .push_reply(Ok("<think>hmm</think>".to_string()));

        engine
            .handle_plain_message(&Sender::viewer("alice"), "banter?")
            .await;

        assert_eq!(say_lines(&engine), vec!["brain lagged out"]);
        assert_eq!(engine.state.lock().await.ledger.count("alice"), 1);
    }

    #[tokio::test]
    async fn gateway_error_substitutes_fallback_and_still_counts() {
        let engine = test_engine();
        engine
            .deps
            .gateway
            .push_reply(Err(GatewayError::Http("down".to_string())));

        engine
            .handle_plain_message(&Sender::viewer("alice"), "banter are you ok")
            .await;

        assert_eq!(say_lines(&engine), vec!["brain lagged out"]);
        // Forcing errors must not bypass the rate limit
        assert_eq!(engine.state.lock().await.ledger.count("alice"), 1);
    }

    #[tokio::test]
    async fn exhausted_user_is_dropped_silently() {
        let engine = test_engine();
        {
            let mut state = engine.state.lock().await;
            for _ in 0..MAX_REPLIES_PER_WINDOW {
                state.ledger.increment("alice");
            }
        }

        engine
            .handle_plain_message(&Sender::viewer("alice"), "banter please")
            .await;

        assert!(say_lines(&engine).is_empty());
        assert_eq!(engine.deps.gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn fifth_reply_requests_goodbye_framing() {
        let engine = test_engine();
        {
            let mut state = engine.state.lock().await;
            for _ in 0..(MAX_REPLIES_PER_WINDOW - 1) {
                state.ledger.increment("alice");
            }
        }

        engine
            .handle_plain_message(&Sender::viewer("alice"), "banter one more")
            .await;

        let prompt = engine.deps.gateway.last_prompt().unwrap();
        assert!(prompt.contains("last reply"), "goodbye framing expected");
    }

    #[tokio::test]
    async fn waifu_sender_gets_persona_modifier() {
        let engine = test_engine();
        engine
            .state
            .lock()
            .await
            .waifus
            .insert("alice".to_string());

        engine
            .handle_plain_message(&Sender::viewer("alice"), "banter hi")
            .await;

        let prompt = engine.deps.gateway.last_prompt().unwrap();
        assert!(prompt.contains("affectionately"));
    }

    #[tokio::test]
    async fn paused_drops_everything() {
        let engine = test_engine();
        engine.state.lock().await.paused = true;

        engine
            .handle_plain_message(&Sender::viewer("alice"), "banter hello")
            .await;

        assert!(say_lines(&engine).is_empty());
        assert_eq!(engine.deps.gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn unaddressed_line_goes_to_learner_when_enabled() {
        let engine = engine_with(|config| config.learn_enabled = true);

        engine
            .handle_plain_message(&Sender::viewer("alice"), "just chatting about rust")
            .await;
        // The observe call is spawned; yield so it runs
        tokio::task::yield_now().await;

        let observed = engine.deps.learner.observed.lock().unwrap().clone();
        assert_eq!(
            observed,
            vec![("just chatting about rust".to_string(), "alice".to_string())]
        );
        assert!(say_lines(&engine).is_empty());
    }

    #[tokio::test]
    async fn unaddressed_line_dropped_when_learning_disabled() {
        let engine = engine_with(|config| config.learn_enabled = false);

        engine
            .handle_plain_message(&Sender::viewer("alice"), "just chatting")
            .await;
        tokio::task::yield_now().await;

        assert!(engine.deps.learner.observed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mention_updates_last_mention_timestamp() {
        let engine = test_engine();
        let before = engine.state.lock().await.last_mention;
        engine.clock.advance(chrono::Duration::minutes(3));

        engine
            .handle_plain_message(&Sender::viewer("alice"), "banter hello")
            .await;

        let after = engine.state.lock().await.last_mention;
        assert_eq!(after, before + chrono::Duration::minutes(3));
    }
}
