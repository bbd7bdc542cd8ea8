//! Event-driven conversational state machine for the banter chat bot.
//!
//! The engine ingests a stream of chat events (messages, subs, cheers,
//! raids, gift bursts), keeps a bounded rolling context, enforces per-user
//! reply limits and a shared image quota, debounces gift bursts, and decides
//! per event whether to invoke the generation gateway. Everything external
//! (chat transport, generation backend, settings persistence, passive
//! learner) is reached through the collaborator traits in [`gateway`].
//!
//! All mutation happens on one logical event loop: state lives behind a
//! single mutex that is never held across an awaited external call, and the
//! counters that guard paid paths are reserved synchronously before any
//! await (see [`ledger::ImageQuota`]).

pub mod clock;
pub mod dispatch;
pub mod emitter;
pub mod engine;
pub mod gateway;
pub mod gift;
pub mod history;
pub mod ledger;
pub mod prompt;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod testutil;

pub use clock::{Clock, SystemClock};
pub use engine::{BotEngine, Collaborators, EngineConfig};
pub use state::BotState;
