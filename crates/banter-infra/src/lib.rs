//! Infrastructure implementations for the Banter chat bot.
//!
//! Everything that touches the outside world lives here: the TOML config
//! loader, the JSON settings file, the HTTP generation gateway, and the
//! console chat adapter. `banter-core` only sees these through its
//! collaborator traits.

pub mod config;
pub mod console;
pub mod gateway;
pub mod learner;
pub mod settings;

pub use config::load_config;
pub use console::ConsolePlatform;
pub use gateway::HttpGateway;
pub use learner::NullLearner;
pub use settings::JsonSettingsStore;
