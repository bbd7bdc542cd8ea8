//! Configuration loader for Banter.
//!
//! Reads `banter.toml` and deserializes it into [`BotConfig`]. Falls back to
//! the built-in defaults when the file is missing or malformed; a typo in
//! the config must not keep the bot out of chat.

use std::path::Path;

use banter_types::config::BotConfig;

/// Load bot configuration from `path`.
///
/// - If the file does not exist, returns [`BotConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the
///   default.
/// - Otherwise returns the parsed config, with unspecified fields filled
///   from the default.
pub async fn load_config(path: &Path) -> BotConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("no config at {}, using defaults", path.display());
            return BotConfig::default();
        }
        Err(err) => {
            tracing::warn!("failed to read {}: {err}, using defaults", path.display());
            return BotConfig::default();
        }
    };

    match toml::from_str::<BotConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("failed to parse {}: {err}, using defaults", path.display());
            BotConfig::default()
        }
    }
}
