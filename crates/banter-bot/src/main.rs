//! Banter entry point.
//!
//! Binary name: `banter`
//!
//! Wires the engine to its real collaborators (HTTP gateway, JSON settings
//! file, console transport), starts the timer loops, and feeds chat lines
//! from stdin until ctrl-c.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use banter_core::{BotEngine, Collaborators, SystemClock};
use banter_infra::{ConsolePlatform, HttpGateway, JsonSettingsStore, NullLearner, load_config};
use banter_types::event::{ChatEvent, Sender};

type Engine =
    BotEngine<HttpGateway, ConsolePlatform, JsonSettingsStore, NullLearner, SystemClock>;

/// An AI chat companion for your stream.
#[derive(Parser)]
#[command(name = "banter", version, about, long_about = None)]
struct Cli {
    /// Path to the bot configuration file.
    #[arg(long, default_value = "banter.toml")]
    config: PathBuf,

    /// Path to the persisted settings file.
    #[arg(long, default_value = "banter-settings.json")]
    settings: PathBuf,

    /// Suppress all output except errors.
    #[arg(long)]
    quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Which engine tick a timer loop drives.
#[derive(Clone, Copy)]
enum Tick {
    Gifts,
    LedgerReset,
    QuotaReset,
    Idle,
    Rotation,
}

fn spawn_ticker(engine: Arc<Engine>, token: CancellationToken, period: Duration, tick: Tick) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval fires immediately; skip the startup tick
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => match tick {
                    Tick::Gifts => engine.tick_gifts().await,
                    Tick::LedgerReset => engine.reset_ledger().await,
                    Tick::QuotaReset => engine.reset_quota().await,
                    Tick::Idle => engine.tick_idle().await,
                    Tick::Rotation => engine.tick_rotation().await,
                },
            }
        }
    });
}

/// Parse a console line of the form `login: text` into a chat message.
fn parse_line(channel: &str, line: &str) -> Option<ChatEvent> {
    let (login, text) = line.split_once(": ")?;
    let login = login.trim();
    let text = text.trim();
    if login.is_empty() || text.is_empty() {
        return None;
    }
    Some(ChatEvent::Message {
        channel: channel.to_string(),
        sender: Sender::viewer(login),
        text: text.to_string(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,banter=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let config = load_config(&cli.config).await;
    tracing::info!(bot = %config.bot_name, channel = %config.channel, "starting up");

    let deps = Collaborators {
        gateway: HttpGateway::new(&config.gateway_url, &config.model),
        platform: ConsolePlatform::new(),
        settings: JsonSettingsStore::open(&cli.settings).await,
        learner: Arc::new(NullLearner),
    };
    let engine = Arc::new(BotEngine::new(&config, deps, SystemClock));
    engine.hydrate().await;

    let token = CancellationToken::new();
    spawn_ticker(
        Arc::clone(&engine),
        token.clone(),
        Duration::from_secs(1),
        Tick::Gifts,
    );
    spawn_ticker(
        Arc::clone(&engine),
        token.clone(),
        Duration::from_secs(300),
        Tick::LedgerReset,
    );
    spawn_ticker(
        Arc::clone(&engine),
        token.clone(),
        Duration::from_secs(86_400),
        Tick::QuotaReset,
    );
    spawn_ticker(
        Arc::clone(&engine),
        token.clone(),
        Duration::from_secs(30),
        Tick::Idle,
    );
    spawn_ticker(
        Arc::clone(&engine),
        token.clone(),
        Duration::from_secs(30),
        Tick::Rotation,
    );

    // Console chat: one `login: text` line per message
    let input_engine = Arc::clone(&engine);
    let input_token = token.clone();
    let channel = config.channel.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                _ = input_token.cancelled() => break,
                line = lines.next_line() => line,
            };
            match line {
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match parse_line(&channel, trimmed) {
                        Some(event) => input_engine.handle_event(event).await,
                        None => eprintln!("expected `login: text`"),
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to read stdin");
                    break;
                }
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    token.cancel();
    engine.shutdown().await;
    Ok(())
}
