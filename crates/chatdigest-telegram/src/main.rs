//! Telegram group-chat digest bot.
//!
//! Remembers every text message in the chats it is added to and, when
//! someone writes the trigger word, replies with a short per-author summary.
//! Reads the bot token from `BOT_TOKEN` and the completions API key from
//! `OPENROUTER_KEY`.
//!
//! # Examples
//!
//! ```sh
//! # Defaults: trigger "короче", OpenRouter, openai/gpt-4o-mini
//! chatdigest
//!
//! # Custom trigger words, retention, and model from a config file
//! chatdigest --config chatdigest.toml --model anthropic/claude-haiku-4.5
//!
//! # Any OpenAI-compatible endpoint
//! chatdigest --base-url https://api.openai.com/v1 --model gpt-4o-mini
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chatdigest::prelude::*;
use chatdigest_telegram::{TelegramClient, TelegramTransport, run_polling};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Telegram group-chat digest bot.
#[derive(Parser)]
#[command(name = "chatdigest", version)]
struct Cli {
    /// TOML config file. Built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Telegram bot token
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    bot_token: String,

    /// API key for the chat completions backend
    #[arg(long, env = "OPENROUTER_KEY", hide_env_values = true)]
    api_key: String,

    /// Override the summarization model
    #[arg(long)]
    model: Option<String>,

    /// Override the completions base URL (OpenAI-compatible)
    #[arg(long)]
    base_url: Option<String>,

    /// Server-side long-poll timeout in seconds
    #[arg(long, default_value_t = 30)]
    poll_timeout: u64,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let mut config = match &cli.config {
        Some(path) => DigestConfig::load(path).map_err(|e| e.to_string())?,
        None => DigestConfig::default(),
    };
    if let Some(model) = cli.model {
        config = config.with_model(model);
    }
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }

    let backend = ChatBackend::from_config(&cli.api_key, &config.backend)
        .map_err(|e| format!("failed to create completions client: {e}"))?;
    info!(
        model = backend.model(),
        trigger = %config.trigger.word,
        "Starting digest bot"
    );
    let router = Router::from_config(&config, Arc::new(backend)).map_err(|e| e.to_string())?;

    let telegram = Arc::new(
        TelegramClient::new(&cli.bot_token, Duration::from_secs(cli.poll_timeout))
            .map_err(|e| format!("failed to create Telegram client: {e}"))?,
    );
    let transport = TelegramTransport::new(telegram.clone());
    let dispatcher = Dispatcher::new(Arc::new(router), Arc::new(transport));

    run_polling(&telegram, &dispatcher, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    })
    .await;

    info!(
        workers = dispatcher.active_chats(),
        chats_with_history = dispatcher.router().store().chat_count(),
        "Shutting down; draining queued events"
    );
    dispatcher.shutdown().await;
    Ok(())
}
