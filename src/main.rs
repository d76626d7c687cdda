//! # Main Entry Point
//!
//! Wires the layers together:
//! - Domain: configuration and types
//! - Infrastructure: Matrix, Twitch, Trello
//! - Relay: the OS queue worker thread
//! - Application: event dispatcher and command router
//! - Interface: built-in command handlers

use anyhow::{Context, Result};
use clap::Parser;
use matrix_sdk::{
    config::SyncSettings,
    room::Room,
    ruma::events::room::message::{MessageType, SyncRoomMessageEvent},
};
use std::sync::Arc;
use tokio::sync::Mutex;

use herald::application::context::BotContext;
use herald::application::registry::load_extension;
use herald::application::router::Router;
use herald::application::state::BotState;
use herald::application::dispatch;
use herald::domain::config::AppConfig;
use herald::domain::types::ChatMessage;
use herald::infrastructure::matrix;
use herald::infrastructure::trello::TrelloClient;
use herald::infrastructure::twitch::TwitchClient;
use herald::interface::commands;
use herald::relay;

#[derive(Parser)]
#[command(about = "Stream-announcement chat bot")]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "herald.yaml")]
    config: String,
}

/// Keeps the non-blocking writer alive for the process lifetime.
fn init_tracing(log_file: Option<&str>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "info,matrix_sdk=warn,matrix_sdk_base=warn,matrix_sdk_crypto=error,ruma=warn,hyper=warn",
        )
    });

    match log_file {
        Some(path) => {
            let path = std::path::Path::new(path);
            let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
            let file = path.file_name().map(|f| f.to_owned()).unwrap_or_default();
            let appender = tracing_appender::rolling::never(dir, file);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(&args.config)?;
    let _log_guard = init_tracing(config.runtime.log_file.as_deref());

    tracing::info!("starting herald");

    // Matrix login
    let (client, gateway) = matrix::connect(&config.chat).await?;
    let gateway = Arc::new(gateway);

    // Command tables: built-ins plus the configured extension, if any. An
    // unknown extension name aborts startup.
    let mut command_set = commands::builtin();
    let extension = match &config.chat.extension {
        Some(name) => {
            let extension = load_extension(name, &config)
                .with_context(|| format!("loading extension '{name}'"))?;
            command_set.merge(extension.as_ref());
            Some(extension)
        }
        None => None,
    };

    let board = config
        .board
        .clone()
        .map(|board| Arc::new(TrelloClient::new(board)) as _);

    let ctx = Arc::new(BotContext {
        chat: gateway.clone(),
        provider: Arc::new(TwitchClient::new(
            config.provider.clone(),
            config.chat.server.clone(),
        )),
        board,
        state: Arc::new(Mutex::new(BotState::default())),
        commands: command_set,
        extension,
        config,
    });

    // Relay: worker thread on the OS queue feeding the event dispatcher.
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let queue = relay::queue_name(&ctx.config.runtime.queue_prefix, &ctx.config.chat.server);
    relay::spawn_receiver(queue, tx)?;
    tokio::spawn(dispatch::run(ctx.clone(), rx));

    // Chat messages
    let router = Arc::new(Router::new(ctx));
    let start_time = std::time::SystemTime::now();
    let handler_gateway = gateway.clone();

    client.add_event_handler(move |ev: SyncRoomMessageEvent, room: Room| {
        let router = router.clone();
        let gateway = handler_gateway.clone();

        async move {
            let Some(original) = ev.as_original() else {
                return;
            };

            // Skip history replayed by the initial sync.
            let ts = ev.origin_server_ts();
            let event_time =
                std::time::UNIX_EPOCH + std::time::Duration::from_millis(ts.get().into());
            if event_time < start_time {
                return;
            }

            if original.sender == room.own_user_id() {
                return;
            }
            if !gateway.on_configured_server(&room) {
                return;
            }

            let MessageType::Text(text) = &original.content.msgtype else {
                return;
            };

            let msg = ChatMessage {
                room_id: room.room_id().to_string(),
                event_id: original.event_id.to_string(),
                channel_name: room.name().unwrap_or_default(),
                sender: original.sender.to_string(),
                sender_mention: original.sender.to_string(),
                body: text.body.clone(),
            };

            tracing::info!("message from {} in {}", msg.sender, msg.channel_name);
            if let Err(e) = router.route(&msg).await {
                tracing::error!("failed to route message: {e}");
            }
        }
    });

    client
        .sync(SyncSettings::default())
        .await
        .context("matrix sync loop failed")?;
    Ok(())
}
