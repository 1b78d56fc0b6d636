use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use teloxide::requests::Requester;
use tokio::time::sleep;

use kruzhok::cli::{Cli, Commands};
use kruzhok::core::logging::log_runtime_configuration;
use kruzhok::core::process::binary_available;
use kruzhok::core::{config, init_logger};
use kruzhok::kruzhok::{FfmpegTranscoder, HistoryStore, KruzhokService, SessionManager, SqliteHistoryStore, Transcoder};
use kruzhok::messages;
use kruzhok::storage::create_pool;
use kruzhok::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, TelegramTransport};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Log panics from handler tasks instead of losing them on stderr
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // .env must be loaded before any config static is touched
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run) | None => run_bot().await,
        Some(Commands::CheckFfmpeg) => check_ffmpeg().await,
        Some(Commands::History { user_id, limit }) => print_history(user_id, limit),
    }
}

/// Verifies the ffmpeg toolchain is usable
async fn check_ffmpeg() -> Result<()> {
    let mut missing = Vec::new();
    for bin in [config::FFMPEG_BIN.as_str(), config::FFPROBE_BIN.as_str()] {
        if binary_available(bin).await {
            log::info!("✅ {} is available", bin);
        } else {
            log::error!("❌ {} cannot be executed", bin);
            missing.push(bin);
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(anyhow::anyhow!("missing binaries: {}", missing.join(", ")))
    }
}

/// Prints a user's history the way /history shows it
fn print_history(user_id: i64, limit: usize) -> Result<()> {
    let db_pool = create_pool(&config::DATABASE_PATH)
        .map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?;
    let store = SqliteHistoryStore::new(Arc::new(db_pool));
    let total = store.count_all(user_id)?;
    let entries = store.list_recent(user_id, limit)?;
    println!("{}", messages::history(total, &entries));
    Ok(())
}

async fn run_bot() -> Result<()> {
    log::info!("Starting bot...");
    log_runtime_configuration();

    if !binary_available(&config::FFMPEG_BIN).await {
        log::warn!("{} is not available, every transcode will fail", config::FFMPEG_BIN.as_str());
    }

    let temp_dir = config::temp_dir();
    tokio::fs::create_dir_all(&temp_dir).await?;

    let db_pool = Arc::new(
        create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?,
    );

    let transcoder: Arc<dyn Transcoder> = Arc::new(FfmpegTranscoder::from_config());
    let history: Arc<dyn HistoryStore> = Arc::new(SqliteHistoryStore::new(Arc::clone(&db_pool)));
    let sessions = Arc::new(SessionManager::new(
        Arc::clone(&transcoder),
        temp_dir.clone(),
        config::session_ttl(),
    ));
    let cleanup = Arc::clone(&sessions).spawn_cleanup_task(config::session::cleanup_interval());
    let service = Arc::new(KruzhokService::new(sessions, transcoder, history));

    let bot = create_bot()?;
    match bot.get_me().await {
        Ok(me) => log::info!("Bot authorized as @{}", me.username()),
        Err(e) => log::warn!("Failed to fetch bot info: {}", e),
    }
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let transport = Arc::new(TelegramTransport::new(bot.clone(), temp_dir)?);
    let handler = schema(HandlerDeps::new(db_pool, service, transport));

    let max_retries = config::retry::MAX_DISPATCHER_RETRIES;
    let mut retry_count = 0;

    // Run the dispatcher with retry logic
    loop {
        let bot_clone = bot.clone();
        let handler_clone = handler.clone();

        // Dispatcher runs in its own task so a panic surfaces through the JoinHandle
        let handle = tokio::spawn(async move {
            use teloxide::prelude::*;
            use teloxide::update_listeners::Polling;

            let listener = Polling::builder(bot_clone.clone()).drop_pending_updates().build();

            Dispatcher::builder(bot_clone, handler_clone)
                .dependencies(DependencyMap::new())
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        });

        match handle.await {
            Ok(()) => {
                log::info!("Dispatcher shutdown gracefully");
                break;
            }
            Err(join_err) if join_err.is_panic() => {
                log::error!("Dispatcher panicked: {}", join_err);
                if retry_count < max_retries {
                    retry_count += 1;
                    log::info!(
                        "Retrying dispatcher connection after panic (attempt {}/{})...",
                        retry_count,
                        max_retries
                    );
                    exponential_backoff(retry_count).await;
                } else {
                    log::error!("Max retries reached after panic. Exiting...");
                    break;
                }
            }
            Err(join_err) => {
                log::warn!("Dispatcher task was cancelled: {}", join_err);
                break;
            }
        }

        // Add a delay between retries to avoid overwhelming the API
        sleep(config::retry::dispatcher_delay()).await;
    }

    cleanup.abort();
    Ok(())
}

async fn exponential_backoff(retry_count: u32) {
    let delay = Duration::from_secs(config::retry::EXPONENTIAL_BACKOFF_BASE.pow(retry_count));
    sleep(delay).await;
}
