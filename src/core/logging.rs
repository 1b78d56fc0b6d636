//! Logging initialization
//!
//! Console + file logging through `simplelog`, plus a short startup summary
//! of the external tools and directories the bot depends on.

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective runtime configuration at startup
pub fn log_runtime_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("⭕ Kruzhok configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("ffmpeg:   {}", config::FFMPEG_BIN.as_str());
    log::info!("ffprobe:  {}", config::FFPROBE_BIN.as_str());
    log::info!("temp dir: {}", config::temp_dir().display());
    log::info!("database: {}", config::DATABASE_PATH.as_str());
    log::info!(
        "transcodes: {} concurrent, {}s timeout",
        *config::MAX_CONCURRENT_TRANSCODES,
        config::transcode_timeout().as_secs()
    );
    log::info!("session ttl: {}s", config::session_ttl().as_secs());
}
