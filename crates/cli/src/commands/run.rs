//! `sheetdraft run`: Serve the bot until Ctrl-C.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sheetdraft_channels::{TelegramChannel, TelegramConfig};
use sheetdraft_core::channel::Channel;
use sheetdraft_conversation::{ConversationController, Dispatcher, InMemorySessionStore};
use sheetdraft_sheets::GoogleSheetsClient;
use tracing::{info, warn};

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let runtime = config
        .require_runtime()
        .map_err(|e| format!("Cannot start: {e}"))?;

    let sheets = GoogleSheetsClient::from_credentials_file(
        &runtime.credentials_path,
        config.sheets.range_quoting,
    )?;
    let channel = Arc::new(TelegramChannel::new(TelegramConfig::from_settings(
        &config.telegram,
        runtime.bot_token.clone(),
    ))?);
    let store = Arc::new(InMemorySessionStore::new());

    let controller = Arc::new(
        ConversationController::new(
            channel.clone(),
            Arc::new(sheets),
            store,
            runtime.spreadsheet_id.clone(),
        )
        .with_row_count(config.display.row_count),
    );
    let dispatcher = Dispatcher::new(controller, channel.clone());

    println!("📋 sheetdraft — Starting");
    println!("   Spreadsheet: {}", runtime.spreadsheet_id);
    println!("   Rows shown:  {}", config.display.row_count);
    println!("   Session TTL: {} min", config.sessions.ttl_minutes);

    let events = channel.start().await?;
    let sweeper = dispatcher.spawn_sweeper(
        Duration::from_secs(config.sessions.ttl_minutes * 60),
        Duration::from_secs(config.sessions.sweep_interval_secs),
    );
    info!(channel = channel.name(), "Bot started");

    tokio::select! {
        _ = dispatcher.run(events) => warn!("Event stream ended"),
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown requested");
        }
    }

    channel.stop().await?;
    dispatcher.shutdown();
    sweeper.abort();
    println!("👋 sheetdraft stopped");

    Ok(())
}
