//! `sheetdraft doctor`: Diagnose configuration and connectivity.

use std::path::Path;

use sheetdraft_channels::{TelegramChannel, TelegramConfig};
use sheetdraft_config::AppConfig;
use sheetdraft_core::sheets::SpreadsheetService;
use sheetdraft_sheets::{GoogleSheetsClient, ServiceAccountKey};

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 sheetdraft Doctor — Diagnostics");
    println!("=================================\n");

    let mut issues = 0;

    let path = super::resolve_config_path(config_path);
    if !path.exists() {
        println!("  ⚠️  No config file at {} — run `sheetdraft init`", path.display());
        println!("      Continuing with defaults and environment variables.");
    }

    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            summary(issues + 1);
            return Ok(());
        }
    };

    match config.require_runtime() {
        Ok(_) => println!("  ✅ Bot token and spreadsheet id set"),
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    issues += check_telegram(&config).await;
    issues += check_sheets(&config).await;

    summary(issues);
    Ok(())
}

async fn check_telegram(config: &AppConfig) -> usize {
    let Some(token) = config.telegram.bot_token.clone() else {
        return 0;
    };
    let channel = match TelegramChannel::new(TelegramConfig::from_settings(&config.telegram, token)) {
        Ok(channel) => channel,
        Err(e) => {
            println!("  ❌ Telegram client: {e}");
            return 1;
        }
    };
    match channel.bot_username().await {
        Ok(name) => {
            println!("  ✅ Telegram reachable as @{name}");
            0
        }
        Err(e) => {
            println!("  ❌ Telegram getMe failed: {e}");
            1
        }
    }
}

async fn check_sheets(config: &AppConfig) -> usize {
    let path = &config.sheets.credentials_path;
    let key = match ServiceAccountKey::from_file(path) {
        Ok(key) => {
            println!("  ✅ Credentials for {}", key.client_email);
            key
        }
        Err(e) => {
            println!("  ❌ {e}");
            return 1;
        }
    };

    let Some(spreadsheet_id) = config.sheets.spreadsheet_id.as_deref() else {
        return 0;
    };
    let client = match GoogleSheetsClient::new(key, config.sheets.range_quoting) {
        Ok(client) => client,
        Err(e) => {
            println!("  ❌ Sheets client: {e}");
            return 1;
        }
    };
    match client.list_sheet_names(spreadsheet_id).await {
        Ok(names) => {
            println!("  ✅ Spreadsheet has {} sheet(s): {}", names.len(), names.join(", "));
            0
        }
        Err(e) => {
            println!("  ❌ Spreadsheet not readable: {e}");
            1
        }
    }
}

fn summary(issues: usize) {
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }
}
