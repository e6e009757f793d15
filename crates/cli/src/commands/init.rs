//! `sheetdraft init`: Write a default config file.

use std::path::Path;

use sheetdraft_config::AppConfig;

pub async fn run(config_path: Option<&Path>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = super::resolve_config_path(config_path);

    println!("📋 sheetdraft — Setup");
    println!("=====================\n");

    if write_default_config(&path, force)? {
        println!("✅ Created config at: {}", path.display());
        println!("\n📝 Next steps:");
        println!("   1. Set telegram.bot_token (or SHEETDRAFT_BOT_TOKEN)");
        println!("   2. Set sheets.spreadsheet_id (or SHEETDRAFT_SPREADSHEET_ID)");
        println!("   3. Put the service-account key at sheets.credentials_path");
        println!("   4. Run: sheetdraft doctor, then sheetdraft run\n");
    } else {
        println!("⚠️  Config already exists at: {}", path.display());
        println!("   Edit it manually or re-run with --force.\n");
    }

    Ok(())
}

/// Returns `false` when the file exists and `force` is not set.
fn write_default_config(path: &Path, force: bool) -> std::io::Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(true)
}
