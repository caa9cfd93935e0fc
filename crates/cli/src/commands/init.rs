//! `toolscribe init` — Write a default config and empty lookup tables.

use std::path::{Path, PathBuf};
use toolscribe_config::{AppConfig, LOCAL_CONFIG_FILE};
use super::CmdResult;

pub async fn run(config_path: Option<&Path>, force: bool) -> CmdResult {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));

    println!("📚 toolscribe — Setup");
    println!("=====================\n");

    if config_path.exists() && !force {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or re-run with --force.\n");
    } else {
        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Wrote {}", config_path.display());
    }

    // Lookup tables are read from the paths in the config just written.
    let config = AppConfig::load_from(&config_path)?;
    let tables = [
        (&config.naming.brand_map, "[]\n"),
        (&config.naming.compound_words, "{}\n"),
        (&config.naming.stop_words, "[]\n"),
    ];
    for (path, empty) in tables {
        if path.exists() {
            println!("   Lookup table exists: {}", path.display());
            continue;
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, empty)?;
        println!("✅ Created {}", path.display());
    }

    println!("\n📝 Next steps:");
    println!("   1. Fill in the brand map, compound words and stop words");
    println!("   2. Set TOOLSCRIBE_API_KEY (or AZURE_OPENAI_API_KEY / OPENAI_API_KEY)");
    println!("   3. Run: toolscribe doctor\n");

    Ok(())
}
