//! `toolscribe doctor` — Check config, lookup tables and directories.

use std::path::Path;
use toolscribe_core::ToolList;
use toolscribe_naming::NameContext;
use super::{CmdResult, KEYLESS_PROVIDERS, load_config};

pub async fn run(config_path: Option<&Path>) -> CmdResult {
    println!("🩺 toolscribe Doctor — Pipeline Diagnostics");
    println!("===========================================\n");

    let mut issues = 0;

    let config = match load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            println!("\n  ⚠️  Fix the config before anything else can be checked.");
            return Ok(());
        }
    };

    let keyless = KEYLESS_PROVIDERS.contains(&config.default_provider.as_str());
    if config.has_api_key() {
        println!("  ✅ API key configured ({})", config.default_provider);
    } else if keyless {
        println!("  ✅ No API key needed ({})", config.default_provider);
    } else {
        println!("  ⚠️  No API key configured — set TOOLSCRIBE_API_KEY or add api_key to toolscribe.toml");
        issues += 1;
    }

    if config.has_api_key() || keyless {
        let provider = toolscribe_providers::build_default_provider(&config);
        match provider.health_check().await {
            Ok(true) => println!("  ✅ Backend reachable ({})", provider.name()),
            Ok(false) => {
                println!("  ❌ Backend rejected the health check ({})", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Backend unreachable ({}): {e}", provider.name());
                issues += 1;
            }
        }
    }

    match NameContext::load(&config.naming) {
        Ok(names) => println!(
            "  ✅ Lookup tables loaded ({} brands, {} compound words, {} stop words)",
            names.brand_count(),
            names.compound_count(),
            names.stop_word_count()
        ),
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    match ToolList::load(&config.paths.tool_list) {
        Ok(tools) => println!("  ✅ Tool list has {} tools", tools.len()),
        Err(e) => {
            println!("  ❌ Tool list unusable: {e}");
            issues += 1;
        }
    }

    let dirs = [
        ("Annotations", &config.paths.annotations_dir),
        ("Parameters", &config.paths.parameters_dir),
        ("Example prompts", &config.paths.example_prompts_dir),
        ("Raw skeletons", &config.paths.raw_dir),
        ("Tool documents", &config.paths.tools_dir),
    ];
    for (label, dir) in dirs {
        if dir.is_dir() {
            println!("  ✅ {label} directory: {}", dir.display());
        } else {
            // Stages create their output directories; this only matters for a partial run.
            println!("  ⚠️  {label} directory missing: {}", dir.display());
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
