pub mod assemble;
pub mod compose;
pub mod doctor;
pub mod examples;
pub mod fragments;
pub mod init;
pub mod pipeline;
pub mod resolve;

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use toolscribe_config::AppConfig;
use toolscribe_core::{BatchReport, CancelFlag};
use toolscribe_naming::NameContext;
use toolscribe_providers::RetryingClient;

pub type CmdResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Providers that run without an API key.
pub(crate) const KEYLESS_PROVIDERS: &[&str] = &["ollama", "vllm"];

/// Everything a stage command needs, loaded before any item is processed.
pub struct Session {
    pub config: AppConfig,
    pub names: Arc<NameContext>,
    pub cancel: CancelFlag,
}

impl Session {
    /// Load config and lookup tables. Either failing is fatal.
    pub fn open(config_path: Option<&Path>) -> CmdResult<Self> {
        let config = load_config(config_path)?;
        let names = NameContext::load(&config.naming)
            .map_err(|e| format!("Failed to load lookup tables: {e}"))?;
        tracing::info!(
            brands = names.brand_count(),
            compound_words = names.compound_count(),
            stop_words = names.stop_word_count(),
            "Lookup tables loaded"
        );

        let cancel = CancelFlag::new();
        watch_ctrl_c(cancel.clone());

        Ok(Self {
            config,
            names: Arc::new(names),
            cancel,
        })
    }

    /// Build the retrying client for the configured default provider.
    pub fn client(&self) -> CmdResult<Arc<RetryingClient>> {
        let config = &self.config;
        if !config.has_api_key() && !KEYLESS_PROVIDERS.contains(&config.default_provider.as_str()) {
            eprintln!();
            eprintln!("  ERROR: No API key configured!");
            eprintln!();
            eprintln!("  Set one of these environment variables:");
            eprintln!("    TOOLSCRIBE_API_KEY     (generic, highest priority)");
            eprintln!("    AZURE_OPENAI_API_KEY   (Azure OpenAI)");
            eprintln!("    OPENAI_API_KEY         (OpenAI direct)");
            eprintln!();
            eprintln!("  Or add api_key to toolscribe.toml");
            eprintln!();
            return Err("No API key found. See above for setup instructions.".into());
        }

        let provider = toolscribe_providers::build_default_provider(config);
        let client = RetryingClient::from_config(provider, config).with_cancel(self.cancel.clone());
        Ok(Arc::new(client))
    }
}

/// Load config from an explicit path, or from the default locations.
pub fn load_config(path: Option<&Path>) -> CmdResult<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_explicit(path),
        None => AppConfig::load(),
    }
    .map_err(|e| format!("Failed to load config: {e}"))?;
    Ok(config)
}

/// Set the flag on Ctrl-C. The current item finishes; the batch stops after it.
fn watch_ctrl_c(cancel: CancelFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n  ⏹  Stopping after the current item...");
            cancel.cancel();
        }
    });
}

/// Write a stage report as pretty JSON into the reports directory.
pub fn write_report<T: Serialize>(dir: &Path, batch: &BatchReport, report: &T) -> CmdResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}-{}.json", batch.stage, batch.run_id));
    std::fs::write(&path, serde_json::to_string_pretty(report)?)?;
    Ok(path)
}

/// Print the end-of-stage summary with explicit item lists.
pub fn print_summary(batch: &BatchReport, report_path: Option<&Path>) {
    let icon = if batch.cancelled {
        "⏹ "
    } else if batch.is_clean() {
        "✅"
    } else {
        "⚠️ "
    };
    println!("{icon} {}", batch.summary_line());

    for skip in &batch.skipped {
        println!("   ⏭  {} — {}", skip.item, skip.reason);
    }
    for failure in &batch.failed {
        println!("   ❌ {} — {}", failure.item, failure.error);
    }
    if let Some(path) = report_path {
        println!("   📄 Report: {}", path.display());
    }
}
