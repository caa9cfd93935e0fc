//! toolscribe CLI — the main entry point.
//!
//! Commands:
//! - `init`      — Write a default config and empty lookup tables
//! - `resolve`   — Show the file names a command resolves to
//! - `fragments` — Render parameter/annotation fragments and raw skeletons
//! - `examples`  — Generate example-prompt fragments
//! - `compose`   — Substitute fragments into the raw skeletons
//! - `assemble`  — Build family documents from the composed tool files
//! - `run`       — All stages in order
//! - `doctor`    — Check config, lookup tables and directories

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "toolscribe",
    about = "toolscribe — CLI tool descriptors in, tool and family documentation out",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (must exist); defaults to ./toolscribe.toml, then ~/.toolscribe/config.toml
    #[arg(short, long, global = true, env = "TOOLSCRIBE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default toolscribe.toml and empty lookup tables
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show the file names a command resolves to
    Resolve {
        /// The command, e.g. `aks nodepool get`
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,

        /// Print only the file name for this kind (e.g. `parameter`)
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Render parameter and annotation fragments and raw skeletons
    Fragments {
        /// Tool list JSON (overrides paths.tool_list)
        #[arg(short, long)]
        tools: Option<PathBuf>,

        /// Skeleton template file (defaults to the built-in template)
        #[arg(long)]
        template: Option<PathBuf>,
    },

    /// Generate example-prompt fragments through the text-generation backend
    Examples {
        /// Tool list JSON (overrides paths.tool_list)
        #[arg(short, long)]
        tools: Option<PathBuf>,

        /// Keep existing example-prompt fragments
        #[arg(long)]
        skip_existing: bool,

        /// Prompts to request per tool
        #[arg(long, default_value_t = 5)]
        count: usize,
    },

    /// Substitute fragments into the raw skeletons
    Compose,

    /// Build family documents from the composed tool files
    Assemble {
        /// Only assemble these families (command areas)
        #[arg(short, long)]
        family: Vec<String>,
    },

    /// Run fragments, examples, compose and assemble in order
    Run {
        /// Tool list JSON (overrides paths.tool_list)
        #[arg(short, long)]
        tools: Option<PathBuf>,

        /// Keep existing example-prompt fragments
        #[arg(long)]
        skip_existing: bool,
    },

    /// Check configuration, lookup tables and directories
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Init { force } => commands::init::run(config, force).await?,
        Commands::Resolve { command, kind } => {
            commands::resolve::run(config, &command.join(" "), kind.as_deref()).await?
        }
        Commands::Fragments { tools, template } => {
            commands::fragments::run(config, tools, template).await?
        }
        Commands::Examples {
            tools,
            skip_existing,
            count,
        } => commands::examples::run(config, tools, skip_existing, count).await?,
        Commands::Compose => commands::compose::run(config).await?,
        Commands::Assemble { family } => commands::assemble::run(config, &family).await?,
        Commands::Run {
            tools,
            skip_existing,
        } => commands::pipeline::run(config, tools, skip_existing).await?,
        Commands::Doctor => commands::doctor::run(config).await?,
    }

    Ok(())
}
