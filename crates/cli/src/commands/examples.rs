//! `toolscribe examples` — Generate example-prompt fragments.

use std::path::{Path, PathBuf};
use toolscribe_compose::{ExampleDirs, ExamplePromptStage};
use toolscribe_core::{BatchReport, ToolList};
use super::{CmdResult, Session, print_summary, write_report};

pub async fn run(
    config_path: Option<&Path>,
    tools: Option<PathBuf>,
    skip_existing: bool,
    count: usize,
) -> CmdResult {
    let session = Session::open(config_path)?;
    let report = stage(&session, tools.as_deref(), skip_existing, count).await?;
    let path = write_report(&session.config.paths.reports_dir, &report, &report)?;
    print_summary(&report, Some(&path));
    Ok(())
}

/// Run the example-prompt stage for an open session.
pub async fn stage(
    session: &Session,
    tools: Option<&Path>,
    skip_existing: bool,
    count: usize,
) -> CmdResult<BatchReport> {
    let tool_path = tools.unwrap_or(session.config.paths.tool_list.as_path());
    let tool_list = ToolList::load(tool_path)?;
    let client = session.client()?;
    println!(
        "💬 Generating example prompts for {} tools with {}",
        tool_list.len(),
        client.model()
    );

    let stage = ExamplePromptStage::new(
        client,
        session.names.clone(),
        ExampleDirs::from_config(&session.config.paths),
        session.config.assembly.example_prompt_tokens,
    )
    .with_prompt_count(count)
    .with_skip_existing(skip_existing)
    .with_cancel(session.cancel.clone());

    Ok(stage.run(&tool_list).await?)
}
