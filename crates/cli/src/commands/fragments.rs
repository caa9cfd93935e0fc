//! `toolscribe fragments` — Render fragments and raw skeletons.

use std::path::{Path, PathBuf};
use toolscribe_compose::{FragmentWriter, OutputDirs, SimpleTemplate};
use toolscribe_core::{BatchReport, ToolList};
use super::{CmdResult, Session, print_summary, write_report};

pub async fn run(config_path: Option<&Path>, tools: Option<PathBuf>, template: Option<PathBuf>) -> CmdResult {
    let session = Session::open(config_path)?;
    let report = stage(&session, tools.as_deref(), template.as_deref())?;
    let path = write_report(&session.config.paths.reports_dir, &report, &report)?;
    print_summary(&report, Some(&path));
    Ok(())
}

/// Run the fragment stage for an open session.
pub fn stage(session: &Session, tools: Option<&Path>, template: Option<&Path>) -> CmdResult<BatchReport> {
    let tool_path = tools.unwrap_or(session.config.paths.tool_list.as_path());
    let tool_list = ToolList::load(tool_path)?;
    println!("🧩 Rendering fragments for {} tools from {}", tool_list.len(), tool_path.display());

    let mut writer = FragmentWriter::new(
        session.names.clone(),
        OutputDirs::from_config(&session.config.paths),
    )
    .with_cancel(session.cancel.clone());
    if let Some(template) = template {
        writer = writer.with_renderer(Box::new(SimpleTemplate::load(template)?));
    }

    Ok(writer.write_all(&tool_list)?)
}
