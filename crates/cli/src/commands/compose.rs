//! `toolscribe compose` — Substitute fragments into the raw skeletons.

use std::path::Path;
use toolscribe_compose::{ComposeReport, FragmentComposer, FragmentDirs, compose_all};
use super::{CmdResult, Session, print_summary, write_report};

pub async fn run(config_path: Option<&Path>) -> CmdResult {
    let session = Session::open(config_path)?;
    let report = stage(&session)?;
    let path = write_report(&session.config.paths.reports_dir, &report.batch, &report)?;
    print_summary(&report.batch, Some(&path));
    print_missing(&report);
    Ok(())
}

/// Run the compose stage for an open session.
pub fn stage(session: &Session) -> CmdResult<ComposeReport> {
    let paths = &session.config.paths;
    println!("🧵 Composing {} → {}", paths.raw_dir.display(), paths.tools_dir.display());

    let composer = FragmentComposer::new(session.names.clone(), FragmentDirs::from_config(paths));
    Ok(compose_all(&composer, &paths.raw_dir, &paths.tools_dir, &session.cancel)?)
}

pub fn print_missing(report: &ComposeReport) {
    if report.missing.is_empty() {
        return;
    }
    println!("   Missing fragments:");
    for (kind, count) in report.missing_by_kind() {
        println!("     {kind:<15} {count}");
    }
}
