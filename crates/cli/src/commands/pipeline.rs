//! `toolscribe run` — All stages in order.

use std::path::{Path, PathBuf};
use super::{CmdResult, Session, assemble, compose, examples, fragments, print_summary, write_report};

pub async fn run(config_path: Option<&Path>, tools: Option<PathBuf>, skip_existing: bool) -> CmdResult {
    let session = Session::open(config_path)?;
    let reports_dir = session.config.paths.reports_dir.clone();

    let report = fragments::stage(&session, tools.as_deref(), None)?;
    let path = write_report(&reports_dir, &report, &report)?;
    print_summary(&report, Some(&path));
    if report.cancelled {
        return Ok(());
    }

    let report = examples::stage(
        &session,
        tools.as_deref(),
        skip_existing,
        toolscribe_compose::examples::DEFAULT_PROMPT_COUNT,
    )
    .await?;
    let path = write_report(&reports_dir, &report, &report)?;
    print_summary(&report, Some(&path));
    if report.cancelled {
        return Ok(());
    }

    let report = compose::stage(&session)?;
    let path = write_report(&reports_dir, &report.batch, &report)?;
    print_summary(&report.batch, Some(&path));
    compose::print_missing(&report);
    if report.batch.cancelled {
        return Ok(());
    }

    let report = assemble::stage(&session, &[]).await?;
    let path = write_report(&reports_dir, &report.batch, &report)?;
    print_summary(&report.batch, Some(&path));
    assemble::print_capped(&report);

    Ok(())
}
