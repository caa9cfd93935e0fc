//! `toolscribe assemble` — Build family documents.

use std::path::Path;
use toolscribe_family::{AssembleReport, FamilyAssembler, FamilyReader, assemble_all};
use super::{CmdResult, Session, print_summary, write_report};

pub async fn run(config_path: Option<&Path>, only: &[String]) -> CmdResult {
    let session = Session::open(config_path)?;
    let report = stage(&session, only).await?;
    let path = write_report(&session.config.paths.reports_dir, &report.batch, &report)?;
    print_summary(&report.batch, Some(&path));
    print_capped(&report);
    Ok(())
}

/// Run the assemble stage for an open session.
pub async fn stage(session: &Session, only: &[String]) -> CmdResult<AssembleReport> {
    let paths = &session.config.paths;
    let (mut families, unreadable) = FamilyReader::new(&session.names).read_families(&paths.tools_dir)?;
    if !only.is_empty() {
        families.retain(|f| only.contains(&f.family_key));
    }
    println!(
        "📖 Assembling {} families from {} → {}",
        families.len(),
        paths.tools_dir.display(),
        paths.families_dir.display()
    );

    let assembler = FamilyAssembler::from_config(session.client()?, &session.config);
    let mut report = assemble_all(&assembler, &families, &paths.families_dir, &session.cancel).await?;
    report.batch.skipped.extend(unreadable);
    Ok(report)
}

pub fn print_capped(report: &AssembleReport) {
    for capped in &report.capped {
        println!(
            "   ✂️  {} needs ~{} tokens for {} tools, capped at {}; consider splitting it",
            capped.family, capped.raw_need, capped.tool_count, capped.max_output_tokens
        );
    }
}
