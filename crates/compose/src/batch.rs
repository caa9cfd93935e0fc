//! Compose every raw skeleton in a directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use serde::Serialize;
use toolscribe_core::{BatchReport, CancelFlag};
use toolscribe_naming::FragmentKind;
use tracing::{error, info, warn};
use crate::composer::FragmentComposer;
use crate::error::{ComposeError, ensure_dir};
use crate::fragments::write_file;

/// One fragment that was not found while composing a tool file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingFragment {
    pub tool_file: String,
    pub kind: FragmentKind,
}

/// Result of a compose batch.
#[derive(Debug, Clone, Serialize)]
pub struct ComposeReport {
    #[serde(flatten)]
    pub batch: BatchReport,
    pub missing: Vec<MissingFragment>,
}

impl ComposeReport {
    /// Missing-fragment counts per kind.
    pub fn missing_by_kind(&self) -> BTreeMap<FragmentKind, usize> {
        let mut counts = BTreeMap::new();
        for miss in &self.missing {
            *counts.entry(miss.kind).or_insert(0) += 1;
        }
        counts
    }
}

/// List skeleton files (`*.md`) in a directory, sorted by name.
pub fn list_markdown(dir: &Path) -> Result<Vec<PathBuf>, ComposeError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ComposeError::read(dir, e))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    Ok(files)
}

/// Compose every skeleton in `raw_dir` into `tools_dir`.
///
/// A missing raw directory aborts the stage. Per-file failures are
/// recorded and the batch continues; missing fragments never fail a file.
pub fn compose_all(
    composer: &FragmentComposer,
    raw_dir: &Path,
    tools_dir: &Path,
    cancel: &CancelFlag,
) -> Result<ComposeReport, ComposeError> {
    let files = list_markdown(raw_dir)?;
    ensure_dir(tools_dir)?;

    let mut batch = BatchReport::new("compose");
    let mut missing = Vec::new();

    for path in files {
        if cancel.is_cancelled() {
            warn!("Cancellation requested, stopping compose stage");
            batch.cancelled = true;
            break;
        }

        let item = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let result = composer.compose(&path).and_then(|composed| {
            write_file(&tools_dir.join(&composed.file_name), &composed.content)?;
            Ok(composed)
        });

        match result {
            Ok(composed) => {
                missing.extend(composed.missing_kinds().into_iter().map(|kind| {
                    MissingFragment {
                        tool_file: item.clone(),
                        kind,
                    }
                }));
                batch.succeed(item);
            }
            Err(e) => {
                error!(file = %item, error = %e, "Failed to compose tool file");
                batch.fail(item, e);
            }
        }
    }

    batch.finish();
    info!(missing_fragments = missing.len(), "{}", batch.summary_line());
    Ok(ComposeReport { batch, missing })
}
