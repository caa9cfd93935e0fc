//! Assemble every family, one at a time.

use std::path::Path;
use serde::Serialize;
use toolscribe_core::{BatchReport, CancelFlag};
use tracing::{error, info, warn};
use crate::assembler::FamilyAssembler;
use crate::error::FamilyError;
use crate::grouper::FamilyGroup;

/// A family whose token need exceeded the model ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CappedFamily {
    pub family: String,
    pub tool_count: usize,
    pub raw_need: u32,
    pub max_output_tokens: u32,
}

/// Result of an assemble batch.
#[derive(Debug, Clone, Serialize)]
pub struct AssembleReport {
    #[serde(flatten)]
    pub batch: BatchReport,
    /// Families that should be split
    pub capped: Vec<CappedFamily>,
}

/// Assemble each family and write it to `out_dir`.
///
/// Each family's budget is estimated once; a capped family is listed even
/// when its generation then fails. A failed family is recorded and the batch
/// continues. The family file is the last thing written for each family.
pub async fn assemble_all(
    assembler: &FamilyAssembler,
    families: &[FamilyGroup],
    out_dir: &Path,
    cancel: &CancelFlag,
) -> Result<AssembleReport, FamilyError> {
    std::fs::create_dir_all(out_dir).map_err(|e| FamilyError::CreateDir {
        path: out_dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut batch = BatchReport::new("assemble");
    let mut capped = Vec::new();

    for family in families {
        if cancel.is_cancelled() {
            warn!("Cancellation requested, stopping assemble stage");
            batch.cancelled = true;
            break;
        }

        let budget = assembler.estimator().for_family(family);
        if budget.capped {
            capped.push(CappedFamily {
                family: family.family_key.clone(),
                tool_count: family.tool_count(),
                raw_need: budget.raw_need,
                max_output_tokens: budget.max_output_tokens,
            });
        }

        let result = match assembler.assemble_within(family, budget).await {
            Ok(doc) => {
                let path = out_dir.join(&doc.file_name);
                std::fs::write(&path, &doc.content).map_err(|e| FamilyError::Write {
                    path,
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => batch.succeed(&family.family_key),
            Err(e) if e.is_cancelled() => {
                warn!(family = %family.family_key, "Cancelled mid-family");
                batch.skip(&family.family_key, "cancelled");
                batch.cancelled = true;
                break;
            }
            Err(e) => {
                error!(family = %family.family_key, error = %e, "Family assembly failed");
                batch.fail(&family.family_key, e);
            }
        }
    }

    batch.finish();
    info!(capped = capped.len(), "{}", batch.summary_line());
    Ok(AssembleReport { batch, capped })
}
