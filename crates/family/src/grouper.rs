//! Reads composed tool files and groups them into families.

use std::collections::BTreeMap;
use std::path::Path;
use toolscribe_compose::list_markdown;
use toolscribe_core::ItemSkip;
use toolscribe_naming::{NameContext, resolve_base};
use tracing::{debug, warn};
use crate::error::FamilyError;
use crate::parser::{Extraction, ToolContent, parse_tool};

/// All tools sharing one command area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyGroup {
    pub family_key: String,
    pub display_name: String,
    /// Output file name for the family document
    pub file_name: String,
    /// Sorted by display name
    pub tools: Vec<ToolContent>,
}

impl FamilyGroup {
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    pub fn word_count(&self) -> usize {
        self.tools.iter().map(ToolContent::word_count).sum()
    }
}

/// Case-insensitive display-name order, ties broken by command then file name.
pub(crate) fn sort_tools(tools: &mut [ToolContent]) {
    tools.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then_with(|| a.command.cmp(&b.command))
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
}

/// Group parsed tools by family key. Output is independent of input order.
pub fn group_tools(tools: Vec<ToolContent>, ctx: &NameContext) -> Vec<FamilyGroup> {
    let mut by_key: BTreeMap<String, Vec<ToolContent>> = BTreeMap::new();
    for tool in tools {
        by_key.entry(tool.family_key.clone()).or_default().push(tool);
    }

    by_key
        .into_iter()
        .map(|(family_key, mut tools)| {
            sort_tools(&mut tools);
            FamilyGroup {
                display_name: ctx.display_name(&family_key),
                file_name: format!("{}.md", resolve_base(&family_key, ctx)),
                family_key,
                tools,
            }
        })
        .collect()
}

/// Parsed tools plus the files that could not be used.
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    pub tools: Vec<ToolContent>,
    pub skipped: Vec<ItemSkip>,
}

/// Reads a directory of composed tool files.
pub struct FamilyReader<'a> {
    ctx: &'a NameContext,
}

impl<'a> FamilyReader<'a> {
    pub fn new(ctx: &'a NameContext) -> Self {
        Self { ctx }
    }

    /// Parse every `*.md` file in `dir`.
    ///
    /// An unreadable directory is an error; unreadable or unparseable files
    /// are skipped with a reason.
    pub fn read_dir(&self, dir: &Path) -> Result<ReadOutcome, FamilyError> {
        let files = list_markdown(dir).map_err(|e| FamilyError::Read {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut outcome = ReadOutcome::default();
        for path in files {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(file = %file_name, error = %e, "Unreadable tool file, skipping");
                    outcome.skipped.push(ItemSkip {
                        item: file_name,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match parse_tool(&file_name, &content, self.ctx) {
                Extraction::Found(tool) => {
                    debug!(file = %file_name, family = %tool.family_key, "Parsed tool file");
                    outcome.tools.push(tool);
                }
                Extraction::NotFound(reason) => {
                    warn!(file = %file_name, reason = %reason, "Unusable tool file, skipping");
                    outcome.skipped.push(ItemSkip {
                        item: file_name,
                        reason,
                    });
                }
            }
        }
        Ok(outcome)
    }

    /// Read and group in one step.
    pub fn read_families(&self, dir: &Path) -> Result<(Vec<FamilyGroup>, Vec<ItemSkip>), FamilyError> {
        let outcome = self.read_dir(dir)?;
        Ok((group_tools(outcome.tools, self.ctx), outcome.skipped))
    }
}
