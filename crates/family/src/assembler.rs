//! Family document assembly.
//!
//! Generation happens per family in a fixed order: budget, metadata block,
//! related-content block, then (optionally) per-tool headings. The final
//! document is produced by [`stitch`], which involves no generation at all.

use std::sync::Arc;
use toolscribe_compose::examples::clean_output;
use toolscribe_config::{AppConfig, AssemblyConfig};
use toolscribe_core::GenerationError;
use toolscribe_providers::RetryingClient;
use tracing::{debug, info, warn};
use crate::budget::{TokenBudget, TokenBudgetEstimator};
use crate::error::FamilyError;
use crate::grouper::{FamilyGroup, sort_tools};
use crate::parser::{ToolContent, replace_heading};
use crate::prompts::{
    HEADING_SYSTEM_PROMPT, METADATA_SYSTEM_PROMPT, RELATED_CONTENT_SYSTEM_PROMPT,
    heading_prompt, metadata_prompt, related_content_prompt,
};

/// A finished family document.
#[derive(Debug, Clone)]
pub struct FamilyDocument {
    pub family_key: String,
    pub file_name: String,
    pub content: String,
    pub budget: TokenBudget,
    pub tool_count: usize,
    /// Tools whose regenerated heading fell back to the existing one
    pub heading_fallbacks: usize,
}

/// Concatenate metadata, tool sections and related content.
///
/// Tool sections are ordered by display name (case-insensitive) whatever
/// the input order.
pub fn stitch(metadata: &str, tools: &[ToolContent], related: &str) -> String {
    let mut ordered = tools.to_vec();
    sort_tools(&mut ordered);

    let mut parts: Vec<&str> = Vec::with_capacity(ordered.len() + 2);
    let metadata = metadata.trim();
    if !metadata.is_empty() {
        parts.push(metadata);
    }
    parts.extend(ordered.iter().map(|t| t.section.trim()));
    let related = related.trim();
    if !related.is_empty() {
        parts.push(related);
    }

    let mut out = parts.join("\n\n");
    out.push('\n');
    out
}

/// Reduce a model answer to a single heading line.
fn clean_heading(raw: &str) -> Option<String> {
    let line = clean_output(raw).lines().find(|l| !l.trim().is_empty())?.to_string();
    let heading = line
        .trim()
        .trim_start_matches('#')
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim_end_matches(['.', ':'])
        .trim()
        .to_string();
    (!heading.is_empty()).then_some(heading)
}

/// Generates and stitches family documents.
pub struct FamilyAssembler {
    client: Arc<RetryingClient>,
    estimator: TokenBudgetEstimator,
    assembly: AssemblyConfig,
}

impl FamilyAssembler {
    pub fn new(
        client: Arc<RetryingClient>,
        estimator: TokenBudgetEstimator,
        assembly: AssemblyConfig,
    ) -> Self {
        Self {
            client,
            estimator,
            assembly,
        }
    }

    pub fn from_config(client: Arc<RetryingClient>, config: &AppConfig) -> Self {
        Self::new(
            client,
            TokenBudgetEstimator::new(config.budget.clone()),
            config.assembly.clone(),
        )
    }

    pub fn estimator(&self) -> &TokenBudgetEstimator {
        &self.estimator
    }

    /// Build one family's document.
    pub async fn assemble(&self, family: &FamilyGroup) -> Result<FamilyDocument, FamilyError> {
        self.assemble_within(family, self.estimator.for_family(family)).await
    }

    /// Build one family's document within an already estimated budget.
    pub async fn assemble_within(
        &self,
        family: &FamilyGroup,
        budget: TokenBudget,
    ) -> Result<FamilyDocument, FamilyError> {
        debug!(
            family = %family.family_key,
            tool_count = family.tool_count(),
            max_output_tokens = budget.max_output_tokens,
            "Assembling family"
        );

        let metadata = self
            .generate(
                family,
                "metadata",
                METADATA_SYSTEM_PROMPT,
                &metadata_prompt(family),
                budget.limit(self.assembly.metadata_tokens),
            )
            .await?;

        let related = self
            .generate(
                family,
                "related-content",
                RELATED_CONTENT_SYSTEM_PROMPT,
                &related_content_prompt(family),
                budget.limit(self.assembly.related_content_tokens),
            )
            .await?;

        let mut tools = family.tools.clone();
        let mut heading_fallbacks = 0;
        if self.assembly.regenerate_headings {
            let limit = budget.limit(self.assembly.heading_tokens);
            for tool in &mut tools {
                if !self.regenerate_heading(family, tool, limit).await? {
                    heading_fallbacks += 1;
                }
            }
        }

        let content = stitch(&clean_output(&metadata), &tools, &clean_output(&related));
        info!(
            family = %family.family_key,
            tools = tools.len(),
            capped = budget.capped,
            "Assembled family document"
        );

        Ok(FamilyDocument {
            family_key: family.family_key.clone(),
            file_name: family.file_name.clone(),
            content,
            budget,
            tool_count: tools.len(),
            heading_fallbacks,
        })
    }

    async fn generate(
        &self,
        family: &FamilyGroup,
        step: &'static str,
        system_prompt: &str,
        user_prompt: &str,
        max_output_tokens: u32,
    ) -> Result<String, FamilyError> {
        self.client
            .complete(system_prompt, user_prompt, max_output_tokens)
            .await
            .map_err(|source| FamilyError::Generation {
                family: family.family_key.clone(),
                step,
                source,
            })
    }

    /// Replace the tool's heading with a generated one.
    ///
    /// Returns `Ok(false)` when it kept the existing heading. Only a
    /// cancellation is propagated.
    async fn regenerate_heading(
        &self,
        family: &FamilyGroup,
        tool: &mut ToolContent,
        max_output_tokens: u32,
    ) -> Result<bool, FamilyError> {
        let prompt = heading_prompt(&family.display_name, tool);
        let generated = match self
            .client
            .complete(HEADING_SYSTEM_PROMPT, &prompt, max_output_tokens)
            .await
        {
            Ok(text) => clean_heading(&text),
            Err(GenerationError::Cancelled) => {
                return Err(FamilyError::Generation {
                    family: family.family_key.clone(),
                    step: "heading",
                    source: GenerationError::Cancelled,
                });
            }
            Err(e) => {
                warn!(
                    family = %family.family_key,
                    tool = %tool.display_name,
                    error = %e,
                    "Heading generation failed, keeping existing heading"
                );
                None
            }
        };

        match generated {
            Some(heading) => {
                tool.section = replace_heading(&tool.section, &heading);
                tool.display_name = heading;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
