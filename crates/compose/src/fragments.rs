//! Deterministic fragment rendering: parameter tables, annotations and
//! raw skeletons, one set per tool, named through the resolver.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use toolscribe_config::PathsConfig;
use toolscribe_core::{BatchReport, CancelFlag, ToolDescriptor, ToolList, ToolParameter};
use toolscribe_naming::{FragmentKind, NameContext, ResolvedName};
use tracing::{debug, error, info, warn};
use crate::error::{ComposeError, ensure_dir};
use crate::frontmatter::{FragmentFrontMatter, render_front_matter};
use crate::skeleton::{SimpleTemplate, TemplateRenderer, render_skeleton};

/// Where the deterministic stage writes.
#[derive(Debug, Clone)]
pub struct OutputDirs {
    pub annotations: PathBuf,
    pub parameters: PathBuf,
    pub raw: PathBuf,
}

impl OutputDirs {
    pub fn from_config(paths: &PathsConfig) -> Self {
        Self {
            annotations: paths.annotations_dir.clone(),
            parameters: paths.parameters_dir.clone(),
            raw: paths.raw_dir.clone(),
        }
    }
}

/// Escape a value for a markdown table cell.
fn table_cell(value: &str) -> String {
    value
        .trim()
        .replace('|', "\\|")
        .replace("\r\n", " ")
        .replace('\n', " ")
}

/// Required parameters first, then alphabetical by name.
fn ordered_parameters(tool: &ToolDescriptor) -> Vec<&ToolParameter> {
    let mut params: Vec<_> = tool.parameters.iter().collect();
    params.sort_by(|a, b| {
        b.required
            .cmp(&a.required)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.name.cmp(&b.name))
    });
    params
}

/// Render the parameters fragment.
pub fn render_parameters(tool: &ToolDescriptor) -> Result<String, ComposeError> {
    let mut out = render_front_matter(&FragmentFrontMatter::new(
        tool.command.trim(),
        FragmentKind::Parameter,
    ))?;
    out.push('\n');

    if tool.parameters.is_empty() {
        out.push_str("This tool has no parameters.\n");
        return Ok(out);
    }

    out.push_str("| Parameter | Type | Required | Description |\n");
    out.push_str("|-----------|------|----------|-------------|\n");
    for param in ordered_parameters(tool) {
        out.push_str(&format!(
            "| `{}` | {} | {} | {} |\n",
            param.name.trim(),
            table_cell(&param.param_type),
            if param.required { "Required" } else { "Optional" },
            table_cell(&param.description),
        ));
    }
    Ok(out)
}

/// Render the annotations fragment: one line per metadata flag, by flag name.
pub fn render_annotations(tool: &ToolDescriptor) -> Result<String, ComposeError> {
    let mut out = render_front_matter(&FragmentFrontMatter::new(
        tool.command.trim(),
        FragmentKind::Annotation,
    ))?;
    out.push('\n');

    if tool.metadata.is_empty() {
        out.push_str("No annotations.\n");
        return Ok(out);
    }

    // BTreeMap iteration is already sorted by key.
    for (name, flag) in &tool.metadata {
        let mark = if flag.value { "✅" } else { "❌" };
        match flag.description.as_deref().map(str::trim) {
            Some(desc) if !desc.is_empty() => {
                out.push_str(&format!("- **{name}**: {mark} ({desc})\n"))
            }
            _ => out.push_str(&format!("- **{name}**: {mark}\n")),
        }
    }
    Ok(out)
}

/// Tracks which command claimed each base slug in a batch.
///
/// Two commands that resolve to the same base would overwrite each other's
/// files, so the second one is skipped instead.
#[derive(Debug, Default)]
pub(crate) struct SlugClaims {
    owners: HashMap<String, String>,
}

impl SlugClaims {
    /// Claim a slug for a command. Returns the earlier owner on collision.
    pub(crate) fn claim(&mut self, slug: &str, command: &str) -> Result<(), String> {
        match self.owners.get(slug) {
            Some(owner) if owner != command => Err(owner.clone()),
            Some(_) => Ok(()),
            None => {
                self.owners.insert(slug.to_string(), command.to_string());
                Ok(())
            }
        }
    }
}

/// Writes parameters, annotations and the raw skeleton for every tool.
pub struct FragmentWriter {
    ctx: Arc<NameContext>,
    dirs: OutputDirs,
    renderer: Box<dyn TemplateRenderer>,
    cancel: CancelFlag,
}

impl FragmentWriter {
    pub fn new(ctx: Arc<NameContext>, dirs: OutputDirs) -> Self {
        Self {
            ctx,
            dirs,
            renderer: Box::new(SimpleTemplate::default()),
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Write all fragments for one tool. The skeleton is written last.
    pub fn write_tool(&self, tool: &ToolDescriptor) -> Result<ResolvedName, ComposeError> {
        let name = ResolvedName::resolve(Some(&tool.command), &self.ctx);
        let skeleton = render_skeleton(tool, &self.ctx, self.renderer.as_ref())?;

        write_file(
            &self.dirs.parameters.join(name.file_name(FragmentKind::Parameter)),
            &render_parameters(tool)?,
        )?;
        write_file(
            &self.dirs.annotations.join(name.file_name(FragmentKind::Annotation)),
            &render_annotations(tool)?,
        )?;
        write_file(&self.dirs.raw.join(name.file_name(FragmentKind::Raw)), &skeleton)?;

        debug!(tool = %tool.command, base = %name.base_slug(), "Wrote fragments");
        Ok(name)
    }

    /// Write fragments for the whole tool list.
    ///
    /// Directory creation failures abort the stage; per-tool failures are
    /// recorded and the batch continues.
    pub fn write_all(&self, tools: &ToolList) -> Result<BatchReport, ComposeError> {
        ensure_dir(&self.dirs.parameters)?;
        ensure_dir(&self.dirs.annotations)?;
        ensure_dir(&self.dirs.raw)?;

        let mut report = BatchReport::new("fragments");
        let mut claims = SlugClaims::default();

        for tool in &tools.tools {
            if self.cancel.is_cancelled() {
                warn!("Cancellation requested, stopping fragment stage");
                report.cancelled = true;
                break;
            }

            let command = tool.command.trim();
            if command.is_empty() {
                report.skip("<blank command>", "tool has no command");
                continue;
            }

            let base = toolscribe_naming::resolve_base(command, &self.ctx);
            if let Err(owner) = claims.claim(&base, command) {
                warn!(tool = %command, base = %base, owner = %owner, "File name collision, skipping");
                report.skip(command, format!("file name '{base}' already used by '{owner}'"));
                continue;
            }

            match self.write_tool(tool) {
                Ok(_) => report.succeed(command),
                Err(e) => {
                    error!(tool = %command, error = %e, "Failed to write fragments");
                    report.fail(command, e);
                }
            }
        }

        report.finish();
        info!("{}", report.summary_line());
        Ok(report)
    }
}

pub(crate) fn write_file(path: &Path, content: &str) -> Result<(), ComposeError> {
    std::fs::write(path, content).map_err(|e| ComposeError::write(path, e))
}
