//! Raw tool skeletons: command marker, placeholders and the template seam.
//!
//! A skeleton is the per-tool document before composition. It embeds the
//! originating command in an HTML comment so later stages never have to
//! reverse-engineer it from the file name:
//!
//! ```text
//! <!-- @command storage account list -->
//!
//! ## Account list
//! ...
//! {{PARAMETERS_CONTENT}}
//! ```

use std::collections::BTreeMap;
use toolscribe_core::ToolDescriptor;
use toolscribe_naming::NameContext;
use crate::error::ComposeError;

pub const COMMAND_MARKER_OPEN: &str = "<!-- @command";
pub const COMMAND_MARKER_CLOSE: &str = "-->";

pub const EXAMPLE_PROMPTS_PLACEHOLDER: &str = "{{EXAMPLE_PROMPTS_CONTENT}}";
pub const PARAMETERS_PLACEHOLDER: &str = "{{PARAMETERS_CONTENT}}";
pub const ANNOTATIONS_PLACEHOLDER: &str = "{{ANNOTATIONS_CONTENT}}";

/// Default per-tool skeleton. `{{marker}}` is filled by [`command_marker`].
pub const DEFAULT_TOOL_TEMPLATE: &str = "{{marker}}

## {{heading}}

{{description}}

### Example prompts

{{EXAMPLE_PROMPTS_CONTENT}}

### Parameters

{{PARAMETERS_CONTENT}}

### Annotations

{{ANNOTATIONS_CONTENT}}
";

/// Format the marker comment for a command.
pub fn command_marker(command: &str) -> String {
    format!("{COMMAND_MARKER_OPEN} {} {COMMAND_MARKER_CLOSE}", command.trim())
}

/// Find the command recorded in a document's marker comment.
///
/// Returns `None` when no marker exists or the marker is empty.
pub fn extract_command(content: &str) -> Option<String> {
    let start = content.find(COMMAND_MARKER_OPEN)? + COMMAND_MARKER_OPEN.len();
    let rest = &content[start..];
    let end = rest.find(COMMAND_MARKER_CLOSE)?;
    let command = rest[..end].split_whitespace().collect::<Vec<_>>().join(" ");
    (!command.is_empty()).then_some(command)
}

/// Renders a template from a key/value map.
///
/// The skeleton stage only depends on this contract; the engine behind it
/// is replaceable.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, values: &BTreeMap<String, String>) -> Result<String, ComposeError>;
}

/// Minimal `{{key}}` substitution.
///
/// Only keys present in the map are replaced, so the composition
/// placeholders survive rendering untouched.
#[derive(Debug, Clone)]
pub struct SimpleTemplate {
    template: String,
}

impl SimpleTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Load a template file.
    pub fn load(path: &std::path::Path) -> Result<Self, ComposeError> {
        std::fs::read_to_string(path)
            .map(Self::new)
            .map_err(|e| ComposeError::read(path, e))
    }
}

impl Default for SimpleTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL_TEMPLATE)
    }
}

impl TemplateRenderer for SimpleTemplate {
    fn render(&self, values: &BTreeMap<String, String>) -> Result<String, ComposeError> {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find("{{") {
            out.push_str(&rest[..open]);
            let after_open = &rest[open + 2..];
            let Some(close) = after_open.find("}}") else {
                return Err(ComposeError::Template(format!(
                    "unclosed '{{{{' near: {}",
                    after_open.chars().take(40).collect::<String>()
                )));
            };
            let key = after_open[..close].trim();
            match values.get(key) {
                Some(value) => out.push_str(value),
                None => out.push_str(&rest[open..open + 2 + close + 2]),
            }
            rest = &after_open[close + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// Heading for a tool: the tokens after the area, compound-expanded,
/// sentence-cased. A single-token command uses the area's display name.
pub fn tool_heading(command: &str, ctx: &NameContext) -> String {
    let mut tokens = command.split_whitespace();
    let Some(area) = tokens.next() else {
        return String::new();
    };

    let words: Vec<String> = tokens
        .map(|t| {
            let lowered = t.to_lowercase();
            ctx.compound(&lowered)
                .map(str::to_string)
                .unwrap_or(lowered)
                .replace('-', " ")
        })
        .collect();

    if words.is_empty() {
        return ctx.display_name(area);
    }

    let joined = words.join(" ");
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => joined,
    }
}

/// Render the raw skeleton for one tool.
pub fn render_skeleton(
    tool: &ToolDescriptor,
    ctx: &NameContext,
    renderer: &dyn TemplateRenderer,
) -> Result<String, ComposeError> {
    let command = tool.tokens().collect::<Vec<_>>().join(" ");
    let area = tool.area().unwrap_or_default();

    let mut values = BTreeMap::new();
    values.insert("heading".to_string(), tool_heading(&command, ctx));
    values.insert("area".to_string(), area.to_string());
    values.insert("service".to_string(), ctx.display_name(area));
    values.insert("description".to_string(), tool.description.trim().to_string());
    values.insert("marker".to_string(), command_marker(&command));
    values.insert("command".to_string(), command);

    renderer.render(&values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(command: &str, description: &str) -> ToolDescriptor {
        ToolDescriptor {
            command: command.into(),
            description: description.into(),
            parameters: vec![],
            metadata: Default::default(),
        }
    }

    #[test]
    fn marker_round_trips() {
        let marker = command_marker("  aks   nodepool get ");
        assert_eq!(marker, "<!-- @command aks   nodepool get -->");
        assert_eq!(extract_command(&marker).as_deref(), Some("aks nodepool get"));
    }

    #[test]
    fn extract_finds_marker_anywhere() {
        let doc = "---\ntitle: x\n---\n\n<!-- @command storage list -->\n## List\n";
        assert_eq!(extract_command(doc).as_deref(), Some("storage list"));
    }

    #[test]
    fn extract_missing_or_empty_marker() {
        assert_eq!(extract_command("## No marker here"), None);
        assert_eq!(extract_command("<!-- @command   -->"), None);
        assert_eq!(extract_command("<!-- @command storage list"), None);
    }

    #[test]
    fn simple_template_replaces_known_keys_only() {
        let template = SimpleTemplate::new("A={{a}} B={{ b }} P={{PARAMETERS_CONTENT}}");
        let mut values = BTreeMap::new();
        values.insert("a".to_string(), "1".to_string());
        values.insert("b".to_string(), "2".to_string());
        assert_eq!(
            template.render(&values).unwrap(),
            "A=1 B=2 P={{PARAMETERS_CONTENT}}"
        );
    }

    #[test]
    fn simple_template_rejects_unclosed_braces() {
        let template = SimpleTemplate::new("Hello {{name");
        assert!(matches!(
            template.render(&BTreeMap::new()),
            Err(ComposeError::Template(_))
        ));
    }

    #[test]
    fn heading_uses_compound_words() {
        let ctx = NameContext::new().with_compound("nodepool", "node-pool");
        assert_eq!(tool_heading("aks nodepool get", &ctx), "Node pool get");
        assert_eq!(tool_heading("storage account list", &ctx), "Account list");
    }

    #[test]
    fn heading_for_area_only_command() {
        let ctx = NameContext::new().with_brand("kv", "Azure Key Vault", "azure-key-vault");
        assert_eq!(tool_heading("kv", &ctx), "Azure Key Vault");
        assert_eq!(tool_heading("", &ctx), "");
    }

    #[test]
    fn skeleton_keeps_placeholders() {
        let ctx = NameContext::new();
        let out = render_skeleton(
            &tool("storage   account list", "Lists storage accounts."),
            &ctx,
            &SimpleTemplate::default(),
        )
        .unwrap();

        assert!(out.starts_with(&command_marker("storage account list")));
        assert!(out.contains("## Account list"));
        assert!(out.contains("Lists storage accounts."));
        assert!(out.contains(EXAMPLE_PROMPTS_PLACEHOLDER));
        assert!(out.contains(PARAMETERS_PLACEHOLDER));
        assert!(out.contains(ANNOTATIONS_PLACEHOLDER));
        assert_eq!(extract_command(&out).as_deref(), Some("storage account list"));
    }

    #[test]
    fn custom_template_gets_the_same_marker() {
        let ctx = NameContext::new();
        let template = SimpleTemplate::new("{{marker}}\n# {{service}}: {{heading}}\n");
        let out = render_skeleton(&tool("sql db list", "Lists databases."), &ctx, &template).unwrap();
        assert_eq!(out, format!("{}\n# Sql: Db list\n", command_marker("sql db list")));
    }
}
