//! Structured field extraction from composed tool files.
//!
//! Every extractor returns an [`Extraction`]: either the value or the
//! reason it could not be found. Nothing here panics on odd input.

use regex_lite::Regex;
use std::sync::LazyLock;
use toolscribe_compose::{extract_command, strip_front_matter};
use toolscribe_naming::{NameContext, area_for_base};

static TOOL_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^##[ \t]+([^\r\n]*?)[ \t]*\r?$").expect("tool heading pattern is valid")
});

/// The outcome of extracting one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction<T> {
    Found(T),
    NotFound(String),
}

impl<T> Extraction<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Extraction::Found(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Extraction::Found(value) => Some(value),
            Extraction::NotFound(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Extraction<U> {
        match self {
            Extraction::Found(value) => Extraction::Found(f(value)),
            Extraction::NotFound(reason) => Extraction::NotFound(reason),
        }
    }
}

/// One tool as it appears inside a family document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContent {
    pub file_name: String,
    /// Command from the marker, when present
    pub command: Option<String>,
    /// The tool's H2 heading (falls back to the command, then the file stem)
    pub display_name: String,
    pub description: String,
    pub family_key: String,
    /// The rendered section, front matter removed
    pub section: String,
}

impl ToolContent {
    pub fn word_count(&self) -> usize {
        self.section.split_whitespace().count()
    }
}

/// The command recorded in the marker comment.
pub fn extract_marker_command(content: &str) -> Extraction<String> {
    match extract_command(content) {
        Some(command) => Extraction::Found(command),
        None => Extraction::NotFound("no command marker".into()),
    }
}

/// The first H2 heading.
pub fn extract_heading(content: &str) -> Extraction<String> {
    TOOL_HEADING
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|h| !h.is_empty())
        .map_or_else(
            || Extraction::NotFound("no '## ' heading".into()),
            Extraction::Found,
        )
}

/// Replace the first H2 heading's text. Content without one is returned unchanged.
pub fn replace_heading(content: &str, heading: &str) -> String {
    match TOOL_HEADING.captures(content).and_then(|caps| caps.get(1)) {
        Some(m) => format!("{}{}{}", &content[..m.start()], heading.trim(), &content[m.end()..]),
        None => content.to_string(),
    }
}

/// The first prose paragraph after the H2 heading.
pub fn extract_description(content: &str) -> Extraction<String> {
    let body = match TOOL_HEADING.find(content) {
        Some(m) => &content[m.end()..],
        None => content,
    };

    let mut paragraph = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            if paragraph.is_empty() {
                continue;
            }
            break;
        }
        if paragraph.is_empty() && (line.starts_with('#') || line.starts_with("<!--")) {
            if line.starts_with('#') {
                break;
            }
            continue;
        }
        paragraph.push(line);
    }

    if paragraph.is_empty() {
        Extraction::NotFound("no description paragraph".into())
    } else {
        Extraction::Found(paragraph.join(" "))
    }
}

/// Family key from a file name.
///
/// A stem that starts with a mapped area's prefix yields that area, so a file
/// without a marker lands in the same family as its marked siblings.
/// Otherwise drop the `azure-` prefix and keep the first segment.
pub fn family_key_from_file_name(file_name: &str, ctx: &NameContext) -> Extraction<String> {
    let stem = file_name.strip_suffix(".md").unwrap_or(file_name);
    if let Some(area) = area_for_base(stem, ctx) {
        return Extraction::Found(area);
    }
    let stem = stem.strip_prefix("azure-").unwrap_or(stem);
    match stem.split('-').next().filter(|s| !s.is_empty()) {
        Some(key) => Extraction::Found(key.to_lowercase()),
        None => Extraction::NotFound(format!("cannot derive a family from '{file_name}'")),
    }
}

/// Parse one composed tool file.
///
/// The family key comes from the marker's area, or failing that the file
/// name. Only a blank document or an underivable family key is `NotFound`.
pub fn parse_tool(file_name: &str, content: &str, ctx: &NameContext) -> Extraction<ToolContent> {
    let section = strip_front_matter(content).trim().to_string();
    if section.is_empty() {
        return Extraction::NotFound("empty document".into());
    }

    let command = extract_marker_command(&section).ok();

    let family_key = match command
        .as_deref()
        .and_then(|c| c.split_whitespace().next())
    {
        Some(area) => area.to_string(),
        None => match family_key_from_file_name(file_name, ctx) {
            Extraction::Found(key) => key,
            Extraction::NotFound(reason) => return Extraction::NotFound(reason),
        },
    };

    let display_name = match extract_heading(&section) {
        Extraction::Found(heading) => heading,
        Extraction::NotFound(_) => command.clone().unwrap_or_else(|| {
            file_name
                .strip_suffix(".md")
                .unwrap_or(file_name)
                .to_string()
        }),
    };

    let description = extract_description(&section).ok().unwrap_or_default();

    Extraction::Found(ToolContent {
        file_name: file_name.to_string(),
        command,
        display_name,
        description,
        family_key,
        section,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(file_name: &str, content: &str) -> Extraction<ToolContent> {
        parse_tool(file_name, content, &NameContext::new())
    }

    const DOC: &str = "<!-- @command storage account list -->

## Account list

Lists storage accounts
in a subscription.

### Parameters

| Parameter |
";

    #[test]
    fn parses_full_document() {
        let tool = parse("azure-storage-account-list.md", DOC).ok().unwrap();
        assert_eq!(tool.command.as_deref(), Some("storage account list"));
        assert_eq!(tool.family_key, "storage");
        assert_eq!(tool.display_name, "Account list");
        assert_eq!(tool.description, "Lists storage accounts in a subscription.");
        assert!(tool.section.starts_with("<!-- @command"));
    }

    #[test]
    fn family_key_is_case_sensitive_area_from_marker() {
        let doc = "<!-- @command aks nodepool get -->\n## Node pool get\n";
        let tool = parse("azure-kubernetes-service-node-pool-get.md", doc)
            .ok()
            .unwrap();
        assert_eq!(tool.family_key, "aks");
    }

    #[test]
    fn falls_back_to_file_name_for_family() {
        let tool = parse("azure-keyvault-secret-get.md", "## Secret get\n\nGets a secret.")
            .ok()
            .unwrap();
        assert_eq!(tool.family_key, "keyvault");
        assert_eq!(tool.command, None);
    }

    #[test]
    fn file_name_fallback_maps_back_to_brand_area() {
        let ctx = NameContext::new()
            .with_brand("aks", "Azure Kubernetes Service", "azure-kubernetes-service");
        let tool = parse_tool("azure-kubernetes-service-node-pool-get.md", "## Node pool get\n", &ctx)
            .ok()
            .unwrap();
        assert_eq!(tool.family_key, "aks");
        assert_eq!(
            family_key_from_file_name("azure-storage-list.md", &ctx),
            Extraction::Found("storage".into())
        );
    }

    #[test]
    fn display_name_falls_back() {
        let tool = parse("x.md", "<!-- @command sql db list -->\nNo heading").ok().unwrap();
        assert_eq!(tool.display_name, "sql db list");

        let tool = parse("azure-sql-db.md", "Just text").ok().unwrap();
        assert_eq!(tool.display_name, "azure-sql-db");
    }

    #[test]
    fn front_matter_is_removed_from_section() {
        let doc = format!("---\ntitle: x\n---\n{DOC}");
        let tool = parse("a.md", &doc).ok().unwrap();
        assert!(!tool.section.contains("title: x"));
    }

    #[test]
    fn blank_document_is_not_found() {
        assert!(!parse("a.md", "  \n ").is_found());
        assert!(matches!(
            parse(".md", "text without marker"),
            Extraction::NotFound(_)
        ));
    }

    #[test]
    fn heading_extraction_and_replacement() {
        assert_eq!(extract_heading(DOC), Extraction::Found("Account list".into()));
        assert!(!extract_heading("### Not an H2").is_found());
        let replaced = replace_heading(DOC, "List storage accounts");
        assert!(replaced.contains("## List storage accounts\n"));
        assert!(!replaced.contains("## Account list"));
        assert_eq!(replace_heading("plain", "X"), "plain");
    }

    #[test]
    fn description_stops_at_next_heading() {
        assert!(!extract_description("## Title\n\n### Parameters\n").is_found());
    }

    #[test]
    fn extraction_map() {
        let found: Extraction<&str> = Extraction::Found("a");
        assert_eq!(found.map(str::len), Extraction::Found(1));
        let missing: Extraction<&str> = Extraction::NotFound("why".into());
        assert_eq!(missing.map(str::len), Extraction::NotFound("why".into()));
    }
}
