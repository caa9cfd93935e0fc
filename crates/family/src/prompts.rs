//! Prompt text for the family generation steps.

use std::fmt::Write as _;
use crate::grouper::FamilyGroup;
use crate::parser::ToolContent;

pub const METADATA_SYSTEM_PROMPT: &str = "You write the opening of a documentation page for a group of CLI tools. \
Output, in order: a YAML front-matter block delimited by '---' lines with 'title' and 'description' keys, \
one '# ' heading naming the service, and one or two short introductory paragraphs. \
Do not describe individual tools and do not add any other headings.";

pub const RELATED_CONTENT_SYSTEM_PROMPT: &str = "You write the closing section of a documentation page for a group of CLI tools. \
Output a '## Related content' heading followed by a short markdown bullet list of related topics. \
Do not repeat tool descriptions.";

pub const HEADING_SYSTEM_PROMPT: &str = "You write short, sentence-case headings for CLI tool documentation. \
Output only the heading text: no '#' characters, no quotes, no trailing punctuation.";

fn tool_list(out: &mut String, tools: &[ToolContent]) {
    for tool in tools {
        let command = tool.command.as_deref().unwrap_or(&tool.display_name);
        if tool.description.is_empty() {
            let _ = writeln!(out, "- {command}");
        } else {
            let _ = writeln!(out, "- {command}: {}", tool.description);
        }
    }
}

pub fn metadata_prompt(family: &FamilyGroup) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Service: {}", family.display_name);
    let _ = writeln!(out, "Command area: {}", family.family_key);
    let _ = writeln!(out, "Tool count: {}", family.tool_count());
    let _ = writeln!(out, "\nTools:");
    tool_list(&mut out, &family.tools);
    out
}

pub fn related_content_prompt(family: &FamilyGroup) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Service: {}", family.display_name);
    let _ = writeln!(out, "\nThe page documents these tools:");
    tool_list(&mut out, &family.tools);
    out
}

pub fn heading_prompt(service: &str, tool: &ToolContent) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Service: {service}");
    if let Some(command) = &tool.command {
        let _ = writeln!(out, "Command: {command}");
    }
    let _ = writeln!(out, "Current heading: {}", tool.display_name);
    if !tool.description.is_empty() {
        let _ = writeln!(out, "Description: {}", tool.description);
    }
    out
}
