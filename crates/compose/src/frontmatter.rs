//! YAML front-matter handling for fragment files.

use serde::Serialize;
use toolscribe_naming::FragmentKind;

use crate::error::ComposeError;

/// Remove a leading `---` delimited front-matter block.
///
/// Content without an opening `---` line, or with an unterminated block,
/// is returned unchanged. Blank lines directly after the block are dropped.
pub fn strip_front_matter(content: &str) -> &str {
    let content_start = content.strip_prefix('\u{feff}').unwrap_or(content);

    let Some(rest) = content_start.strip_prefix("---") else {
        return content;
    };
    let rest = if let Some(r) = rest.strip_prefix('\n') {
        r
    } else if let Some(r) = rest.strip_prefix("\r\n") {
        r
    } else {
        return content;
    };

    // An empty block closes on the very next line.
    let after = if let Some(r) = rest.strip_prefix("---") {
        r
    } else {
        let Some(end) = rest.find("\n---") else {
            return content;
        };
        &rest[end + 4..]
    };

    // The closing delimiter must be a whole line.
    let after = match after.find('\n') {
        Some(nl) if after[..nl].trim().is_empty() => &after[nl + 1..],
        None if after.trim().is_empty() => "",
        _ => return content,
    };

    after.trim_start_matches(['\r', '\n'])
}

/// Front matter written at the top of every generated fragment.
#[derive(Debug, Clone, Serialize)]
pub struct FragmentFrontMatter {
    pub tool: String,
    pub fragment: FragmentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl FragmentFrontMatter {
    pub fn new(tool: impl Into<String>, fragment: FragmentKind) -> Self {
        Self {
            tool: tool.into(),
            fragment,
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Render a `---` delimited front-matter block.
pub fn render_front_matter(front: &FragmentFrontMatter) -> Result<String, ComposeError> {
    let yaml = serde_yaml::to_string(front)?;
    Ok(format!("---\n{yaml}---\n"))
}
