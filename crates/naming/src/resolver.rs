//! Command → file name resolution.
//!
//! The algorithm is exact and deterministic: no fuzzy matching, no
//! directory scans. Identical command + identical [`NameContext`] always
//! produce an identical name.
//!
//! ```text
//! "aks nodepool get"
//!   area "aks"        → brand slug   "azure-kubernetes-service"
//!   "nodepool"        → compound     "node-pool"
//!   "get"             → lowercase    "get"
//!   base slug         = "azure-kubernetes-service-node-pool-get"
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::context::NameContext;

/// Base slug returned for blank commands.
pub const UNKNOWN_SLUG: &str = "unknown";

const AZURE_PREFIX: &str = "azure-";

/// The kinds of file each stage writes for a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FragmentKind {
    Annotation,
    Parameter,
    ExamplePrompt,
    Tool,
    Raw,
    InputPrompt,
    RawOutput,
}

impl FragmentKind {
    pub const ALL: [FragmentKind; 7] = [
        FragmentKind::Annotation,
        FragmentKind::Parameter,
        FragmentKind::ExamplePrompt,
        FragmentKind::Tool,
        FragmentKind::Raw,
        FragmentKind::InputPrompt,
        FragmentKind::RawOutput,
    ];

    /// File-name suffix appended to the base slug.
    ///
    /// Raw skeletons share the tool suffix; they live in their own directory.
    pub fn suffix(self) -> &'static str {
        match self {
            FragmentKind::Annotation => "-annotations.md",
            FragmentKind::Parameter => "-parameters.md",
            FragmentKind::ExamplePrompt => "-example-prompts.md",
            FragmentKind::Tool | FragmentKind::Raw => ".md",
            FragmentKind::InputPrompt => "-input-prompt.md",
            FragmentKind::RawOutput => "-raw-output.txt",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FragmentKind::Annotation => "annotation",
            FragmentKind::Parameter => "parameter",
            FragmentKind::ExamplePrompt => "example-prompt",
            FragmentKind::Tool => "tool",
            FragmentKind::Raw => "raw",
            FragmentKind::InputPrompt => "input-prompt",
            FragmentKind::RawOutput => "raw-output",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FragmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FragmentKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<_> = FragmentKind::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown fragment kind '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

/// Which lookup level produced the area prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixSource {
    /// Brand map file slug
    Brand,
    /// Compound-word expansion of the area
    Compound,
    /// The lowercased area itself
    Literal,
    /// Blank command, resolved to [`UNKNOWN_SLUG`]
    Unknown,
}

impl fmt::Display for PrefixSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrefixSource::Brand => "brand",
            PrefixSource::Compound => "compound",
            PrefixSource::Literal => "literal",
            PrefixSource::Unknown => "unknown",
        })
    }
}

/// A resolved base slug plus the lookup level that produced its prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    base: String,
    prefix_source: PrefixSource,
}

impl ResolvedName {
    /// Resolve a possibly-absent command.
    pub fn resolve(command: Option<&str>, ctx: &NameContext) -> Self {
        let mut tokens = command.unwrap_or_default().split_whitespace();

        let Some(area) = tokens.next() else {
            return Self {
                base: UNKNOWN_SLUG.to_string(),
                prefix_source: PrefixSource::Unknown,
            };
        };

        let (prefix, prefix_source) = resolve_prefix(area, ctx);

        let mut parts = vec![prefix];
        for token in tokens {
            let lowered = token.to_lowercase();
            if ctx.is_stop_word(&lowered) {
                continue;
            }
            let expanded = ctx.compound(&lowered).map(str::to_string).unwrap_or(lowered);
            if ctx.is_stop_word(&expanded) {
                continue;
            }
            parts.push(expanded);
        }

        Self {
            base: parts.join("-"),
            prefix_source,
        }
    }

    pub fn base_slug(&self) -> &str {
        &self.base
    }

    pub fn prefix_source(&self) -> PrefixSource {
        self.prefix_source
    }

    pub fn file_name(&self, kind: FragmentKind) -> String {
        format!("{}{}", self.base, kind.suffix())
    }
}

/// Brand slug → compound expansion → lowercased literal, never double-prefixed.
fn resolve_prefix(area: &str, ctx: &NameContext) -> (String, PrefixSource) {
    if let Some(brand) = ctx.brand(area) {
        if !brand.file_slug.is_empty() {
            return (brand.file_slug.clone(), PrefixSource::Brand);
        }
    }

    let (candidate, source) = match ctx.compound(area) {
        Some(expansion) => (expansion.to_string(), PrefixSource::Compound),
        None => (area.to_lowercase(), PrefixSource::Literal),
    };

    if candidate.starts_with(AZURE_PREFIX) {
        (candidate, source)
    } else {
        (format!("{AZURE_PREFIX}{candidate}"), source)
    }
}

/// Recover the area a base slug was resolved from.
///
/// Only areas named in the brand map or compound-word table can be
/// recovered; the longest matching prefix wins. Literal areas return `None`.
pub fn area_for_base(base: &str, ctx: &NameContext) -> Option<String> {
    ctx.brand_areas()
        .chain(ctx.compound_tokens())
        .filter_map(|area| {
            let (prefix, _) = resolve_prefix(area, ctx);
            let matches = base == prefix
                || base
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('-'));
            matches.then_some((prefix.len(), area))
        })
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(a.1)))
        .map(|(_, area)| area.to_string())
}

/// Resolve a command to its canonical base slug. Never fails; blank
/// commands resolve to [`UNKNOWN_SLUG`].
pub fn resolve_base(command: &str, ctx: &NameContext) -> String {
    ResolvedName::resolve(Some(command), ctx).base
}

/// Resolve a command to the file name a given stage uses for it.
pub fn resolve_file_name(command: &str, ctx: &NameContext, kind: FragmentKind) -> String {
    ResolvedName::resolve(Some(command), ctx).file_name(kind)
}
