//! Tool descriptors — the ingested CLI tool list.
//!
//! The source CLI emits one descriptor per command. Descriptors are
//! read once at the start of a run and never mutated afterwards.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use crate::error::{Error, Result};

/// One CLI tool as emitted by the source tool list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Space-separated command, first token is the area (e.g. "storage account list")
    pub command: String,

    /// What the tool does
    #[serde(default)]
    pub description: String,

    /// Accepted parameters
    #[serde(default, alias = "options")]
    pub parameters: Vec<ToolParameter>,

    /// Named boolean flags (destructive, idempotent, read-only, ...)
    #[serde(default)]
    pub metadata: BTreeMap<String, MetadataFlag>,
}

impl ToolDescriptor {
    /// The command split on whitespace, repeated separators collapsed.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.command.split_whitespace()
    }

    /// The first command token, if any.
    pub fn area(&self) -> Option<&str> {
        self.tokens().next()
    }
}

/// A single tool parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,

    #[serde(rename = "type", default = "default_param_type")]
    pub param_type: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub description: String,
}

fn default_param_type() -> String {
    "string".into()
}

/// A metadata flag. Accepts either a bare boolean or `{ "value": bool, "description": "..." }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataFlag {
    pub value: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl<'de> Deserialize<'de> for MetadataFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bare(bool),
            Full {
                value: bool,
                #[serde(default)]
                description: Option<String>,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Bare(value) => MetadataFlag {
                value,
                description: None,
            },
            Raw::Full { value, description } => MetadataFlag { value, description },
        })
    }
}

/// The full tool list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolList {
    pub tools: Vec<ToolDescriptor>,
}

impl ToolList {
    /// Parse a tool list document.
    ///
    /// The document is either a top-level array of tools, or an object
    /// carrying that array under `results` or `tools`.
    pub fn from_json(json: &str) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Document {
            Bare(Vec<ToolDescriptor>),
            Results { results: Vec<ToolDescriptor> },
            Tools { tools: Vec<ToolDescriptor> },
        }

        let tools = match serde_json::from_str::<Document>(json)? {
            Document::Bare(tools) => tools,
            Document::Results { results } => results,
            Document::Tools { tools } => tools,
        };
        Ok(Self { tools })
    }

    /// Read and parse a tool list file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("Failed to read tool list {}: {e}", path.display()),
        })?;
        let list = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), tools = list.tools.len(), "Loaded tool list");
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
