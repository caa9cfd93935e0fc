//! Name-resolution lookup tables.
//!
//! A [`NameContext`] is built once at process start and then only read.
//! It is passed by reference (or shared through an `Arc`) to every stage
//! that needs to compute a file name.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use toolscribe_config::NamingConfig;
use tracing::{debug, warn};

/// Brand information for one command area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandEntry {
    /// Product name used in headings (e.g. "Azure Kubernetes Service")
    pub display_name: String,
    /// File-name prefix (e.g. "azure-kubernetes-service")
    pub file_slug: String,
}

/// The three lookup tables consulted by the resolver.
#[derive(Debug, Clone, Default)]
pub struct NameContext {
    brands: HashMap<String, BrandEntry>,
    compound_words: HashMap<String, String>,
    stop_words: HashSet<String>,
}

/// One row of the brand map file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrandRow {
    #[serde(alias = "mcpServerName")]
    area: String,
    #[serde(default, alias = "brandName")]
    display_name: String,
    #[serde(default, alias = "fileName")]
    file_slug: String,
}

impl NameContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a brand mapping for an area.
    pub fn with_brand(
        mut self,
        area: impl Into<String>,
        display_name: impl Into<String>,
        file_slug: impl Into<String>,
    ) -> Self {
        self.brands.insert(
            area.into(),
            BrandEntry {
                display_name: display_name.into(),
                file_slug: file_slug.into(),
            },
        );
        self
    }

    /// Register a compound word expansion (e.g. "nodepool" → "node-pool").
    pub fn with_compound(mut self, token: impl Into<String>, expansion: impl Into<String>) -> Self {
        self.compound_words.insert(token.into(), expansion.into());
        self
    }

    pub fn with_stop_word(mut self, word: impl Into<String>) -> Self {
        self.stop_words.insert(word.into());
        self
    }

    /// Exact, case-sensitive brand lookup.
    pub fn brand(&self, area: &str) -> Option<&BrandEntry> {
        self.brands.get(area)
    }

    /// Exact, case-sensitive compound-word lookup.
    pub fn compound(&self, token: &str) -> Option<&str> {
        self.compound_words.get(token).map(String::as_str)
    }

    /// Areas with a brand entry.
    pub fn brand_areas(&self) -> impl Iterator<Item = &str> {
        self.brands.keys().map(String::as_str)
    }

    /// Tokens with a compound-word expansion.
    pub fn compound_tokens(&self) -> impl Iterator<Item = &str> {
        self.compound_words.keys().map(String::as_str)
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Human-readable name for an area: the brand display name when one is
    /// mapped, otherwise the area itself with its first letter capitalised.
    pub fn display_name(&self, area: &str) -> String {
        match self.brand(area) {
            Some(entry) if !entry.display_name.trim().is_empty() => entry.display_name.clone(),
            _ => {
                let mut chars = area.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }

    /// Load all three tables from the configured files.
    ///
    /// Any missing or malformed table is an error: every later file name
    /// depends on these tables, so a run must not start without them.
    pub fn load(config: &NamingConfig) -> Result<Self, NamingError> {
        let mut ctx = Self::new();

        let rows: Vec<BrandRow> = read_json(&config.brand_map)?;
        for row in rows {
            if ctx.brands.contains_key(&row.area) {
                warn!(area = %row.area, "Duplicate brand mapping, keeping the first entry");
                continue;
            }
            ctx.brands.insert(
                row.area,
                BrandEntry {
                    display_name: row.display_name,
                    file_slug: row.file_slug,
                },
            );
        }

        ctx.compound_words = read_json(&config.compound_words)?;
        ctx.stop_words = read_json::<Vec<String>>(&config.stop_words)?
            .into_iter()
            .collect();

        debug!(
            brands = ctx.brands.len(),
            compound_words = ctx.compound_words.len(),
            stop_words = ctx.stop_words.len(),
            "Loaded name context"
        );
        Ok(ctx)
    }

    pub fn brand_count(&self) -> usize {
        self.brands.len()
    }

    pub fn compound_count(&self) -> usize {
        self.compound_words.len()
    }

    pub fn stop_word_count(&self) -> usize {
        self.stop_words.len()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, NamingError> {
    let content = std::fs::read_to_string(path).map_err(|e| NamingError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| NamingError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Lookup-table load errors. Always fatal for a run.
#[derive(Debug, thiserror::Error)]
pub enum NamingError {
    #[error("Failed to read lookup table {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse lookup table {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tables(dir: &Path, brands: &str, compounds: &str, stops: &str) -> NamingConfig {
        let config = NamingConfig {
            brand_map: dir.join("brand-map.json"),
            compound_words: dir.join("compound-words.json"),
            stop_words: dir.join("stop-words.json"),
        };
        std::fs::write(&config.brand_map, brands).unwrap();
        std::fs::write(&config.compound_words, compounds).unwrap();
        std::fs::write(&config.stop_words, stops).unwrap();
        config
    }

    #[test]
    fn loads_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_tables(
            dir.path(),
            r#"[{ "area": "aks", "displayName": "Azure Kubernetes Service", "fileSlug": "azure-kubernetes-service" }]"#,
            r#"{ "nodepool": "node-pool" }"#,
            r#"["the", "and"]"#,
        );

        let ctx = NameContext::load(&config).unwrap();
        assert_eq!(ctx.brand("aks").unwrap().file_slug, "azure-kubernetes-service");
        assert_eq!(ctx.compound("nodepool"), Some("node-pool"));
        assert!(ctx.is_stop_word("the"));
        assert_eq!(ctx.stop_word_count(), 2);
    }

    #[test]
    fn accepts_server_mapping_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_tables(
            dir.path(),
            r#"[{ "mcpServerName": "kv", "brandName": "Azure Key Vault", "fileName": "azure-key-vault" }]"#,
            "{}",
            "[]",
        );
        let ctx = NameContext::load(&config).unwrap();
        assert_eq!(ctx.display_name("kv"), "Azure Key Vault");
        assert_eq!(ctx.brand("kv").unwrap().file_slug, "azure-key-vault");
    }

    #[test]
    fn duplicate_brand_keeps_first() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_tables(
            dir.path(),
            r#"[
                { "area": "sql", "displayName": "Azure SQL", "fileSlug": "azure-sql" },
                { "area": "sql", "displayName": "Other", "fileSlug": "other" }
            ]"#,
            "{}",
            "[]",
        );
        let ctx = NameContext::load(&config).unwrap();
        assert_eq!(ctx.brand("sql").unwrap().file_slug, "azure-sql");
        assert_eq!(ctx.brand_count(), 1);
    }

    #[test]
    fn missing_table_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = NamingConfig {
            brand_map: dir.path().join("absent.json"),
            compound_words: dir.path().join("absent.json"),
            stop_words: dir.path().join("absent.json"),
        };
        assert!(matches!(
            NameContext::load(&config),
            Err(NamingError::Read { .. })
        ));
    }

    #[test]
    fn malformed_table_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_tables(dir.path(), "[]", "[1, 2]", "[]");
        assert!(matches!(
            NameContext::load(&config),
            Err(NamingError::Parse { .. })
        ));
    }

    #[test]
    fn display_name_falls_back_to_capitalised_area() {
        let ctx = NameContext::new();
        assert_eq!(ctx.display_name("storage"), "Storage");
        assert_eq!(ctx.display_name(""), "");
    }
}
