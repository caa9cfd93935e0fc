//! Configuration loading, validation, and management for toolscribe.
//!
//! Loads configuration from `./toolscribe.toml`, falling back to
//! `~/.toolscribe/config.toml`, with environment variable overrides.
//! Validates all settings at startup; a bad configuration aborts the run
//! before any tool is processed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "toolscribe.toml";

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default text-generation provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model (or Azure deployment name)
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Input and output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Name-resolution lookup tables
    #[serde(default)]
    pub naming: NamingConfig,

    /// Output-token budget constants
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Rate-limit retry schedule
    #[serde(default)]
    pub retry: RetryConfig,

    /// Family assembly settings
    #[serde(default)]
    pub assembly: AssemblyConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.3
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("providers", &self.providers)
            .field("paths", &self.paths)
            .field("naming", &self.naming)
            .field("budget", &self.budget)
            .field("retry", &self.retry)
            .field("assembly", &self.assembly)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .field("api_version", &self.api_version)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    /// Azure OpenAI `api-version` query parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// Where every stage reads from and writes to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// The JSON tool list emitted by the source CLI
    #[serde(default = "default_tool_list")]
    pub tool_list: PathBuf,

    #[serde(default = "default_annotations_dir")]
    pub annotations_dir: PathBuf,

    #[serde(default = "default_parameters_dir")]
    pub parameters_dir: PathBuf,

    #[serde(default = "default_example_prompts_dir")]
    pub example_prompts_dir: PathBuf,

    /// Persisted user prompts sent for example-prompt generation
    #[serde(default = "default_input_prompts_dir")]
    pub input_prompts_dir: PathBuf,

    /// Persisted raw backend responses for example-prompt generation
    #[serde(default = "default_raw_output_dir")]
    pub raw_output_dir: PathBuf,

    /// Skeleton files with placeholders
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,

    /// Composed per-tool documents
    #[serde(default = "default_tools_dir")]
    pub tools_dir: PathBuf,

    /// Assembled family documents
    #[serde(default = "default_families_dir")]
    pub families_dir: PathBuf,

    /// JSON run reports
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
}

fn default_tool_list() -> PathBuf {
    PathBuf::from("generated/cli/tools.json")
}
fn default_annotations_dir() -> PathBuf {
    PathBuf::from("generated/annotations")
}
fn default_parameters_dir() -> PathBuf {
    PathBuf::from("generated/parameters")
}
fn default_example_prompts_dir() -> PathBuf {
    PathBuf::from("generated/example-prompts")
}
fn default_input_prompts_dir() -> PathBuf {
    PathBuf::from("generated/example-prompts-prompts")
}
fn default_raw_output_dir() -> PathBuf {
    PathBuf::from("generated/example-prompts-raw-output")
}
fn default_raw_dir() -> PathBuf {
    PathBuf::from("generated/tools-raw")
}
fn default_tools_dir() -> PathBuf {
    PathBuf::from("generated/tools")
}
fn default_families_dir() -> PathBuf {
    PathBuf::from("generated/families")
}
fn default_reports_dir() -> PathBuf {
    PathBuf::from("generated/reports")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            tool_list: default_tool_list(),
            annotations_dir: default_annotations_dir(),
            parameters_dir: default_parameters_dir(),
            example_prompts_dir: default_example_prompts_dir(),
            input_prompts_dir: default_input_prompts_dir(),
            raw_output_dir: default_raw_output_dir(),
            raw_dir: default_raw_dir(),
            tools_dir: default_tools_dir(),
            families_dir: default_families_dir(),
            reports_dir: default_reports_dir(),
        }
    }
}

/// Locations of the three name-resolution lookup tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// JSON array of `{ "area", "displayName", "fileSlug" }`
    #[serde(default = "default_brand_map")]
    pub brand_map: PathBuf,

    /// JSON object mapping concatenated tokens to hyphenated forms
    #[serde(default = "default_compound_words")]
    pub compound_words: PathBuf,

    /// JSON array of tokens dropped from file names
    #[serde(default = "default_stop_words")]
    pub stop_words: PathBuf,
}

fn default_brand_map() -> PathBuf {
    PathBuf::from("data/brand-map.json")
}
fn default_compound_words() -> PathBuf {
    PathBuf::from("data/compound-words.json")
}
fn default_stop_words() -> PathBuf {
    PathBuf::from("data/stop-words.json")
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            brand_map: default_brand_map(),
            compound_words: default_compound_words(),
            stop_words: default_stop_words(),
        }
    }
}

/// Output-token budget constants. These are tuned per backend model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default = "default_per_tool_tokens")]
    pub per_tool_tokens: u32,

    #[serde(default = "default_base_tokens")]
    pub base_tokens: u32,

    #[serde(default = "default_words_per_token")]
    pub words_per_token: f64,

    #[serde(default = "default_buffer_factor")]
    pub buffer_factor: f64,

    /// Smallest budget ever handed out
    #[serde(default = "default_min_floor")]
    pub min_floor: u32,

    /// The backend's hard per-call output limit
    #[serde(default = "default_model_ceiling")]
    pub model_ceiling: u32,
}

fn default_per_tool_tokens() -> u32 {
    1000
}
fn default_base_tokens() -> u32 {
    2000
}
fn default_words_per_token() -> f64 {
    0.75
}
fn default_buffer_factor() -> f64 {
    2.0
}
fn default_min_floor() -> u32 {
    4096
}
fn default_model_ceiling() -> u32 {
    16384
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            per_tool_tokens: default_per_tool_tokens(),
            base_tokens: default_base_tokens(),
            words_per_token: default_words_per_token(),
            buffer_factor: default_buffer_factor(),
            min_floor: default_min_floor(),
            model_ceiling: default_model_ceiling(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First backoff delay; doubles after every rate-limited attempt
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}
fn default_initial_delay_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Ask the backend for a fresh H2 heading per tool (best effort)
    #[serde(default)]
    pub regenerate_headings: bool,

    #[serde(default = "default_metadata_tokens")]
    pub metadata_tokens: u32,

    #[serde(default = "default_related_content_tokens")]
    pub related_content_tokens: u32,

    #[serde(default = "default_heading_tokens")]
    pub heading_tokens: u32,

    #[serde(default = "default_example_prompt_tokens")]
    pub example_prompt_tokens: u32,
}

fn default_metadata_tokens() -> u32 {
    1024
}
fn default_related_content_tokens() -> u32 {
    1024
}
fn default_heading_tokens() -> u32 {
    64
}
fn default_example_prompt_tokens() -> u32 {
    2048
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            regenerate_headings: false,
            metadata_tokens: default_metadata_tokens(),
            related_content_tokens: default_related_content_tokens(),
            heading_tokens: default_heading_tokens(),
            example_prompt_tokens: default_example_prompt_tokens(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default locations.
    ///
    /// `./toolscribe.toml` wins over `~/.toolscribe/config.toml`; with
    /// neither present the defaults are used. Environment variables are
    /// applied last:
    /// - `TOOLSCRIBE_API_KEY` (highest priority), `AZURE_OPENAI_API_KEY`, `OPENAI_API_KEY`
    /// - `TOOLSCRIBE_PROVIDER`
    /// - `TOOLSCRIBE_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        let path = if local.exists() {
            local
        } else {
            Self::config_dir().join("config.toml")
        };
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a path the user named explicitly. Unlike
    /// [`AppConfig::load_from`], a missing file is an error.
    pub fn load_explicit(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                reason: "file does not exist".into(),
            });
        }
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("TOOLSCRIBE_API_KEY") {
            self.api_key = Some(key);
        } else if self.api_key.is_none() {
            self.api_key = std::env::var("AZURE_OPENAI_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("TOOLSCRIBE_PROVIDER") {
            self.default_provider = provider;
        }

        if let Ok(model) = std::env::var("TOOLSCRIBE_MODEL") {
            self.default_model = model;
        }
    }

    /// Get the user-level configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".toolscribe")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.budget.min_floor > self.budget.model_ceiling {
            return Err(ConfigError::ValidationError(format!(
                "budget.min_floor ({}) must not exceed budget.model_ceiling ({})",
                self.budget.min_floor, self.budget.model_ceiling
            )));
        }

        if self.budget.words_per_token <= 0.0 || self.budget.buffer_factor <= 0.0 {
            return Err(ConfigError::ValidationError(
                "budget.words_per_token and budget.buffer_factor must be > 0".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            providers: HashMap::new(),
            paths: PathsConfig::default(),
            naming: NamingConfig::default(),
            budget: BudgetConfig::default(),
            retry: RetryConfig::default(),
            assembly: AssemblyConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.budget.model_ceiling, 16384);
        assert_eq!(config.retry.max_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.budget, config.budget);
        assert_eq!(parsed.paths.tools_dir, config.paths.tools_dir);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn floor_above_ceiling_rejected() {
        let config = AppConfig {
            budget: BudgetConfig {
                min_floor: 20000,
                ..BudgetConfig::default()
            },
            ..AppConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_floor"));
    }

    #[test]
    fn zero_attempts_rejected() {
        let config = AppConfig {
            retry: RetryConfig {
                max_attempts: 0,
                initial_delay_ms: 1000,
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/toolscribe.toml")).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let err = AppConfig::load_explicit(Path::new("/nonexistent/toolscribe.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn partial_tables_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toolscribe.toml");
        std::fs::write(
            &path,
            r#"
default_model = "gpt-4.1"

[budget]
per_tool_tokens = 800
model_ceiling = 32768

[assembly]
regenerate_headings = true

[providers.azure]
api_url = "https://example.openai.azure.com"
api_version = "2024-10-21"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "gpt-4.1");
        assert_eq!(config.budget.per_tool_tokens, 800);
        assert_eq!(config.budget.base_tokens, 2000);
        assert_eq!(config.budget.model_ceiling, 32768);
        assert!(config.assembly.regenerate_headings);
        assert_eq!(config.assembly.metadata_tokens, 1024);
        assert_eq!(
            config.providers["azure"].api_version.as_deref(),
            Some("2024-10-21")
        );
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toolscribe.toml");
        std::fs::write(&path, "default_model = [unterminated").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn debug_output_redacts_keys() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o"));
        assert!(toml_str.contains("16384"));
    }
}
