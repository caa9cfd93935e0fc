//! Example-prompt generation: the one AI-backed per-tool stage.
//!
//! For each tool the stage writes, in order:
//! 1. the user prompt it is about to send (`-input-prompt.md`)
//! 2. the untouched model response (`-raw-output.txt`)
//! 3. the cleaned fragment with front matter (`-example-prompts.md`)
//!
//! The fragment is written last so a crash mid-tool never leaves a
//! fragment the composer would pick up.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use toolscribe_config::PathsConfig;
use toolscribe_core::{BatchReport, CancelFlag, GenerationError, ToolDescriptor, ToolList};
use toolscribe_naming::{FragmentKind, NameContext, ResolvedName};
use toolscribe_providers::RetryingClient;
use tracing::{debug, error, info, warn};
use crate::error::{ComposeError, ensure_dir};
use crate::fragments::{SlugClaims, write_file};
use crate::frontmatter::{FragmentFrontMatter, render_front_matter};

/// Default number of prompts requested per tool.
pub const DEFAULT_PROMPT_COUNT: usize = 5;

pub const EXAMPLE_PROMPTS_SYSTEM_PROMPT: &str = "You write example prompts for CLI tool documentation. \
Each prompt is one sentence a user might type to an assistant that can call the tool. \
Use realistic, specific values for parameters. \
Output only a markdown bullet list, one prompt per bullet, with no heading and no commentary.";

/// Where the example-prompt stage writes.
#[derive(Debug, Clone)]
pub struct ExampleDirs {
    pub example_prompts: PathBuf,
    pub input_prompts: PathBuf,
    pub raw_output: PathBuf,
}

impl ExampleDirs {
    pub fn from_config(paths: &PathsConfig) -> Self {
        Self {
            example_prompts: paths.example_prompts_dir.clone(),
            input_prompts: paths.input_prompts_dir.clone(),
            raw_output: paths.raw_output_dir.clone(),
        }
    }
}

/// Build the user prompt for one tool.
pub fn build_user_prompt(tool: &ToolDescriptor, service: &str, count: usize) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Write {count} example prompts for this tool.");
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Service: {service}");
    let _ = writeln!(prompt, "Command: {}", tool.command.trim());
    let _ = writeln!(prompt, "Description: {}", tool.description.trim());

    if !tool.parameters.is_empty() {
        let _ = writeln!(prompt);
        let _ = writeln!(prompt, "Parameters:");
        for param in &tool.parameters {
            let _ = writeln!(
                prompt,
                "- {} ({}, {}): {}",
                param.name.trim(),
                param.param_type,
                if param.required { "required" } else { "optional" },
                param.description.trim()
            );
        }
        let _ = writeln!(
            prompt,
            "\nEvery prompt must supply values for all required parameters."
        );
    }
    prompt
}

/// Strip a code fence the model wrapped around its whole answer.
pub fn clean_output(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return trimmed.to_string();
    };
    // Drop the info string (e.g. "markdown") on the opening line.
    match inner.find('\n') {
        Some(nl) => inner[nl + 1..].trim().to_string(),
        None => inner.trim().to_string(),
    }
}

/// Generates the example-prompts fragment for every tool.
pub struct ExamplePromptStage {
    client: Arc<RetryingClient>,
    ctx: Arc<NameContext>,
    dirs: ExampleDirs,
    max_output_tokens: u32,
    prompt_count: usize,
    skip_existing: bool,
    cancel: CancelFlag,
}

impl ExamplePromptStage {
    pub fn new(
        client: Arc<RetryingClient>,
        ctx: Arc<NameContext>,
        dirs: ExampleDirs,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            client,
            ctx,
            dirs,
            max_output_tokens,
            prompt_count: DEFAULT_PROMPT_COUNT,
            skip_existing: false,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_prompt_count(mut self, count: usize) -> Self {
        self.prompt_count = count.max(1);
        self
    }

    /// Leave tools whose fragment already exists untouched.
    pub fn with_skip_existing(mut self, skip: bool) -> Self {
        self.skip_existing = skip;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Generate and write the fragment for one tool.
    pub async fn generate(&self, tool: &ToolDescriptor) -> Result<ResolvedName, StageError> {
        let name = ResolvedName::resolve(Some(&tool.command), &self.ctx);
        let service = self.ctx.display_name(tool.area().unwrap_or_default());
        let user_prompt = build_user_prompt(tool, &service, self.prompt_count);

        write_file(
            &self.dirs.input_prompts.join(name.file_name(FragmentKind::InputPrompt)),
            &user_prompt,
        )?;

        let raw = self
            .client
            .complete(EXAMPLE_PROMPTS_SYSTEM_PROMPT, &user_prompt, self.max_output_tokens)
            .await?;

        write_file(
            &self.dirs.raw_output.join(name.file_name(FragmentKind::RawOutput)),
            &raw,
        )?;

        let mut fragment = render_front_matter(
            &FragmentFrontMatter::new(tool.command.trim(), FragmentKind::ExamplePrompt)
                .with_model(self.client.model()),
        )?;
        fragment.push('\n');
        fragment.push_str(&clean_output(&raw));
        fragment.push('\n');

        write_file(
            &self.dirs.example_prompts.join(name.file_name(FragmentKind::ExamplePrompt)),
            &fragment,
        )?;

        debug!(tool = %tool.command, base = %name.base_slug(), "Wrote example prompts");
        Ok(name)
    }

    /// Run the stage over the whole tool list, one tool at a time.
    pub async fn run(&self, tools: &ToolList) -> Result<BatchReport, ComposeError> {
        ensure_dir(&self.dirs.example_prompts)?;
        ensure_dir(&self.dirs.input_prompts)?;
        ensure_dir(&self.dirs.raw_output)?;

        let mut report = BatchReport::new("examples");
        let mut claims = SlugClaims::default();

        for tool in &tools.tools {
            if self.cancel.is_cancelled() {
                warn!("Cancellation requested, stopping example-prompt stage");
                report.cancelled = true;
                break;
            }

            let command = tool.command.trim();
            if command.is_empty() {
                report.skip("<blank command>", "tool has no command");
                continue;
            }

            let name = ResolvedName::resolve(Some(command), &self.ctx);
            if let Err(owner) = claims.claim(name.base_slug(), command) {
                warn!(tool = %command, owner = %owner, "File name collision, skipping");
                report.skip(
                    command,
                    format!("file name '{}' already used by '{owner}'", name.base_slug()),
                );
                continue;
            }

            if self.skip_existing
                && self
                    .dirs
                    .example_prompts
                    .join(name.file_name(FragmentKind::ExamplePrompt))
                    .exists()
            {
                report.skip(command, "example prompts already exist");
                continue;
            }

            match self.generate(tool).await {
                Ok(_) => report.succeed(command),
                Err(StageError::Generation(GenerationError::Cancelled)) => {
                    warn!(tool = %command, "Cancelled mid-tool");
                    report.skip(command, "cancelled");
                    report.cancelled = true;
                    break;
                }
                Err(e) => {
                    error!(tool = %command, error = %e, "Example-prompt generation failed");
                    report.fail(command, e);
                }
            }
        }

        report.finish();
        info!("{}", report.summary_line());
        Ok(report)
    }
}

/// Why a single tool failed in the example-prompt stage.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Compose(#[from] ComposeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use toolscribe_core::provider::*;
    use toolscribe_core::{ProviderError, ToolParameter};
    use toolscribe_providers::{RetryPolicy, Sleeper};

    struct FixedProvider {
        text: String,
        finish_reason: FinishReason,
        calls: Mutex<Vec<CompletionRequest>>,
    }

    impl FixedProvider {
        fn new(text: &str, finish_reason: FinishReason) -> Self {
            Self {
                text: text.into(),
                finish_reason,
                calls: Mutex::new(vec![]),
            }
        }
    }

    #[async_trait]
    impl Provider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            self.calls.lock().unwrap().push(request);
            Ok(CompletionResponse {
                text: self.text.clone(),
                finish_reason: self.finish_reason.clone(),
                usage: None,
                model: "test-model".into(),
            })
        }
    }

    struct NoSleep;

    #[async_trait]
    impl Sleeper for NoSleep {
        async fn sleep(&self, _duration: Duration) {}
    }

    fn tool(command: &str) -> ToolDescriptor {
        ToolDescriptor {
            command: command.into(),
            description: "Lists things.".into(),
            parameters: vec![ToolParameter {
                name: "subscription".into(),
                param_type: "string".into(),
                required: true,
                description: "Subscription ID".into(),
            }],
            metadata: Default::default(),
        }
    }

    fn stage(provider: Arc<FixedProvider>, root: &std::path::Path) -> ExamplePromptStage {
        let client = RetryingClient::new(provider, "test-model")
            .with_policy(RetryPolicy {
                max_attempts: 2,
                initial_delay: Duration::from_millis(1),
            })
            .with_sleeper(Arc::new(NoSleep));
        ExamplePromptStage::new(
            Arc::new(client),
            Arc::new(NameContext::new()),
            ExampleDirs {
                example_prompts: root.join("example-prompts"),
                input_prompts: root.join("input"),
                raw_output: root.join("raw-output"),
            },
            2048,
        )
    }

    #[test]
    fn user_prompt_lists_parameters() {
        let prompt = build_user_prompt(&tool("storage list"), "Storage", 3);
        assert!(prompt.starts_with("Write 3 example prompts"));
        assert!(prompt.contains("Command: storage list"));
        assert!(prompt.contains("- subscription (string, required): Subscription ID"));
    }

    #[test]
    fn clean_output_strips_wrapping_fence() {
        assert_eq!(clean_output("```markdown\n- a\n- b\n```\n"), "- a\n- b");
        assert_eq!(clean_output("  - a\n- b  "), "- a\n- b");
        assert_eq!(clean_output("```\n- a"), "```\n- a");
    }

    #[tokio::test]
    async fn writes_three_files_per_tool() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = Arc::new(FixedProvider::new(
            "```markdown\n- List my storage accounts\n```",
            FinishReason::Complete,
        ));
        let stage = stage(provider.clone(), tmp.path());

        let report = stage
            .run(&ToolList {
                tools: vec![tool("storage list")],
            })
            .await
            .unwrap();

        assert_eq!(report.succeeded, vec!["storage list"]);
        let base = "azure-storage-list";
        let fragment = std::fs::read_to_string(
            tmp.path().join(format!("example-prompts/{base}-example-prompts.md")),
        )
        .unwrap();
        assert!(fragment.contains("- List my storage accounts"));
        assert!(!fragment.contains("```"));
        assert!(tmp.path().join(format!("input/{base}-input-prompt.md")).exists());
        let raw =
            std::fs::read_to_string(tmp.path().join(format!("raw-output/{base}-raw-output.txt")))
                .unwrap();
        assert!(raw.starts_with("```markdown"));

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].max_output_tokens, 2048);
        assert_eq!(calls[0].system_prompt, EXAMPLE_PROMPTS_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn truncated_tool_fails_without_fragment() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = Arc::new(FixedProvider::new("- cut", FinishReason::LengthLimited));
        let stage = stage(provider, tmp.path());

        let report = stage
            .run(&ToolList {
                tools: vec![tool("storage list"), tool("storage show")],
            })
            .await
            .unwrap();

        assert_eq!(report.failed.len(), 2);
        assert!(report.failed[0].error.contains("truncated at the 2048-token"));
        assert!(!tmp
            .path()
            .join("example-prompts/azure-storage-list-example-prompts.md")
            .exists());
        // The prompt is persisted before the call.
        assert!(tmp.path().join("input/azure-storage-list-input-prompt.md").exists());
    }

    #[tokio::test]
    async fn skip_existing_leaves_fragment_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = Arc::new(FixedProvider::new("- new", FinishReason::Complete));
        let stage = stage(provider.clone(), tmp.path()).with_skip_existing(true);

        std::fs::create_dir_all(tmp.path().join("example-prompts")).unwrap();
        let existing = tmp
            .path()
            .join("example-prompts/azure-storage-list-example-prompts.md");
        std::fs::write(&existing, "- old").unwrap();

        let report = stage
            .run(&ToolList {
                tools: vec![tool("storage list")],
            })
            .await
            .unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(std::fs::read_to_string(existing).unwrap(), "- old");
        assert!(provider.calls.lock().unwrap().is_empty());
    }
}
