//! Placeholder composition.
//!
//! Takes a raw skeleton, finds the command in its marker comment, resolves
//! the exact companion fragment names, and substitutes each fragment (front
//! matter stripped) for its placeholder. Fragments are looked up by exact
//! name only; the fragment directories are never listed.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use serde::Serialize;
use toolscribe_config::PathsConfig;
use toolscribe_naming::{FragmentKind, NameContext, ResolvedName};
use tracing::{debug, warn};
use crate::error::ComposeError;
use crate::frontmatter::strip_front_matter;
use crate::skeleton::{
    ANNOTATIONS_PLACEHOLDER, EXAMPLE_PROMPTS_PLACEHOLDER, PARAMETERS_PLACEHOLDER,
    extract_command,
};

/// The three placeholders a skeleton carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FragmentSlot {
    ExamplePrompts,
    Parameters,
    Annotations,
}

impl FragmentSlot {
    pub const ALL: [FragmentSlot; 3] = [
        FragmentSlot::ExamplePrompts,
        FragmentSlot::Parameters,
        FragmentSlot::Annotations,
    ];

    pub fn placeholder(self) -> &'static str {
        match self {
            FragmentSlot::ExamplePrompts => EXAMPLE_PROMPTS_PLACEHOLDER,
            FragmentSlot::Parameters => PARAMETERS_PLACEHOLDER,
            FragmentSlot::Annotations => ANNOTATIONS_PLACEHOLDER,
        }
    }

    pub fn kind(self) -> FragmentKind {
        match self {
            FragmentSlot::ExamplePrompts => FragmentKind::ExamplePrompt,
            FragmentSlot::Parameters => FragmentKind::Parameter,
            FragmentSlot::Annotations => FragmentKind::Annotation,
        }
    }

    /// The visible text substituted when the fragment does not exist.
    pub fn missing_marker(self) -> &'static str {
        match self {
            FragmentSlot::ExamplePrompts => "*Example prompts content not found.*",
            FragmentSlot::Parameters => "*Parameters content not found.*",
            FragmentSlot::Annotations => "*Annotations content not found.*",
        }
    }
}

/// Whether a fragment was found, and its body if so.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentState {
    Found(String),
    Missing,
}

/// Directories holding each fragment kind.
#[derive(Debug, Clone)]
pub struct FragmentDirs {
    pub annotations: PathBuf,
    pub parameters: PathBuf,
    pub example_prompts: PathBuf,
}

impl FragmentDirs {
    pub fn from_config(paths: &PathsConfig) -> Self {
        Self {
            annotations: paths.annotations_dir.clone(),
            parameters: paths.parameters_dir.clone(),
            example_prompts: paths.example_prompts_dir.clone(),
        }
    }

    pub fn dir_for(&self, slot: FragmentSlot) -> &Path {
        match slot {
            FragmentSlot::ExamplePrompts => &self.example_prompts,
            FragmentSlot::Parameters => &self.parameters,
            FragmentSlot::Annotations => &self.annotations,
        }
    }
}

/// A skeleton with its fragments resolved.
#[derive(Debug, Clone)]
pub struct ComposedTool {
    pub file_name: String,
    /// Command from the marker comment, if present
    pub command: Option<String>,
    pub raw_content: String,
    pub fragments: Vec<(FragmentSlot, FragmentState)>,
    pub content: String,
}

impl ComposedTool {
    /// Fragment kinds that were not found.
    pub fn missing_kinds(&self) -> Vec<FragmentKind> {
        self.fragments
            .iter()
            .filter(|(_, state)| *state == FragmentState::Missing)
            .map(|(slot, _)| slot.kind())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_kinds().is_empty()
    }
}

/// Substitutes fragment files into raw skeletons.
pub struct FragmentComposer {
    ctx: Arc<NameContext>,
    dirs: FragmentDirs,
}

impl FragmentComposer {
    pub fn new(ctx: Arc<NameContext>, dirs: FragmentDirs) -> Self {
        Self { ctx, dirs }
    }

    /// Read a skeleton from disk and compose it.
    pub fn compose(&self, raw_path: &Path) -> Result<ComposedTool, ComposeError> {
        let raw = std::fs::read_to_string(raw_path).map_err(|e| ComposeError::read(raw_path, e))?;
        let file_name = raw_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.compose_content(&file_name, &raw)
    }

    /// Compose skeleton text already in memory.
    ///
    /// A missing marker or fragment is not an error; only an unreadable
    /// fragment file is.
    pub fn compose_content(&self, file_name: &str, raw: &str) -> Result<ComposedTool, ComposeError> {
        let command = extract_command(raw);
        let name = match &command {
            Some(command) => Some(ResolvedName::resolve(Some(command), &self.ctx)),
            None => {
                warn!(file = %file_name, "No command marker, all fragments treated as missing");
                None
            }
        };

        let mut fragments = Vec::with_capacity(FragmentSlot::ALL.len());

        for slot in FragmentSlot::ALL {
            let state = match &name {
                Some(name) => self.read_fragment(name, slot)?,
                None => FragmentState::Missing,
            };

            if matches!(state, FragmentState::Missing) && name.is_some() {
                warn!(
                    file = %file_name,
                    kind = %slot.kind(),
                    "Fragment not found"
                );
            }
            fragments.push((slot, state));
        }

        let replacements: Vec<(&str, &str)> = fragments
            .iter()
            .map(|(slot, state)| {
                let body = match state {
                    FragmentState::Found(body) => body.as_str(),
                    FragmentState::Missing => slot.missing_marker(),
                };
                (slot.placeholder(), body)
            })
            .collect();
        let content = splice_placeholders(raw, &replacements);

        Ok(ComposedTool {
            file_name: file_name.to_string(),
            command,
            raw_content: raw.to_string(),
            fragments,
            content,
        })
    }

    fn read_fragment(
        &self,
        name: &ResolvedName,
        slot: FragmentSlot,
    ) -> Result<FragmentState, ComposeError> {
        let path = self.dirs.dir_for(slot).join(name.file_name(slot.kind()));
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                debug!(path = %path.display(), "Fragment found");
                Ok(FragmentState::Found(strip_front_matter(&text).trim_end().to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(FragmentState::Missing),
            Err(e) => Err(ComposeError::read(path, e)),
        }
    }
}

/// Replace every placeholder occurrence in one left-to-right pass.
///
/// Only the skeleton is scanned; inserted bodies are never rescanned, so a
/// fragment that happens to contain a placeholder keeps it verbatim.
fn splice_placeholders(raw: &str, replacements: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    loop {
        let next = replacements
            .iter()
            .filter_map(|&(placeholder, body)| rest.find(placeholder).map(|at| (at, placeholder, body)))
            .min_by_key(|&(at, _, _)| at);
        let Some((at, placeholder, body)) = next else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..at]);
        out.push_str(body);
        rest = &rest[at + placeholder.len()..];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{SimpleTemplate, render_skeleton};
    use toolscribe_core::ToolDescriptor;

    fn setup() -> (tempfile::TempDir, FragmentDirs) {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = FragmentDirs {
            annotations: tmp.path().join("annotations"),
            parameters: tmp.path().join("parameters"),
            example_prompts: tmp.path().join("example-prompts"),
        };
        for slot in FragmentSlot::ALL {
            std::fs::create_dir_all(dirs.dir_for(slot)).unwrap();
        }
        (tmp, dirs)
    }

    fn skeleton(command: &str, ctx: &NameContext) -> String {
        let tool = ToolDescriptor {
            command: command.into(),
            description: "Gets a node pool.".into(),
            parameters: vec![],
            metadata: Default::default(),
        };
        render_skeleton(&tool, ctx, &SimpleTemplate::default()).unwrap()
    }

    fn aks_context() -> NameContext {
        NameContext::new()
            .with_brand("aks", "Azure Kubernetes Service", "azure-kubernetes-service")
            .with_compound("nodepool", "node-pool")
    }

    #[test]
    fn all_fragments_missing_yields_three_markers() {
        let (_tmp, dirs) = setup();
        let ctx = Arc::new(aks_context());
        let composer = FragmentComposer::new(ctx.clone(), dirs);

        let composed = composer
            .compose_content("x.md", &skeleton("aks nodepool get", &ctx))
            .unwrap();

        assert_eq!(composed.missing_kinds().len(), 3);
        for slot in FragmentSlot::ALL {
            assert!(composed.content.contains(slot.missing_marker()));
            assert!(!composed.content.contains(slot.placeholder()));
        }
    }

    #[test]
    fn substitutes_found_fragments_without_front_matter() {
        let (_tmp, dirs) = setup();
        let base = "azure-kubernetes-service-node-pool-get";
        std::fs::write(
            dirs.parameters.join(format!("{base}-parameters.md")),
            "---\ntool: aks nodepool get\n---\n\n| Parameter |\n",
        )
        .unwrap();
        std::fs::write(
            dirs.example_prompts.join(format!("{base}-example-prompts.md")),
            "- Show node pool np1\n",
        )
        .unwrap();

        let ctx = Arc::new(aks_context());
        let composer = FragmentComposer::new(ctx.clone(), dirs);
        let composed = composer
            .compose_content("x.md", &skeleton("aks nodepool get", &ctx))
            .unwrap();

        assert!(composed.content.contains("| Parameter |"));
        assert!(!composed.content.contains("tool: aks nodepool get"));
        assert!(composed.content.contains("- Show node pool np1"));
        assert_eq!(composed.missing_kinds(), vec![FragmentKind::Annotation]);
        assert!(composed.content.contains("*Annotations content not found.*"));
        assert_eq!(composed.command.as_deref(), Some("aks nodepool get"));
    }

    #[test]
    fn placeholder_text_inside_a_fragment_is_kept_verbatim() {
        let (_tmp, dirs) = setup();
        std::fs::write(
            dirs.example_prompts.join("azure-storage-list-example-prompts.md"),
            format!("- Explain {PARAMETERS_PLACEHOLDER} please\n"),
        )
        .unwrap();

        let ctx = Arc::new(NameContext::new());
        let composer = FragmentComposer::new(ctx.clone(), dirs);
        let composed = composer
            .compose_content("azure-storage-list.md", &skeleton("storage list", &ctx))
            .unwrap();

        assert!(composed.content.contains("- Explain {{PARAMETERS_CONTENT}} please"));
        assert_eq!(composed.content.matches("*Parameters content not found.*").count(), 1);
    }

    #[test]
    fn splice_replaces_every_occurrence_once() {
        let out = splice_placeholders("{{A}} and {{B}} then {{A}}", &[("{{A}}", "{{B}}"), ("{{B}}", "b")]);
        assert_eq!(out, "{{B}} and b then {{B}}");
    }

    #[test]
    fn missing_marker_treats_all_as_missing() {
        let (_tmp, dirs) = setup();
        let composer = FragmentComposer::new(Arc::new(NameContext::new()), dirs);
        let raw = format!("## Orphan\n\n{PARAMETERS_PLACEHOLDER}\n");

        let composed = composer.compose_content("orphan.md", &raw).unwrap();
        assert_eq!(composed.command, None);
        assert_eq!(composed.missing_kinds().len(), 3);
        assert!(composed.content.contains("*Parameters content not found.*"));
    }

    #[test]
    fn compose_from_disk() {
        let (tmp, dirs) = setup();
        let ctx = Arc::new(NameContext::new());
        let raw_path = tmp.path().join("azure-storage-list.md");
        std::fs::write(&raw_path, skeleton("storage list", &ctx)).unwrap();

        let composer = FragmentComposer::new(ctx, dirs);
        let composed = composer.compose(&raw_path).unwrap();
        assert_eq!(composed.file_name, "azure-storage-list.md");
        assert!(!composed.is_complete());
    }

    #[test]
    fn unreadable_skeleton_is_an_error() {
        let (tmp, dirs) = setup();
        let composer = FragmentComposer::new(Arc::new(NameContext::new()), dirs);
        assert!(matches!(
            composer.compose(&tmp.path().join("absent.md")),
            Err(ComposeError::Read { .. })
        ));
    }
}
