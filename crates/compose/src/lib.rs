//! Per-tool document production for toolscribe.
//!
//! Stages, in pipeline order:
//! 1. [`fragments`] renders the deterministic parameter and annotation
//!    fragments and the raw skeleton for every tool.
//! 2. [`examples`] asks the backend for example prompts per tool.
//! 3. [`composer`] substitutes the fragments into each skeleton, and
//!    [`batch`] runs that over a whole directory with a missing-fragment report.
//!
//! Every stage locates files through `toolscribe_naming`, never by
//! scanning a fragment directory.

pub mod batch;
pub mod composer;
pub mod error;
pub mod examples;
pub mod fragments;
pub mod frontmatter;
pub mod skeleton;

pub use batch::{ComposeReport, MissingFragment, compose_all, list_markdown};
pub use composer::{ComposedTool, FragmentComposer, FragmentDirs, FragmentSlot, FragmentState};
pub use error::ComposeError;
pub use examples::{ExampleDirs, ExamplePromptStage, StageError};
pub use fragments::{FragmentWriter, OutputDirs, render_annotations, render_parameters};
pub use frontmatter::{FragmentFrontMatter, render_front_matter, strip_front_matter};
pub use skeleton::{SimpleTemplate, TemplateRenderer, command_marker, extract_command};
