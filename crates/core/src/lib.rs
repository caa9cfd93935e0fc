//! # toolscribe core
//!
//! Domain types, traits, and error definitions for the toolscribe
//! documentation pipeline. This crate carries no I/O-heavy dependencies;
//! every other crate in the workspace depends inward on it.
//!
//! ## Contents
//!
//! - [`ToolDescriptor`] / [`ToolList`]: the ingested CLI tool list
//! - [`Provider`]: the text-generation backend seam
//! - [`BatchReport`]: the per-run summary every batch stage returns
//! - [`CancelFlag`]: cooperative cancellation between batch items

pub mod cancel;
pub mod error;
pub mod provider;
pub mod report;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use cancel::CancelFlag;
pub use error::{Error, GenerationError, ProviderError, Result};
pub use provider::{CompletionRequest, CompletionResponse, FinishReason, Provider, Usage};
pub use report::{BatchReport, ItemFailure, ItemSkip};
pub use tool::{MetadataFlag, ToolDescriptor, ToolList, ToolParameter};
