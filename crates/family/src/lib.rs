//! Family documents: tools sharing a command area, assembled into one file.
//!
//! [`grouper`] reads the composed per-tool files and groups them,
//! [`budget`] sizes each generation call, and [`assembler`] generates the
//! metadata and related-content blocks and stitches everything together.

pub mod assembler;
pub mod batch;
pub mod budget;
pub mod error;
pub mod grouper;
pub mod parser;
pub mod prompts;

pub use assembler::{FamilyAssembler, FamilyDocument, stitch};
pub use batch::{AssembleReport, CappedFamily, assemble_all};
pub use budget::{BudgetStrategy, TokenBudget, TokenBudgetEstimator};
pub use error::FamilyError;
pub use grouper::{FamilyGroup, FamilyReader, ReadOutcome, group_tools};
pub use parser::{Extraction, ToolContent, parse_tool};
