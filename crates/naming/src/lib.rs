//! Name resolution for toolscribe.
//!
//! Several stages run independently (fragment rendering, example prompts,
//! skeletons, composition) and find each other's output by file name
//! alone. This crate is the single place those names are computed, so
//! every stage resolves the same command to the same file.

pub mod context;
pub mod resolver;

pub use context::{BrandEntry, NameContext, NamingError};
pub use resolver::{
    FragmentKind, PrefixSource, ResolvedName, UNKNOWN_SLUG, area_for_base, resolve_base,
    resolve_file_name,
};
