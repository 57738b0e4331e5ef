//! Generation passes for `#[asyncify]`.
//!
//! This crate handles:
//! - Scanning parsed sources for annotated functions
//! - Resolving attribute paths against the marker definition
//! - Emitting wrapper units per containing type or module
//! - Loading crates from disk and writing units from build scripts

pub mod builder;
pub mod emitter;
pub mod filter;
pub mod pipeline;
pub mod project;
pub mod resolver;
pub mod scanner;
pub mod source;

pub use builder::{write_units, BuildOutput, Builder};
pub use emitter::{derive_name, Emitter};
pub use filter::{group_by_container, reject_nested, AttributeFilter};
pub use pipeline::{GenerationOutput, Generator};
pub use project::{module_path_for, Project};
pub use resolver::{SourceResolver, SymbolResolver};
pub use scanner::Scanner;
pub use source::{SourceFile, SourceForest};
