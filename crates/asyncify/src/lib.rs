//! asyncify: background-task companions for blocking functions.
//!
//! Mark a function with [`asyncify`], run `asyncify_compiler::Builder` from the
//! crate's build script, and include the generated unit next to the marked
//! code with [`include_generated!`]. Each marked `fn name(..) -> T` gains a
//! `fn name_async(..) -> JoinHandle<T>` that runs the original on a blocking
//! task.
//!
//! This is the main entry point for user applications. Generation itself
//! lives in `asyncify-compiler`.

pub use asyncify_macros::asyncify;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::asyncify;
    pub use crate::include_generated;
}

/// Include a unit written by the build script.
///
/// Expands to `include!("$OUT_DIR/asyncify/<unit>")`. Place it in the module
/// that owns the container: unit names are `<module path>-<Type>.asyncify.rs`
/// for types and `<module path>.asyncify.rs` for free functions, with the
/// crate root spelled `crate`.
#[macro_export]
macro_rules! include_generated {
    ($unit:literal) => {
        include!(concat!(env!("OUT_DIR"), "/asyncify/", $unit));
    };
}
