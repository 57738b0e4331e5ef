//! Procedural macros for asyncify.
//!
//! This crate provides:
//! - `#[asyncify]` - Marks a function for wrapper generation

use proc_macro::TokenStream;

mod marker;

/// Marks a function to receive a `<name>_async` companion.
///
/// The attribute leaves the function untouched. The companion itself is
/// written by `asyncify_compiler::Builder` from a build script and pulled in
/// with `asyncify::include_generated!`.
///
/// ```ignore
/// use asyncify::asyncify;
///
/// pub struct Program;
///
/// impl Program {
///     #[asyncify]
///     pub fn print_number(number: i32) {
///         println!("{number}");
///     }
/// }
///
/// asyncify::include_generated!("crate-Program.asyncify.rs");
/// ```
#[proc_macro_attribute]
pub fn asyncify(attr: TokenStream, item: TokenStream) -> TokenStream {
    marker::expand(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
