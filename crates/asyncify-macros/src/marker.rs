use proc_macro2::TokenStream;
use quote::ToTokens;
use syn::spanned::Spanned;
use syn::{Attribute, ItemFn};

/// Paths the marker can be spelled with on a function.
const MARKER_PATHS: &[&[&str]] = &[
    &["asyncify"],
    &["asyncify", "asyncify"],
    &["asyncify", "prelude", "asyncify"],
    &["asyncify_macros", "asyncify"],
];

fn is_marker(attr: &Attribute) -> bool {
    let segments: Vec<String> = attr
        .path()
        .segments
        .iter()
        .map(|segment| segment.ident.to_string())
        .collect();
    MARKER_PATHS.iter().any(|path| segments == *path)
}

/// Validate a marker application and hand the function back unchanged.
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    if !attr.is_empty() {
        return Err(syn::Error::new(
            attr.span(),
            "#[asyncify] does not take arguments",
        ));
    }

    let function: ItemFn = syn::parse2(item.clone()).map_err(|err| {
        syn::Error::new(
            err.span(),
            "#[asyncify] can only be applied to functions with a body",
        )
    })?;

    if let Some(duplicate) = function.attrs.iter().find(|attr| is_marker(attr)) {
        return Err(syn::Error::new_spanned(
            duplicate,
            "#[asyncify] may only be applied once",
        ));
    }

    Ok(function.into_token_stream())
}
