//! Structured output of the emitter.
//!
//! Wrappers are built as values and only turned into source text by
//! [`WrapperUnit::render`], so callers can inspect names, parameters and return
//! types directly.

use proc_macro2::TokenStream;
use quote::{quote, ToTokens};
use syn::{Attribute, Expr, Generics, Ident, Receiver, Type, Visibility};

use crate::container::ContainerId;
use crate::declaration::{ImplHeader, Param};

/// One synthesized wrapper function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperFn {
    /// Conditional-compilation attributes carried over from the original.
    pub attrs: Vec<Attribute>,
    pub vis: Visibility,
    pub name: Ident,
    pub generics: Generics,
    pub receiver: Option<Receiver>,
    pub params: Vec<Param>,
    pub output: Type,
    /// Single expression: schedule the original call and return its handle.
    pub body: Expr,
    /// Name of the function being wrapped.
    pub delegate: Ident,
}

impl ToTokens for WrapperFn {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let WrapperFn {
            attrs,
            vis,
            name,
            generics,
            receiver,
            params,
            output,
            body,
            ..
        } = self;
        let where_clause = &generics.where_clause;
        let inputs = receiver
            .iter()
            .map(|receiver| quote!(#receiver))
            .chain(params.iter().map(|Param { name, ty }| quote!(#name: #ty)));

        tokens.extend(quote! {
            #(#attrs)*
            #vis fn #name #generics(#(#inputs),*) -> #output #where_clause {
                #body
            }
        });
    }
}

/// Wrappers sharing one `impl` header, or free functions when `header` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplSection {
    pub header: Option<ImplHeader>,
    pub wrappers: Vec<WrapperFn>,
}

impl ToTokens for ImplSection {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let wrappers = &self.wrappers;
        match &self.header {
            Some(ImplHeader { generics, self_ty }) => {
                let (impl_generics, _, where_clause) = generics.split_for_impl();
                tokens.extend(quote! {
                    impl #impl_generics #self_ty #where_clause {
                        #(#wrappers)*
                    }
                });
            }
            None => tokens.extend(quote! { #(#wrappers)* }),
        }
    }
}

/// Everything generated for one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperUnit {
    pub container: ContainerId,
    pub sections: Vec<ImplSection>,
}

impl WrapperUnit {
    pub fn wrappers(&self) -> impl Iterator<Item = &WrapperFn> {
        self.sections.iter().flat_map(|section| section.wrappers.iter())
    }

    pub fn render(&self) -> String {
        format!(
            "// @generated by asyncify for `{}`. Do not edit.\n{}\n",
            self.container,
            self.to_token_stream()
        )
    }
}

impl ToTokens for WrapperUnit {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        for section in &self.sections {
            section.to_tokens(tokens);
        }
    }
}

/// A named source unit handed back to the host.
#[derive(Debug, Clone)]
pub struct EmittedUnit {
    pub name: String,
    pub unit: WrapperUnit,
    pub text: String,
}

impl EmittedUnit {
    pub fn new(unit: WrapperUnit) -> Self {
        Self {
            name: unit.container.unit_name(),
            text: unit.render(),
            unit,
        }
    }
}
