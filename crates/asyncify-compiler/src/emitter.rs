//! Wrapper synthesis.
//!
//! For each resolved target the emitter derives a wrapper that schedules the
//! original call on the configured runtime and hands back the join handle:
//!
//! ```ignore
//! pub fn print_number_async(number: i32) -> ::tokio::task::JoinHandle<()> {
//!     ::tokio::task::spawn_blocking(move || Self::print_number(number))
//! }
//! ```

use asyncify_core::{
    AsyncReturn, Diagnostic, DiagnosticCode, GenerationGroup, GeneratorConfig, ImplSection, Param,
    Qualifier, ReceiverKind, ResolvedTarget, Runtime, WrapperFn, WrapperUnit,
};
use log::debug;
use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::visit::Visit;
use syn::{parse_quote, Attribute, GenericParam, Ident, Meta, Receiver, Token, Type};

use crate::resolver::SymbolResolver;

/// Name of the wrapper for `original`, or `None` when appending `suffix`
/// does not produce a new, valid identifier.
pub fn derive_name(original: &Ident, suffix: &str) -> Option<String> {
    let base = original.unraw().to_string();
    let name = format!("{base}{suffix}");
    if name.is_empty() || name == base || name.starts_with("r#") {
        return None;
    }
    syn::parse_str::<Ident>(&name).ok().map(|_| name)
}

pub struct Emitter {
    suffix: String,
    runtime: Runtime,
}

impl Emitter {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            suffix: config.suffix.clone(),
            runtime: config.runtime,
        }
    }

    /// Wrapper name for `target`. Names that are not new identifiers, or that
    /// the container already uses, are reported instead.
    pub fn wrapper_name<R: SymbolResolver + ?Sized>(
        &self,
        target: &ResolvedTarget,
        resolver: &R,
    ) -> Result<Ident, Diagnostic> {
        let original = &target.symbol.name;
        let degenerate = |message: String| {
            Diagnostic::new(DiagnosticCode::DegenerateName, message).at(target.location().clone())
        };

        let name = derive_name(original, &self.suffix).ok_or_else(|| {
            degenerate(format!(
                "suffix `{}` does not produce a new identifier for `{original}`; skipping it",
                self.suffix
            ))
        })?;
        if resolver.declares(&target.symbol.container, &name) {
            return Err(degenerate(format!(
                "`{}` already declares `{name}`; skipping the wrapper for `{original}`",
                target.symbol.container
            )));
        }
        Ok(Ident::new(&name, original.span()))
    }

    /// Handle type returned by the wrapper. Depends on nothing but the shape
    /// of the original return type.
    pub fn wrapper_return_type(&self, returns: &AsyncReturn) -> Type {
        let value: Type = match returns {
            AsyncReturn::NoValue => parse_quote!(()),
            AsyncReturn::Value(ty) => (**ty).clone(),
        };
        match self.runtime {
            Runtime::Tokio => parse_quote!(::tokio::task::JoinHandle<#value>),
            Runtime::Thread => parse_quote!(::std::thread::JoinHandle<#value>),
        }
    }

    pub fn emit_wrapper<R: SymbolResolver + ?Sized>(
        &self,
        target: &ResolvedTarget,
        resolver: &R,
    ) -> Result<WrapperFn, Diagnostic> {
        let symbol = &target.symbol;
        let name = self.wrapper_name(target, resolver)?;
        let delegate = symbol.name.clone();

        let receiver: Option<Receiver> = match &symbol.qualifier {
            Qualifier::Static => None,
            Qualifier::Instance(ReceiverKind::Value) => Some(parse_quote!(self)),
            Qualifier::Instance(ReceiverKind::Shared) => {
                Some(parse_quote!(self: ::std::sync::Arc<Self>))
            }
            Qualifier::Instance(ReceiverKind::Typed(ty)) => Some(parse_quote!(self: #ty)),
        };

        let args = symbol.params.iter().map(|param| &param.name);
        let turbofish = turbofish(&symbol.generics, &symbol.params);
        let call = match (&symbol.qualifier, &symbol.impl_header) {
            (Qualifier::Instance(_), _) => quote!(self.#delegate #turbofish(#(#args),*)),
            (Qualifier::Static, Some(_)) => quote!(Self::#delegate #turbofish(#(#args),*)),
            (Qualifier::Static, None) => quote!(self::#delegate #turbofish(#(#args),*)),
        };
        let body = match self.runtime {
            Runtime::Tokio => parse_quote!(::tokio::task::spawn_blocking(move || #call)),
            Runtime::Thread => parse_quote!(::std::thread::spawn(move || #call)),
        };

        Ok(WrapperFn {
            attrs: target
                .candidate
                .attrs
                .iter()
                .filter(|attr| is_cfg_gate(attr))
                .cloned()
                .collect(),
            vis: symbol.vis.clone(),
            name,
            generics: symbol.generics.clone(),
            receiver,
            params: symbol.params.clone(),
            output: self.wrapper_return_type(&symbol.returns),
            body,
            delegate,
        })
    }

    /// Build the unit for one group. Targets that cannot be wrapped are
    /// reported and left out; `None` when nothing is left.
    pub fn emit_group<R: SymbolResolver + ?Sized>(
        &self,
        group: &GenerationGroup,
        resolver: &R,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<WrapperUnit> {
        let mut sections: Vec<ImplSection> = Vec::new();

        for target in &group.targets {
            let wrapper = match self.emit_wrapper(target, resolver) {
                Ok(wrapper) => wrapper,
                Err(diagnostic) => {
                    diagnostics.push(diagnostic);
                    continue;
                }
            };
            debug!("{}: `{}` -> `{}`", group.container, wrapper.delegate, wrapper.name);

            let header = target.symbol.impl_header.as_ref();
            match sections
                .iter_mut()
                .find(|section| section.header.as_ref() == header)
            {
                Some(section) => section.wrappers.push(wrapper),
                None => sections.push(ImplSection {
                    header: header.cloned(),
                    wrappers: vec![wrapper],
                }),
            }
        }

        if sections.is_empty() {
            return None;
        }
        Some(WrapperUnit {
            container: group.container.clone(),
            sections,
        })
    }
}

/// `#[cfg(..)]`, or a `#[cfg_attr(..)]` expanding to nothing but `cfg`s.
fn is_cfg_gate(attr: &Attribute) -> bool {
    if attr.path().is_ident("cfg") {
        return true;
    }
    if !attr.path().is_ident("cfg_attr") {
        return false;
    }
    attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
        .is_ok_and(|metas| {
            metas.len() > 1 && metas.iter().skip(1).all(|meta| meta.path().is_ident("cfg"))
        })
}

/// `::<T, N>` forwarding type and const parameters; empty when there are none.
fn turbofish(generics: &syn::Generics, params: &[Param]) -> TokenStream {
    let args: Vec<&Ident> = generics
        .params
        .iter()
        .filter_map(|param| match param {
            GenericParam::Type(ty) => Some(&ty.ident),
            GenericParam::Const(konst) => Some(&konst.ident),
            GenericParam::Lifetime(_) => None,
        })
        .collect();
    // Explicit generic arguments are not allowed alongside `impl Trait` arguments.
    if args.is_empty() || params.iter().any(|param| has_impl_trait(&param.ty)) {
        return TokenStream::new();
    }
    quote!(::<#(#args),*>)
}

fn has_impl_trait(ty: &Type) -> bool {
    struct Finder(bool);

    impl<'ast> Visit<'ast> for Finder {
        fn visit_type_impl_trait(&mut self, _: &'ast syn::TypeImplTrait) {
            self.0 = true;
        }
    }

    let mut finder = Finder(false);
    finder.visit_type(ty);
    finder.0
}
