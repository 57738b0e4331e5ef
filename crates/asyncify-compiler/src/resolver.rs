//! Symbol resolution.
//!
//! [`SymbolResolver`] is the semantic service a generation pass depends on. A
//! host with real name resolution can provide its own implementation;
//! [`SourceResolver`] is the built-in one, working from the `use` declarations
//! and item structure of the scanned sources.

use std::collections::{HashMap, HashSet};

use asyncify_core::{
    AsyncReturn, CandidateDeclaration, ContainerId, ContainerSyntax, Diagnostic, DiagnosticCode,
    FunctionSymbol, ImplHeader, ModulePath, Param, Qualifier, ReceiverKind, SymbolPath,
};
use proc_macro2::Span;
use syn::ext::IdentExt;
use syn::visit::{self, Visit};
use syn::{FnArg, Ident, ImplItem, Item, Pat, PathSegment, ReturnType, Type, UseTree};

use crate::source::SourceForest;

/// Upper bound on import-to-import expansion when resolving a path.
const MAX_IMPORT_DEPTH: usize = 16;

pub trait SymbolResolver {
    /// Resolve an attribute path as written in `module` to the path of the
    /// item it names. `None` when the path cannot denote anything.
    fn resolve_attribute(&self, module: &ModulePath, path: &syn::Path) -> Option<SymbolPath>;

    /// Bind a candidate declaration: qualifier, parameters, return shape and
    /// container. Shapes that cannot be bound are reported as a diagnostic.
    fn resolve_function(&self, candidate: &CandidateDeclaration) -> Result<FunctionSymbol, Diagnostic>;

    /// Whether `container` already has a function or constant called `name`.
    /// Resolvers without that knowledge answer `false`.
    fn declares(&self, _container: &ContainerId, _name: &str) -> bool {
        false
    }
}

#[derive(Debug, Default)]
struct ImportScope {
    /// Local name → imported path, as written (relative to the module).
    named: HashMap<String, Vec<String>>,
    globs: Vec<Vec<String>>,
}

/// Inherent impl seen while collecting, bound once every import is known.
struct PendingImpl {
    module: ModulePath,
    self_ty: Box<Type>,
    members: Vec<String>,
}

/// Resolves names through the module-level imports of the scanned sources.
///
/// Imports inside function bodies are not tracked. A single-segment path that
/// no explicit import binds is looked up through glob imports: attribute
/// paths only against the registered known exports, since the contents of
/// other crates are not visible here, and type paths against the types the
/// scanned modules declare.
#[derive(Debug, Default)]
pub struct SourceResolver {
    scopes: HashMap<ModulePath, ImportScope>,
    known_exports: HashSet<SymbolPath>,
    /// Type names declared at module level.
    types: HashMap<ModulePath, HashSet<String>>,
    /// Functions and constants per container, across all inherent impls.
    members: HashMap<ContainerId, HashSet<String>>,
}

impl SourceResolver {
    pub fn new(forest: &SourceForest) -> Self {
        let mut resolver = Self::default();
        let mut impls = Vec::new();
        for file in forest.files() {
            resolver.collect_items(&file.module, &file.ast.items, &mut impls);
        }
        for pending in impls {
            if let Some((container, _)) = resolver.type_container(&pending.module, &pending.self_ty) {
                resolver
                    .members
                    .entry(container)
                    .or_default()
                    .extend(pending.members);
            }
        }
        resolver
    }

    /// Register paths of external items that glob imports may bring into scope.
    pub fn with_known_exports<I>(mut self, exports: I) -> Self
    where
        I: IntoIterator<Item = SymbolPath>,
    {
        self.known_exports.extend(exports);
        self
    }

    fn collect_items(&mut self, module: &ModulePath, items: &[Item], impls: &mut Vec<PendingImpl>) {
        let mut declared_types = Vec::new();
        let mut module_members = Vec::new();
        for item in items {
            match item {
                Item::Struct(item) => declared_types.push(item.ident.unraw().to_string()),
                Item::Enum(item) => declared_types.push(item.ident.unraw().to_string()),
                Item::Union(item) => declared_types.push(item.ident.unraw().to_string()),
                Item::Type(item) => declared_types.push(item.ident.unraw().to_string()),
                Item::Fn(item) => module_members.push(item.sig.ident.unraw().to_string()),
                Item::Const(item) => module_members.push(item.ident.unraw().to_string()),
                Item::Static(item) => module_members.push(item.ident.unraw().to_string()),
                Item::Impl(item) if item.trait_.is_none() => impls.push(PendingImpl {
                    module: module.clone(),
                    self_ty: item.self_ty.clone(),
                    members: item
                        .items
                        .iter()
                        .filter_map(|member| match member {
                            ImplItem::Fn(member) => Some(member.sig.ident.unraw().to_string()),
                            ImplItem::Const(member) => Some(member.ident.unraw().to_string()),
                            _ => None,
                        })
                        .collect(),
                }),
                Item::Use(item_use) => {
                    let scope = self.scopes.entry(module.clone()).or_default();
                    flatten_use_tree(&item_use.tree, Vec::new(), scope);
                }
                Item::ExternCrate(extern_crate) => {
                    let krate = extern_crate.ident.unraw().to_string();
                    let target = if krate == "self" { "crate".to_string() } else { krate.clone() };
                    let local = match &extern_crate.rename {
                        Some((_, alias)) => alias.unraw().to_string(),
                        None => krate,
                    };
                    if local != target && local != "_" {
                        self.scopes
                            .entry(module.clone())
                            .or_default()
                            .named
                            .insert(local, vec![target]);
                    }
                }
                Item::Mod(item_mod) => {
                    if let Some((_, items)) = &item_mod.content {
                        let child = module.child(item_mod.ident.unraw().to_string());
                        self.collect_items(&child, items, impls);
                    }
                }
                _ => {}
            }
        }
        self.types
            .entry(module.clone())
            .or_default()
            .extend(declared_types);
        self.members
            .entry(ContainerId::module(module.clone()))
            .or_default()
            .extend(module_members);
    }

    /// Turn a path written in `module` into an absolute one. Local items start
    /// with `crate`; anything else is taken to be rooted at an external crate.
    fn absolutize(&self, module: &ModulePath, segments: Vec<String>) -> Option<Vec<String>> {
        let mut segments = segments;
        let mut used = HashSet::new();

        for _ in 0..MAX_IMPORT_DEPTH {
            let Some(first) = segments.first().cloned() else {
                return None;
            };

            match first.as_str() {
                "crate" => return Some(segments),
                "self" => {
                    let mut absolute = vec!["crate".to_string()];
                    absolute.extend(module.segments().iter().cloned());
                    absolute.extend(segments.into_iter().skip(1));
                    return Some(absolute);
                }
                "super" => {
                    let supers = segments.iter().take_while(|s| *s == "super").count();
                    let mut base = module.clone();
                    for _ in 0..supers {
                        base = base.parent()?;
                    }
                    let mut absolute = vec!["crate".to_string()];
                    absolute.extend(base.segments().iter().cloned());
                    absolute.extend(segments.into_iter().skip(supers));
                    return Some(absolute);
                }
                _ => {}
            }

            // A known export is a macro: importing it does not shadow a crate of
            // the same name at the head of a longer path.
            let imported = self
                .scopes
                .get(module)
                .and_then(|scope| scope.named.get(&first))
                .filter(|_| !used.contains(&first))
                .filter(|target| {
                    segments.len() == 1 || !self.known_exports.contains(&SymbolPath::new(target.iter()))
                });
            match imported {
                Some(target) => {
                    used.insert(first);
                    let mut expanded = target.clone();
                    expanded.extend(segments.into_iter().skip(1));
                    segments = expanded;
                }
                None => return Some(segments),
            }
        }

        Some(segments)
    }

    fn resolve_through_globs(&self, module: &ModulePath, name: &str) -> Option<SymbolPath> {
        let scope = self.scopes.get(module)?;
        scope.globs.iter().find_map(|glob| {
            let base = self.absolutize(module, glob.clone())?;
            let candidate = SymbolPath::new(base).join(&[name.to_string()]);
            self.known_exports.contains(&candidate).then_some(candidate)
        })
    }

    fn is_bound(&self, module: &ModulePath, name: &str) -> bool {
        self.scopes
            .get(module)
            .is_some_and(|scope| scope.named.contains_key(name))
    }

    fn declares_type(&self, module: &ModulePath, name: &str) -> bool {
        self.types.get(module).is_some_and(|types| types.contains(name))
    }

    /// Path of a type from the crate root, without the leading `crate`.
    fn type_path(&self, module: &ModulePath, segments: Vec<String>) -> Option<Vec<String>> {
        if let [name] = segments.as_slice() {
            if !self.is_bound(module, name) && !self.declares_type(module, name) {
                let from_glob: Option<Vec<String>> = self.scopes.get(module).and_then(|scope| {
                    scope.globs.iter().find_map(|glob| {
                        let base = self.absolutize(module, glob.clone())?;
                        let (head, rest) = base.split_first()?;
                        let declared = head == "crate"
                            && self.declares_type(&ModulePath::new(rest.iter().cloned()), name);
                        declared.then(|| rest.iter().cloned().chain([name.clone()]).collect())
                    })
                });
                if from_glob.is_some() {
                    return from_glob;
                }
            }
        }

        let absolute = self.absolutize(module, segments)?;
        let full: Vec<String> = match absolute.split_first() {
            Some((head, rest)) if head == "crate" => rest.to_vec(),
            _ => module.segments().iter().chain(&absolute).cloned().collect(),
        };
        (!full.is_empty()).then_some(full)
    }

    /// Container identity of an `impl` self type, together with its path from
    /// the crate root. Spellings of one type through `crate::`, `self::`,
    /// `super::` or imports all land on the same container.
    fn type_container(&self, module: &ModulePath, self_ty: &Type) -> Option<(ContainerId, Vec<String>)> {
        let full = self.type_path(module, written_path(self_ty)?)?;
        let (name, parent) = full.split_last()?;
        let container = ContainerId::of_type(ModulePath::new(parent.iter().cloned()), [name.clone()]);
        Some((container, full))
    }
}

fn flatten_use_tree(tree: &UseTree, prefix: Vec<String>, scope: &mut ImportScope) {
    match tree {
        UseTree::Path(path) => {
            let mut prefix = prefix;
            prefix.push(path.ident.unraw().to_string());
            flatten_use_tree(&path.tree, prefix, scope);
        }
        UseTree::Name(name) => {
            let ident = name.ident.unraw().to_string();
            if ident == "self" {
                if let Some(last) = prefix.last() {
                    scope.named.insert(last.clone(), prefix.clone());
                }
            } else {
                let mut target = prefix;
                target.push(ident.clone());
                scope.named.insert(ident, target);
            }
        }
        UseTree::Rename(rename) => {
            let alias = rename.rename.unraw().to_string();
            if alias == "_" {
                return;
            }
            let ident = rename.ident.unraw().to_string();
            let mut target = prefix;
            if ident != "self" {
                target.push(ident);
            }
            scope.named.insert(alias, target);
        }
        UseTree::Glob(_) => scope.globs.push(prefix),
        UseTree::Group(group) => {
            for item in &group.items {
                flatten_use_tree(item, prefix.clone(), scope);
            }
        }
    }
}

impl SymbolResolver for SourceResolver {
    fn resolve_attribute(&self, module: &ModulePath, path: &syn::Path) -> Option<SymbolPath> {
        let segments: Vec<String> = path
            .segments
            .iter()
            .map(|segment| segment.ident.unraw().to_string())
            .collect();

        if path.leading_colon.is_some() {
            return Some(SymbolPath::new(segments));
        }

        let first = segments.first()?;
        if segments.len() == 1 && !self.is_bound(module, first) {
            if let Some(resolved) = self.resolve_through_globs(module, first) {
                return Some(resolved);
            }
        }

        self.absolutize(module, segments).map(SymbolPath::new)
    }

    fn resolve_function(&self, candidate: &CandidateDeclaration) -> Result<FunctionSymbol, Diagnostic> {
        let fail = |code: DiagnosticCode, message: String| {
            Diagnostic::new(code, message).at(candidate.location.clone())
        };
        let sig = &candidate.sig;
        let name = &sig.ident;

        let (container, impl_header) = match &candidate.container {
            ContainerSyntax::Module => (ContainerId::module(candidate.module.clone()), None),
            ContainerSyntax::InherentImpl { self_ty, generics } => {
                let (container, full) =
                    self.type_container(&candidate.module, self_ty).ok_or_else(|| {
                        fail(
                            DiagnosticCode::UnresolvedSymbol,
                            format!(
                                "cannot resolve the self type `{}` of `{name}`",
                                quote::quote!(#self_ty)
                            ),
                        )
                    })?;
                // Units of a type defined elsewhere must not depend on the
                // impl block's own imports.
                let self_ty = if container.module == candidate.module {
                    self_ty.clone()
                } else {
                    Box::new(anchored(self_ty, &full))
                };
                let header = ImplHeader {
                    generics: generics.clone(),
                    self_ty,
                };
                (container, Some(header))
            }
            ContainerSyntax::TraitImpl { trait_path, .. } => {
                return Err(fail(
                    DiagnosticCode::UnsupportedContainer,
                    format!(
                        "`{name}` implements trait `{}`; wrappers can only be added to inherent impls and modules",
                        quote::quote!(#trait_path)
                    ),
                ));
            }
            ContainerSyntax::Trait { ident } => {
                return Err(fail(
                    DiagnosticCode::UnsupportedContainer,
                    format!("`{name}` is declared in trait `{ident}`; wrappers can only be added to inherent impls and modules"),
                ));
            }
        };

        if sig.unsafety.is_some() {
            return Err(fail(
                DiagnosticCode::UnsafeFunction,
                format!("`{name}` is unsafe and cannot be scheduled from a safe wrapper"),
            ));
        }

        let qualifier = match sig.receiver() {
            None => Qualifier::Static,
            Some(receiver) => {
                let kind = match receiver.ty.as_ref() {
                    Type::Reference(reference) if reference.mutability.is_some() => {
                        return Err(fail(
                            DiagnosticCode::UnsupportedReceiver,
                            format!("`{name}` takes `&mut self`, which cannot be shared with a background task"),
                        ));
                    }
                    Type::Reference(_) => ReceiverKind::Shared,
                    _ if receiver.colon_token.is_some() => ReceiverKind::Typed(receiver.ty.clone()),
                    _ => ReceiverKind::Value,
                };
                Qualifier::Instance(kind)
            }
        };

        let mut params = Vec::new();
        for input in &sig.inputs {
            let FnArg::Typed(pat_type) = input else {
                continue;
            };
            let ident = match pat_type.pat.as_ref() {
                Pat::Ident(pat_ident) if pat_ident.by_ref.is_none() && pat_ident.subpat.is_none() => {
                    pat_ident.ident.clone()
                }
                pat => {
                    return Err(fail(
                        DiagnosticCode::UnsupportedPattern,
                        format!(
                            "parameter `{}` of `{name}` must be a plain identifier to be forwarded",
                            quote::quote!(#pat)
                        ),
                    ));
                }
            };
            if borrows(&pat_type.ty) {
                return Err(fail(
                    DiagnosticCode::BorrowedParameter,
                    format!("parameter `{ident}` of `{name}` borrows data and cannot move into a background task"),
                ));
            }
            params.push(Param {
                name: ident,
                ty: (*pat_type.ty).clone(),
            });
        }

        if let ReturnType::Type(_, output) = &sig.output {
            if borrows(output) {
                return Err(fail(
                    DiagnosticCode::BorrowedReturn,
                    format!(
                        "`{name}` returns `{}`, which borrows data and cannot be handed back from a background task",
                        quote::quote!(#output)
                    ),
                ));
            }
        }

        Ok(FunctionSymbol {
            name: name.clone(),
            vis: candidate.vis.clone(),
            generics: sig.generics.clone(),
            qualifier,
            params,
            returns: AsyncReturn::from_output(&sig.output),
            is_async: candidate.is_async(),
            container,
            impl_header,
        })
    }

    fn declares(&self, container: &ContainerId, name: &str) -> bool {
        self.members
            .get(container)
            .is_some_and(|members| members.contains(name))
    }
}

fn peel(ty: &Type) -> &Type {
    match ty {
        Type::Paren(paren) => peel(&paren.elem),
        Type::Group(group) => peel(&group.elem),
        _ => ty,
    }
}

/// Path segments of an `impl` self type as written, generic arguments dropped.
fn written_path(ty: &Type) -> Option<Vec<String>> {
    match peel(ty) {
        Type::Path(type_path) if type_path.qself.is_none() => Some(
            type_path
                .path
                .segments
                .iter()
                .map(|segment| segment.ident.unraw().to_string())
                .collect(),
        ),
        _ => None,
    }
}

/// `ty` spelled as `crate::<full>`, keeping the generic arguments of its last
/// segment.
fn anchored(ty: &Type, full: &[String]) -> Type {
    let mut ty = peel(ty).clone();
    if let Type::Path(type_path) = &mut ty {
        let arguments = type_path
            .path
            .segments
            .last()
            .map(|segment| segment.arguments.clone())
            .unwrap_or_default();
        let mut path: syn::Path = syn::parse_quote!(crate);
        for segment in full {
            let ident = syn::parse_str::<Ident>(segment)
                .unwrap_or_else(|_| Ident::new_raw(segment, Span::call_site()));
            path.segments.push(PathSegment::from(ident));
        }
        if let Some(last) = path.segments.last_mut() {
            last.arguments = arguments;
        }
        type_path.path = path;
    }
    ty
}

/// Whether a type holds a non-`'static` borrow.
fn borrows(ty: &Type) -> bool {
    let mut finder = BorrowFinder::default();
    finder.visit_type(ty);
    finder.found
}

#[derive(Default)]
struct BorrowFinder {
    found: bool,
}

impl<'ast> Visit<'ast> for BorrowFinder {
    fn visit_type_reference(&mut self, node: &'ast syn::TypeReference) {
        if node.lifetime.is_none() {
            self.found = true;
        }
        visit::visit_type_reference(self, node);
    }

    fn visit_lifetime(&mut self, node: &'ast syn::Lifetime) {
        if node.ident != "static" {
            self.found = true;
        }
    }

    // Borrows inside `fn(&T)` and `Fn(&T)` signatures are higher-ranked, not held.
    fn visit_type_bare_fn(&mut self, _: &'ast syn::TypeBareFn) {}

    fn visit_parenthesized_generic_arguments(
        &mut self,
        _: &'ast syn::ParenthesizedGenericArguments,
    ) {
    }
}
