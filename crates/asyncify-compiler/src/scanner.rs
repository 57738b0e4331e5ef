//! Declaration scanning.
//!
//! Walks every file of a [`SourceForest`] and collects function declarations
//! that carry at least one attribute (doc comments do not count). This is a
//! purely syntactic pass: whether an attribute is the marker is decided later
//! by the resolver.

use std::mem;
use std::path::Path;

use asyncify_core::{CandidateDeclaration, ContainerSyntax, EnclosingBody, ModulePath, SourceLocation};
use syn::ext::IdentExt;
use syn::visit::{self, Visit};
use syn::{Attribute, Block, ImplItemFn, ItemFn, ItemImpl, ItemMod, ItemTrait, Signature, TraitItemFn, Visibility};

use crate::source::{SourceFile, SourceForest};

/// Collects candidate declarations in document order.
///
/// A scanner holds nothing but its own result list, so every pass starts from
/// a fresh one.
#[derive(Debug, Default)]
pub struct Scanner {
    candidates: Vec<CandidateDeclaration>,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan a whole forest, files in the order they were supplied.
    pub fn scan(forest: &SourceForest) -> Vec<CandidateDeclaration> {
        let mut scanner = Self::new();
        for file in forest.files() {
            scanner.scan_file(file);
        }
        scanner.finish()
    }

    pub fn scan_file(&mut self, file: &SourceFile) {
        let mut visitor = ScanVisitor {
            file: &file.path,
            module: file.module.clone(),
            containers: Vec::new(),
            functions: Vec::new(),
            bodies: Vec::new(),
            candidates: &mut self.candidates,
        };
        visitor.visit_file(&file.ast);
    }

    pub fn finish(self) -> Vec<CandidateDeclaration> {
        self.candidates
    }
}

/// Whether a declaration carries any attribute other than documentation.
fn has_attributes(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| !attr.path().is_ident("doc"))
}

struct ScanVisitor<'a> {
    file: &'a Path,
    module: ModulePath,
    /// Innermost syntactic container last.
    containers: Vec<ContainerSyntax>,
    /// Names of the functions whose bodies are being walked, innermost last.
    functions: Vec<String>,
    /// Enclosing blocks; anything found while this is non-empty is nested.
    bodies: Vec<EnclosingBody>,
    candidates: &'a mut Vec<CandidateDeclaration>,
}

impl ScanVisitor<'_> {
    fn current_container(&self) -> ContainerSyntax {
        self.containers
            .last()
            .cloned()
            .unwrap_or(ContainerSyntax::Module)
    }

    fn location(&self, span: proc_macro2::Span) -> SourceLocation {
        let start = span.start();
        SourceLocation::new(self.file, start.line, start.column + 1)
    }

    fn visit_fn_body(&mut self, sig: &Signature, block: &Block) {
        self.functions.push(sig.ident.unraw().to_string());
        self.visit_block(block);
        self.functions.pop();
    }

    fn record(&mut self, attrs: &[Attribute], vis: &Visibility, sig: &Signature) {
        if !has_attributes(attrs) {
            return;
        }

        let location = self.location(sig.ident.span());
        self.candidates.push(CandidateDeclaration {
            attrs: attrs.to_vec(),
            vis: vis.clone(),
            sig: sig.clone(),
            module: self.module.clone(),
            container: self.current_container(),
            enclosing: self.bodies.last().cloned(),
            location,
        });
    }
}

impl<'ast> Visit<'ast> for ScanVisitor<'_> {
    fn visit_item_mod(&mut self, node: &'ast ItemMod) {
        // Out-of-line modules arrive as separate files of the forest.
        let Some((_, items)) = &node.content else {
            return;
        };

        let child = self.module.child(node.ident.unraw().to_string());
        let parent = mem::replace(&mut self.module, child);
        self.containers.push(ContainerSyntax::Module);
        for item in items {
            self.visit_item(item);
        }
        self.containers.pop();
        self.module = parent;
    }

    fn visit_item_fn(&mut self, node: &'ast ItemFn) {
        self.record(&node.attrs, &node.vis, &node.sig);
        self.visit_fn_body(&node.sig, &node.block);
    }

    fn visit_item_impl(&mut self, node: &'ast ItemImpl) {
        let container = match &node.trait_ {
            Some((_, trait_path, _)) => ContainerSyntax::TraitImpl {
                trait_path: trait_path.clone(),
                self_ty: node.self_ty.clone(),
            },
            None => ContainerSyntax::InherentImpl {
                self_ty: node.self_ty.clone(),
                generics: node.generics.clone(),
            },
        };

        self.containers.push(container);
        for item in &node.items {
            self.visit_impl_item(item);
        }
        self.containers.pop();
    }

    fn visit_impl_item_fn(&mut self, node: &'ast ImplItemFn) {
        self.record(&node.attrs, &node.vis, &node.sig);
        self.visit_fn_body(&node.sig, &node.block);
    }

    fn visit_item_trait(&mut self, node: &'ast ItemTrait) {
        self.containers.push(ContainerSyntax::Trait {
            ident: node.ident.clone(),
        });
        for item in &node.items {
            self.visit_trait_item(item);
        }
        self.containers.pop();
    }

    fn visit_trait_item_fn(&mut self, node: &'ast TraitItemFn) {
        self.record(&node.attrs, &Visibility::Inherited, &node.sig);
        if let Some(block) = &node.default {
            self.visit_fn_body(&node.sig, block);
        }
    }

    fn visit_block(&mut self, node: &'ast Block) {
        let body = EnclosingBody {
            function: self.functions.last().cloned(),
            location: self.location(node.brace_token.span.open()),
        };
        self.bodies.push(body);
        self.containers.push(ContainerSyntax::Module);
        visit::visit_block(self, node);
        self.containers.pop();
        self.bodies.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Vec<CandidateDeclaration> {
        let forest =
            SourceForest::from_sources([("src/lib.rs", ModulePath::root(), source)]).unwrap();
        Scanner::scan(&forest)
    }

    fn names(candidates: &[CandidateDeclaration]) -> Vec<String> {
        candidates.iter().map(|c| c.name().to_string()).collect()
    }

    #[test]
    fn test_collects_annotated_functions_in_document_order() {
        let candidates = scan(
            r#"
            #[asyncify]
            fn first() {}

            fn unannotated() {}

            /// Documented only.
            fn documented() {}

            #[inline]
            fn second() {}
            "#,
        );
        assert_eq!(names(&candidates), vec!["first", "second"]);
        assert!(candidates.iter().all(|c| c.container == ContainerSyntax::Module));
        assert!(candidates.iter().all(|c| !c.is_nested()));
    }

    #[test]
    fn test_impl_methods_carry_their_container() {
        let candidates = scan(
            r#"
            struct Program;

            impl Program {
                #[asyncify]
                fn print_number(number: i32) {}

                #[asyncify]
                fn sum(&self, a: u64, b: u64) -> u64 { a + b }
            }
            "#,
        );
        assert_eq!(names(&candidates), vec!["print_number", "sum"]);
        let ContainerSyntax::InherentImpl { self_ty, .. } = &candidates[0].container else {
            panic!("expected inherent impl container");
        };
        let expected: syn::Type = syn::parse_quote!(Program);
        assert_eq!(**self_ty, expected);
    }

    #[test]
    fn test_inline_modules_extend_the_module_path() {
        let candidates = scan(
            r#"
            mod test_app {
                mod inner {
                    #[asyncify]
                    fn deep() {}
                }

                #[asyncify]
                fn shallow() {}
            }
            "#,
        );
        assert_eq!(names(&candidates), vec!["deep", "shallow"]);
        assert_eq!(candidates[0].module, ModulePath::new(["test_app", "inner"]));
        assert_eq!(candidates[1].module, ModulePath::new(["test_app"]));
    }

    #[test]
    fn test_declarations_inside_bodies_are_nested() {
        let candidates = scan(
            r#"
            fn outer() {
                struct Local;

                impl Local {
                    #[asyncify]
                    fn hidden() {}
                }

                #[asyncify]
                fn local_fn() {}
            }
            "#,
        );
        assert_eq!(names(&candidates), vec!["hidden", "local_fn"]);
        assert!(candidates.iter().all(|c| c.is_nested()));
        let enclosing = candidates[0].enclosing.as_ref().unwrap();
        assert_eq!(enclosing.function.as_deref(), Some("outer"));
        assert_eq!(enclosing.location.line, 2);
        assert!(matches!(candidates[0].container, ContainerSyntax::InherentImpl { .. }));
        assert_eq!(candidates[1].container, ContainerSyntax::Module);
    }

    #[test]
    fn test_enclosing_body_is_innermost() {
        let candidates = scan(
            r#"
            fn a() {
                #[asyncify]
                fn first() {
                    #[asyncify]
                    fn second() {}
                }
            }
            fn b() {
                { #[asyncify] fn third() {} }
            }
            "#,
        );
        let functions: Vec<_> = candidates
            .iter()
            .map(|c| c.enclosing.as_ref().and_then(|body| body.function.clone()))
            .collect();
        assert_eq!(
            functions,
            vec![Some("a".to_string()), Some("first".to_string()), Some("b".to_string())]
        );
        // The bare block inside `b` is its own body.
        assert_eq!(candidates[2].enclosing.as_ref().unwrap().location.line, 10);
    }

    #[test]
    fn test_trait_members_are_collected() {
        let candidates = scan(
            r#"
            trait Job {
                #[asyncify]
                fn run(&self) {}
            }

            impl Job for () {
                #[asyncify]
                fn run(&self) {}
            }
            "#,
        );
        assert!(matches!(candidates[0].container, ContainerSyntax::Trait { .. }));
        assert!(matches!(candidates[1].container, ContainerSyntax::TraitImpl { .. }));
    }

    #[test]
    fn test_records_source_location() {
        let candidates = scan("struct S;\nimpl S {\n    #[asyncify]\n    fn located() {}\n}\n");
        let location = &candidates[0].location;
        assert_eq!(location.file, Path::new("src/lib.rs"));
        assert_eq!(location.line, 4);
        assert_eq!(location.column, 8);
    }

    #[test]
    fn test_rescanning_starts_fresh() {
        let forest = SourceForest::from_sources([(
            "src/lib.rs",
            ModulePath::root(),
            "#[asyncify] fn once() {}",
        )])
        .unwrap();
        assert_eq!(Scanner::scan(&forest).len(), 1);
        assert_eq!(Scanner::scan(&forest).len(), 1);
    }
}
