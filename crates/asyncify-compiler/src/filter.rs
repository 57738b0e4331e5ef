//! Marker filtering and grouping.

use std::collections::HashMap;

use asyncify_core::{
    CandidateDeclaration, ContainerId, Diagnostic, DiagnosticCode, EnclosingBody,
    GenerationGroup, MarkerDefinition, ResolvedTarget,
};
use log::debug;

use crate::resolver::SymbolResolver;

/// Keeps the candidates whose attributes resolve to the marker and binds them.
pub struct AttributeFilter<'a, R: ?Sized> {
    resolver: &'a R,
    marker: &'a MarkerDefinition,
}

impl<'a, R: SymbolResolver + ?Sized> AttributeFilter<'a, R> {
    pub fn new(resolver: &'a R, marker: &'a MarkerDefinition) -> Self {
        Self { resolver, marker }
    }

    pub fn is_marked(&self, candidate: &CandidateDeclaration) -> bool {
        candidate.attrs.iter().any(|attr| {
            self.resolver
                .resolve_attribute(&candidate.module, attr.path())
                .is_some_and(|resolved| self.marker.matches(&resolved))
        })
    }

    /// Resolve every marked candidate. Failures are appended to `diagnostics`
    /// and drop only the candidate concerned.
    pub fn filter(
        &self,
        candidates: Vec<CandidateDeclaration>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<ResolvedTarget> {
        let mut targets = Vec::new();
        for candidate in candidates {
            if !self.is_marked(&candidate) {
                continue;
            }
            if candidate.is_async() {
                debug!(
                    "skipping `{}` at {}: already async",
                    candidate.name(),
                    candidate.location
                );
                continue;
            }
            match self.resolver.resolve_function(&candidate) {
                Ok(symbol) => targets.push(ResolvedTarget { candidate, symbol }),
                Err(diagnostic) => diagnostics.push(diagnostic),
            }
        }
        targets
    }
}

/// Group targets by container. Groups keep first-encounter order and targets
/// keep encounter order within their group. Containers declared inside
/// different blocks are different containers even when they share a name.
pub fn group_by_container(targets: Vec<ResolvedTarget>) -> Vec<GenerationGroup> {
    let mut index: HashMap<(ContainerId, Option<EnclosingBody>), usize> = HashMap::new();
    let mut groups: Vec<GenerationGroup> = Vec::new();

    for target in targets {
        let key = (
            target.symbol.container.clone(),
            target.candidate.enclosing.clone(),
        );
        match index.get(&key) {
            Some(&position) => groups[position].targets.push(target),
            None => {
                index.insert(key, groups.len());
                groups.push(GenerationGroup {
                    container: target.symbol.container.clone(),
                    enclosing: target.candidate.enclosing.clone(),
                    targets: vec![target],
                });
            }
        }
    }

    groups
}

/// Drop groups declared inside function bodies, one diagnostic per group.
pub fn reject_nested(
    groups: Vec<GenerationGroup>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<GenerationGroup> {
    groups
        .into_iter()
        .filter(|group| {
            let Some(enclosing) = &group.enclosing else {
                return true;
            };
            let subject = if group.container.is_type() {
                format!("type `{}` is", group.container.name())
            } else {
                let names: Vec<String> = group
                    .targets
                    .iter()
                    .map(|target| format!("`{}`", target.symbol.name))
                    .collect();
                let verb = if names.len() == 1 { "is" } else { "are" };
                format!("{} {verb}", names.join(", "))
            };
            let mut diagnostic = Diagnostic::new(
                DiagnosticCode::NestedContainer,
                format!(
                    "{subject} declared inside {}; wrappers can only be generated for items at module level",
                    enclosing.describe()
                ),
            );
            if let Some(first) = group.targets.first() {
                diagnostic = diagnostic.at(first.location().clone());
            }
            diagnostics.push(diagnostic);
            false
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::SourceResolver;
    use crate::scanner::Scanner;
    use crate::source::SourceForest;
    use asyncify_core::ModulePath;

    fn run(source: &str) -> (Vec<GenerationGroup>, Vec<Diagnostic>) {
        let forest =
            SourceForest::from_sources([("src/lib.rs", ModulePath::root(), source)]).unwrap();
        let resolver = SourceResolver::new(&forest);
        let marker = MarkerDefinition::asyncify();
        let filter = AttributeFilter::new(&resolver, &marker);
        let mut diagnostics = Vec::new();
        let targets = filter.filter(Scanner::scan(&forest), &mut diagnostics);
        let groups = reject_nested(group_by_container(targets), &mut diagnostics);
        (groups, diagnostics)
    }

    fn names(group: &GenerationGroup) -> Vec<String> {
        group
            .targets
            .iter()
            .map(|t| t.symbol.name.to_string())
            .collect()
    }

    #[test]
    fn test_keeps_only_marker() {
        let (groups, diagnostics) = run(
            r#"
            use asyncify::asyncify;

            #[asyncify]
            fn marked() {}

            #[inline]
            fn inlined() {}

            #[other_crate::asyncify]
            fn lookalike() {}
            "#,
        );
        assert!(diagnostics.is_empty());
        assert_eq!(groups.len(), 1);
        assert_eq!(names(&groups[0]), vec!["marked"]);
    }

    #[test]
    fn test_same_name_from_other_crate_is_not_marker() {
        let (groups, diagnostics) = run(
            r#"
            use other_crate::asyncify;

            #[asyncify]
            fn not_ours() {}
            "#,
        );
        assert!(groups.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_async_targets_skip_silently() {
        let (groups, diagnostics) = run(
            r#"
            #[asyncify::asyncify]
            async fn already() {}
            "#,
        );
        assert!(groups.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_groups_preserve_encounter_order() {
        let (groups, _) = run(
            r#"
            use asyncify::prelude::*;

            struct B;
            struct A;

            impl B {
                #[asyncify::asyncify] fn b1() {}
            }
            impl A {
                #[asyncify::asyncify] fn a1() {}
            }
            impl B {
                #[asyncify::asyncify] fn b2() {}
            }
            "#,
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].container.name(), "B");
        assert_eq!(names(&groups[0]), vec!["b1", "b2"]);
        assert_eq!(names(&groups[1]), vec!["a1"]);
    }

    #[test]
    fn test_nested_group_yields_one_diagnostic() {
        let (groups, diagnostics) = run(
            r#"
            fn outer() {
                struct Local;
                impl Local {
                    #[asyncify::asyncify] fn one() {}
                    #[asyncify::asyncify] fn two() {}
                }
            }
            "#,
        );
        assert!(groups.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::NestedContainer);
        assert!(diagnostics[0].location.is_some());
    }

    #[test]
    fn test_same_named_local_types_are_reported_separately() {
        let (groups, diagnostics) = run(
            r#"
            fn a() {
                struct L;
                impl L { #[asyncify::asyncify] fn one() {} }
            }
            fn b() {
                struct L;
                impl L { #[asyncify::asyncify] fn two() {} }
            }
            "#,
        );
        assert!(groups.is_empty());
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].message.starts_with("type `L` is declared inside the body of `a`"));
        assert!(diagnostics[1].message.starts_with("type `L` is declared inside the body of `b`"));
    }

    #[test]
    fn test_nested_free_function_names_its_host() {
        let (groups, diagnostics) = run(
            r#"
            fn c() {
                #[asyncify::asyncify]
                fn free_local() {}
            }
            "#,
        );
        assert!(groups.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::NestedContainer);
        assert!(diagnostics[0]
            .message
            .starts_with("`free_local` is declared inside the body of `c`"));
    }

    #[test]
    fn test_rejected_candidate_leaves_siblings() {
        let (groups, diagnostics) = run(
            r#"
            struct Worker;
            impl Worker {
                #[asyncify::asyncify] fn bad(&mut self) {}
                #[asyncify::asyncify] fn good(self) {}
            }
            "#,
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::UnsupportedReceiver);
        assert_eq!(names(&groups[0]), vec!["good"]);
    }
}
