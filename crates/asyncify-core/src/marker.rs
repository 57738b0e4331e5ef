//! The marker attribute definition.
//!
//! The `#[asyncify]` attribute itself lives in `asyncify-macros`; this module
//! describes its identity so the resolver can recognise it after import
//! resolution, independent of the name it is spelled with at the use site.

use std::fmt;

use serde::Serialize;

/// Name the marker attribute is exported under.
pub const MARKER_NAME: &str = "asyncify";

/// A fully resolved path such as `asyncify::asyncify` or `crate::util::helper`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolPath(Vec<String>);

impl SymbolPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn join(&self, rest: &[String]) -> Self {
        let mut segments = self.0.clone();
        segments.extend(rest.iter().cloned());
        Self(segments)
    }
}

impl fmt::Display for SymbolPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("::"))
    }
}

/// Declarations an attribute may be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttributeTarget {
    Function,
}

/// The registered marker attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerDefinition {
    identities: Vec<SymbolPath>,
    pub target: AttributeTarget,
    pub repeatable: bool,
    pub inherited: bool,
}

impl MarkerDefinition {
    /// A marker known under the given resolved paths.
    pub fn new<I>(identities: I) -> Self
    where
        I: IntoIterator<Item = SymbolPath>,
    {
        Self {
            identities: identities.into_iter().collect(),
            target: AttributeTarget::Function,
            repeatable: false,
            inherited: false,
        }
    }

    /// `#[asyncify]` as exported by the facade crate, its prelude and the
    /// macro crate.
    pub fn asyncify() -> Self {
        Self::new([
            SymbolPath::new(["asyncify", MARKER_NAME]),
            SymbolPath::new(["asyncify", "prelude", MARKER_NAME]),
            SymbolPath::new(["asyncify_macros", MARKER_NAME]),
        ])
    }

    pub fn identities(&self) -> &[SymbolPath] {
        &self.identities
    }

    /// Whether a resolved attribute path denotes this marker.
    pub fn matches(&self, resolved: &SymbolPath) -> bool {
        self.identities.iter().any(|identity| identity == resolved)
    }
}

impl Default for MarkerDefinition {
    fn default() -> Self {
        Self::asyncify()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_path_display_and_join() {
        let path = SymbolPath::new(["asyncify"]).join(&["prelude".to_string(), "asyncify".to_string()]);
        assert_eq!(path, SymbolPath::new(["asyncify", "prelude", "asyncify"]));
        assert_eq!(path.to_string(), "asyncify::prelude::asyncify");
    }

    #[test]
    fn test_marker_matches_resolved_identity_only() {
        let marker = MarkerDefinition::asyncify();
        assert!(marker.matches(&SymbolPath::new(["asyncify", "asyncify"])));
        assert!(marker.matches(&SymbolPath::new(["asyncify_macros", "asyncify"])));
        assert!(!marker.matches(&SymbolPath::new(["other", "asyncify"])));
        assert!(!marker.matches(&SymbolPath::new(["asyncify"])));
    }

    #[test]
    fn test_marker_restrictions() {
        let marker = MarkerDefinition::default();
        assert_eq!(marker.target, AttributeTarget::Function);
        assert!(!marker.repeatable);
        assert!(!marker.inherited);
    }
}
