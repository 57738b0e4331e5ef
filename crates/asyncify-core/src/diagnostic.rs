//! Non-fatal generation diagnostics.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Where a declaration was found. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    /// The container is declared inside a function body or block.
    NestedContainer,
    /// Trait definitions and trait impls cannot receive inherent wrappers.
    UnsupportedContainer,
    /// The declaration could not be bound (e.g. a non-path self type).
    UnresolvedSymbol,
    /// The derived wrapper name is empty, unchanged, not an identifier, or
    /// already taken by a member of the container.
    DegenerateName,
    /// `&mut self` cannot be handed to a background task.
    UnsupportedReceiver,
    /// A parameter borrows data that cannot move into a background task.
    BorrowedParameter,
    /// The return type borrows data, so it cannot come back through a join handle.
    BorrowedReturn,
    /// A parameter is bound by a pattern rather than a plain identifier.
    UnsupportedPattern,
    UnsafeFunction,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::NestedContainer => "nested-container",
            DiagnosticCode::UnsupportedContainer => "unsupported-container",
            DiagnosticCode::UnresolvedSymbol => "unresolved-symbol",
            DiagnosticCode::DegenerateName => "degenerate-name",
            DiagnosticCode::UnsupportedReceiver => "unsupported-receiver",
            DiagnosticCode::BorrowedParameter => "borrowed-parameter",
            DiagnosticCode::BorrowedReturn => "borrowed-return",
            DiagnosticCode::UnsupportedPattern => "unsupported-pattern",
            DiagnosticCode::UnsafeFunction => "unsafe-function",
        }
    }

    /// Degenerate names come from the configured suffix rather than the
    /// annotated code, so they are reported as warnings.
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticCode::DegenerateName => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A problem with one declaration or container. The pass records it, drops the
/// offending item and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: code.severity(),
            code,
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{location}: ")?;
        }
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_location() {
        let diagnostic = Diagnostic::new(DiagnosticCode::NestedContainer, "nested")
            .at(SourceLocation::new("src/lib.rs", 4, 9));
        assert_eq!(
            diagnostic.to_string(),
            "src/lib.rs:4:9: error[nested-container]: nested"
        );
    }

    #[test]
    fn test_severity_follows_code() {
        assert!(Diagnostic::new(DiagnosticCode::UnresolvedSymbol, "x").is_error());
        assert!(!Diagnostic::new(DiagnosticCode::DegenerateName, "x").is_error());
    }

    #[test]
    fn test_serializes_code_in_kebab_case() {
        let diagnostic = Diagnostic::new(DiagnosticCode::BorrowedParameter, "borrowed");
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["code"], "borrowed-parameter");
        assert_eq!(json["severity"], "error");
    }
}
