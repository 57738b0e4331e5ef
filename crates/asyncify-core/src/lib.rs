//! Core types for the asyncify generator.
//!
//! This crate defines the data that flows through a generation pass
//! (candidates, resolved targets, groups, emitted units), the marker attribute
//! definition, diagnostics, configuration and the error type. It contains no
//! scanning or emission logic; that lives in `asyncify-compiler`.

pub mod config;
pub mod container;
pub mod declaration;
pub mod diagnostic;
pub mod error;
pub mod marker;
pub mod unit;

pub use config::{GeneratorConfig, Runtime};
pub use container::{ContainerId, ModulePath, GENERATED_DIR, UNIT_EXTENSION};
pub use declaration::{
    AsyncReturn, CandidateDeclaration, ContainerSyntax, EnclosingBody, FunctionSymbol,
    GenerationGroup, ImplHeader, Param, Qualifier, ReceiverKind, ResolvedTarget,
};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity, SourceLocation};
pub use error::{Error, Result};
pub use marker::{AttributeTarget, MarkerDefinition, SymbolPath, MARKER_NAME};
pub use unit::{EmittedUnit, ImplSection, WrapperFn, WrapperUnit};
