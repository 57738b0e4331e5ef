//! Declarations as they move through a generation pass.
//!
//! [`CandidateDeclaration`]s come out of the scanner, [`ResolvedTarget`]s out
//! of the resolver, and [`GenerationGroup`]s feed the emitter. None of them
//! outlive the pass that produced them.

use syn::{Attribute, Generics, Ident, ReturnType, Signature, Type, Visibility};

use crate::container::{ContainerId, ModulePath};
use crate::diagnostic::SourceLocation;

/// Syntactic scope a function was declared in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerSyntax {
    /// A free function directly inside a module.
    Module,
    InherentImpl {
        self_ty: Box<Type>,
        generics: Generics,
    },
    TraitImpl {
        trait_path: syn::Path,
        self_ty: Box<Type>,
    },
    Trait {
        ident: Ident,
    },
}

/// Block a nested declaration sits in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnclosingBody {
    /// Innermost function owning the block, if any (`const` initializers have none).
    pub function: Option<String>,
    /// Opening brace of the block.
    pub location: SourceLocation,
}

impl EnclosingBody {
    pub fn describe(&self) -> String {
        match &self.function {
            Some(function) => format!("the body of `{function}`"),
            None => format!("the block at {}", self.location),
        }
    }
}

/// A function declaration carrying at least one attribute. Nothing about it
/// has been resolved yet.
#[derive(Debug, Clone)]
pub struct CandidateDeclaration {
    pub attrs: Vec<Attribute>,
    pub vis: Visibility,
    pub sig: Signature,
    /// Module the declaration belongs to.
    pub module: ModulePath,
    pub container: ContainerSyntax,
    /// Innermost block around the declaration; `None` when it sits directly
    /// in a module.
    pub enclosing: Option<EnclosingBody>,
    pub location: SourceLocation,
}

impl CandidateDeclaration {
    pub fn name(&self) -> &Ident {
        &self.sig.ident
    }

    pub fn is_async(&self) -> bool {
        self.sig.asyncness.is_some()
    }

    pub fn is_nested(&self) -> bool {
        self.enclosing.is_some()
    }
}

/// How an instance method takes `self`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiverKind {
    /// `self` or `mut self`.
    Value,
    /// `&self`; the wrapper takes shared ownership instead.
    Shared,
    /// An explicitly typed owning receiver such as `self: Arc<Self>`.
    Typed(Box<Type>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Qualifier {
    Static,
    Instance(ReceiverKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: Ident,
    pub ty: Type,
}

/// Shape of the original return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncReturn {
    /// No return type, or `()`.
    NoValue,
    Value(Box<Type>),
}

impl AsyncReturn {
    pub fn from_output(output: &ReturnType) -> Self {
        match output {
            ReturnType::Default => AsyncReturn::NoValue,
            ReturnType::Type(_, ty) => match ty.as_ref() {
                Type::Tuple(tuple) if tuple.elems.is_empty() => AsyncReturn::NoValue,
                Type::Paren(paren) => {
                    AsyncReturn::from_output(&ReturnType::Type(Default::default(), paren.elem.clone()))
                }
                _ => AsyncReturn::Value(ty.clone()),
            },
        }
    }
}

/// Header of the inherent `impl` block a method came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplHeader {
    pub generics: Generics,
    pub self_ty: Box<Type>,
}

/// The bound view of a declaration, as produced by a symbol resolver.
#[derive(Debug, Clone)]
pub struct FunctionSymbol {
    pub name: Ident,
    pub vis: Visibility,
    pub generics: Generics,
    pub qualifier: Qualifier,
    pub params: Vec<Param>,
    pub returns: AsyncReturn,
    pub is_async: bool,
    pub container: ContainerId,
    /// `None` for free functions.
    pub impl_header: Option<ImplHeader>,
}

/// A declaration confirmed to carry the marker attribute.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub candidate: CandidateDeclaration,
    pub symbol: FunctionSymbol,
}

impl ResolvedTarget {
    pub fn location(&self) -> &SourceLocation {
        &self.candidate.location
    }
}

/// Targets sharing one container, in encounter order.
#[derive(Debug, Clone)]
pub struct GenerationGroup {
    pub container: ContainerId,
    /// Set for containers declared inside a block; such groups never emit.
    pub enclosing: Option<EnclosingBody>,
    pub targets: Vec<ResolvedTarget>,
}
