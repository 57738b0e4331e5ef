//! Module paths and container identities.
//!
//! A container is where generated wrappers are attached: either a type with
//! inherent `impl` blocks, or a module holding free functions. The file name of
//! an emitted unit is derived from the container identity alone.

use std::fmt;

use serde::Serialize;

/// File extension shared by every emitted unit.
pub const UNIT_EXTENSION: &str = "asyncify.rs";

/// Subdirectory of `OUT_DIR` that build scripts write units into.
pub const GENERATED_DIR: &str = "asyncify";

/// Path of a module relative to the crate root.
///
/// The root module has no segments and displays as `crate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModulePath(Vec<String>);

impl ModulePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("crate")?;
        for segment in &self.0 {
            write!(f, "::{segment}")?;
        }
        Ok(())
    }
}

/// Identity of a containing type or module.
///
/// Types are identified by the module that holds the `impl` block plus the
/// self type path with generic arguments stripped, so `impl Foo<u8>` and
/// `impl Foo<u16>` in one module share a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ContainerId {
    pub module: ModulePath,
    pub ty: Option<Vec<String>>,
}

impl ContainerId {
    pub fn module(module: ModulePath) -> Self {
        Self { module, ty: None }
    }

    pub fn of_type<I, S>(module: ModulePath, ty: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            module,
            ty: Some(ty.into_iter().map(Into::into).collect()),
        }
    }

    pub fn is_type(&self) -> bool {
        self.ty.is_some()
    }

    /// Short name of the container: the type's last segment, or the module's.
    pub fn name(&self) -> &str {
        match &self.ty {
            Some(ty) => ty.last().map(String::as_str).unwrap_or_default(),
            None => self
                .module
                .segments()
                .last()
                .map(String::as_str)
                .unwrap_or("crate"),
        }
    }

    /// File name of the unit generated for this container.
    ///
    /// `<module segments joined by '.', or "crate">[-<type segments joined by '.'>].asyncify.rs`.
    /// Neither `.` nor `-` can occur inside an identifier, so distinct
    /// containers never share a unit name.
    pub fn unit_name(&self) -> String {
        let module = if self.module.is_root() {
            "crate".to_string()
        } else {
            self.module.segments().join(".")
        };
        match &self.ty {
            Some(ty) => format!("{module}-{}.{UNIT_EXTENSION}", ty.join(".")),
            None => format!("{module}.{UNIT_EXTENSION}"),
        }
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.module)?;
        if let Some(ty) = &self.ty {
            for segment in ty {
                write!(f, "::{segment}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_path_display() {
        assert_eq!(ModulePath::root().to_string(), "crate");
        assert_eq!(ModulePath::new(["test_app", "inner"]).to_string(), "crate::test_app::inner");
    }

    #[test]
    fn test_module_path_parent() {
        let path = ModulePath::new(["a", "b"]);
        assert_eq!(path.parent(), Some(ModulePath::new(["a"])));
        assert_eq!(ModulePath::root().parent(), None);
    }

    #[test]
    fn test_unit_names() {
        let program = ContainerId::of_type(ModulePath::new(["test_app"]), ["Program"]);
        assert_eq!(program.unit_name(), "test_app-Program.asyncify.rs");

        let root_type = ContainerId::of_type(ModulePath::root(), ["Program"]);
        assert_eq!(root_type.unit_name(), "crate-Program.asyncify.rs");

        let module = ContainerId::module(ModulePath::new(["a", "b"]));
        assert_eq!(module.unit_name(), "a.b.asyncify.rs");
        assert_eq!(ContainerId::module(ModulePath::root()).unit_name(), "crate.asyncify.rs");
    }

    #[test]
    fn test_unit_names_do_not_collide() {
        // type `b` in module `a` versus module `a::b`
        let ty = ContainerId::of_type(ModulePath::new(["a"]), ["b"]);
        let module = ContainerId::module(ModulePath::new(["a", "b"]));
        assert_ne!(ty.unit_name(), module.unit_name());
    }

    #[test]
    fn test_unit_name_is_pure() {
        let a = ContainerId::of_type(ModulePath::new(["m"]), ["Foo"]);
        let b = ContainerId::of_type(ModulePath::new(["m"]), ["Foo"]);
        assert_eq!(a.unit_name(), b.unit_name());
        assert_eq!(a.to_string(), "crate::m::Foo");
        assert_eq!(a.name(), "Foo");
    }
}
