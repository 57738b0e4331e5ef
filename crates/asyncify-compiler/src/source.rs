//! Parsed source files handed to a generation pass.

use std::path::{Path, PathBuf};

use asyncify_core::{Error, ModulePath, Result};

/// One parsed file together with the module it defines.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub module: ModulePath,
    pub ast: syn::File,
}

impl SourceFile {
    pub fn parse(path: impl Into<PathBuf>, module: ModulePath, content: &str) -> Result<Self> {
        let path = path.into();
        let ast = syn::parse_file(content).map_err(|source| Error::Parse {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, module, ast })
    }
}

/// The files of one crate, in the order they are scanned.
#[derive(Debug, Clone, Default)]
pub struct SourceForest {
    files: Vec<SourceFile>,
}

impl SourceForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `(path, module, content)` triples into a forest.
    pub fn from_sources<I, P, S>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, ModulePath, S)>,
        P: Into<PathBuf>,
        S: AsRef<str>,
    {
        let mut forest = Self::new();
        for (path, module, content) in sources {
            forest.push(SourceFile::parse(path, module, content.as_ref())?);
        }
        Ok(forest)
    }

    pub fn push(&mut self, file: SourceFile) {
        self.files.push(file);
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|file| file.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
