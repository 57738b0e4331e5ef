use std::fs;
use std::path::{Path, PathBuf};

use asyncify_core::{Error, GeneratorConfig, ModulePath, Result};
use cargo_toml::Manifest;
use log::debug;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::pipeline::{GenerationOutput, Generator};
use crate::source::{SourceFile, SourceForest};

/// `[package.metadata]` as far as the generator is concerned. Other tools'
/// tables are ignored.
#[derive(Debug, Default, Deserialize)]
struct PackageMetadata {
    #[serde(default)]
    asyncify: Option<GeneratorConfig>,
}

/// A crate on disk: its name, generator configuration and parsed sources.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub root_dir: PathBuf,
    pub config: GeneratorConfig,
    pub forest: SourceForest,
}

impl Project {
    /// Load the crate whose `Cargo.toml` sits in `root_dir`.
    pub fn load(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let root_dir = root_dir.into();
        let (name, config) = Self::read_manifest(&root_dir)?;
        let forest = Self::parse_sources(&root_dir.join("src"))?;
        debug!("loaded `{name}` with {} source files", forest.len());

        Ok(Self {
            name,
            root_dir,
            config,
            forest,
        })
    }

    pub fn generate(&self) -> GenerationOutput {
        Generator::new(self.config.clone()).generate(&self.forest)
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root_dir.join("src")
    }

    fn read_manifest(root_dir: &Path) -> Result<(String, GeneratorConfig)> {
        let path = root_dir.join("Cargo.toml");
        let bytes = fs::read(&path)?;
        // Parsed without target auto-discovery; only the package table is needed.
        let manifest = Manifest::<PackageMetadata>::from_slice_with_metadata(&bytes).map_err(|e| {
            Error::Manifest {
                path: path.clone(),
                message: e.to_string(),
            }
        })?;

        let package = manifest.package.ok_or_else(|| Error::Manifest {
            path: path.clone(),
            message: "no [package] section".to_string(),
        })?;
        let config = package
            .metadata
            .and_then(|metadata| metadata.asyncify)
            .unwrap_or_default();

        Ok((package.name, config))
    }

    fn parse_sources(src_dir: &Path) -> Result<SourceForest> {
        if !src_dir.is_dir() {
            return Err(Error::MissingSourceDir(src_dir.to_path_buf()));
        }

        let mut forest = SourceForest::new();
        for entry in WalkDir::new(src_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "rs") {
                continue;
            }
            let Some(module) = module_path_for(src_dir, path) else {
                debug!("skipping {}", path.display());
                continue;
            };

            let content = fs::read_to_string(path)?;
            forest.push(SourceFile::parse(path, module, &content)?);
        }
        Ok(forest)
    }
}

/// Module path of a source file from its position under `src/`.
///
/// `lib.rs` and `main.rs` are the crate root, `a/mod.rs` and `a.rs` are
/// `crate::a`. Binaries under `src/bin/` and files whose names are not valid
/// module names give `None`.
pub fn module_path_for(src_dir: &Path, file: &Path) -> Option<ModulePath> {
    let relative = file.strip_prefix(src_dir).ok()?;
    let mut segments: Vec<String> = relative
        .iter()
        .map(|component| component.to_str().map(str::to_string))
        .collect::<Option<_>>()?;

    let file_name = segments.pop()?;
    let stem = file_name.strip_suffix(".rs")?.to_string();

    if segments.first().is_some_and(|first| first == "bin") {
        return None;
    }
    match stem.as_str() {
        "lib" | "main" if segments.is_empty() => {}
        "mod" => {}
        _ => segments.push(stem),
    }

    let valid = segments.iter().all(|segment| {
        !segment.is_empty()
            && !segment.starts_with(|c: char| c.is_ascii_digit())
            && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    });
    valid.then(|| ModulePath::new(segments))
}
