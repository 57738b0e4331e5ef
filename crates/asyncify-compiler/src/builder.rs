use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use asyncify_core::{
    Diagnostic, EmittedUnit, Error, GeneratorConfig, Result, GENERATED_DIR, UNIT_EXTENSION,
};
use log::{info, warn};

use crate::pipeline::Generator;
use crate::project::Project;

/// Runs a generation pass from a build script and writes the units where
/// `asyncify::include_generated!` expects them.
///
/// ```ignore
/// // build.rs
/// fn main() {
///     asyncify_compiler::Builder::from_env()
///         .and_then(|builder| builder.build())
///         .expect("asyncify generation failed");
/// }
/// ```
pub struct Builder {
    root_dir: PathBuf,
    out_dir: PathBuf,
    config: Option<GeneratorConfig>,
    cargo_directives: bool,
}

impl Builder {
    pub fn new(root_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            out_dir: out_dir.into(),
            config: None,
            cargo_directives: false,
        }
    }

    /// Builder for the crate Cargo is currently building. Emits `cargo:`
    /// directives.
    pub fn from_env() -> Result<Self> {
        let root_dir = env_path("CARGO_MANIFEST_DIR")?;
        let out_dir = env_path("OUT_DIR")?;
        Ok(Self::new(root_dir, out_dir).with_cargo_directives(true))
    }

    /// Use `config` instead of `[package.metadata.asyncify]`.
    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_cargo_directives(mut self, enabled: bool) -> Self {
        self.cargo_directives = enabled;
        self
    }

    pub fn generated_dir(&self) -> PathBuf {
        self.out_dir.join(GENERATED_DIR)
    }

    pub fn build(&self) -> Result<BuildOutput> {
        let project = Project::load(&self.root_dir)?;
        let config = self.config.clone().unwrap_or_else(|| project.config.clone());
        let output = Generator::new(config).generate(&project.forest);

        if self.cargo_directives {
            println!("cargo:rerun-if-changed={}", self.root_dir.join("Cargo.toml").display());
            println!("cargo:rerun-if-changed={}", project.source_dir().display());
            for path in project.forest.paths() {
                println!("cargo:rerun-if-changed={}", path.display());
            }
        }

        for diagnostic in &output.diagnostics {
            warn!("{diagnostic}");
            if self.cargo_directives {
                println!("cargo:warning={diagnostic}");
            }
        }

        let units = write_units(&self.generated_dir(), &output.units)?;
        info!("wrote {} units to {}", units.len(), self.generated_dir().display());

        Ok(BuildOutput {
            units,
            diagnostics: output.diagnostics,
        })
    }
}

#[derive(Debug)]
pub struct BuildOutput {
    /// Paths of the units written by this build.
    pub units: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Write `units` into `dir`, removing units left over from earlier passes.
pub fn write_units(dir: &Path, units: &[EmittedUnit]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let current: HashSet<&str> = units.iter().map(|unit| unit.name.as_str()).collect();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if name.ends_with(UNIT_EXTENSION) && !current.contains(name) {
            fs::remove_file(&path)?;
        }
    }

    let mut written = Vec::with_capacity(units.len());
    for unit in units {
        let path = dir.join(&unit.name);
        // Unchanged units keep their mtime.
        if fs::read_to_string(&path).ok().as_deref() != Some(unit.text.as_str()) {
            fs::write(&path, &unit.text)?;
        }
        written.push(path);
    }
    Ok(written)
}

fn env_path(key: &str) -> Result<PathBuf> {
    env::var_os(key)
        .map(PathBuf::from)
        .ok_or_else(|| Error::Config(format!("{key} is not set; run from a build script")))
}
