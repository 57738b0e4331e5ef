//! Command implementations for the asyncify CLI.

use std::path::Path;

use anyhow::{bail, Context, Result};
use asyncify_compiler::{write_units, GenerationOutput, Project};
use asyncify_core::{Diagnostic, EmittedUnit};
use serde::Serialize;

use crate::ConfigArgs;

/// Load the crate at `path` and run a pass with the CLI overrides applied.
fn run_pass(path: &Path, overrides: &ConfigArgs) -> Result<GenerationOutput> {
    let mut project = Project::load(path)
        .with_context(|| format!("failed to load crate at {}", path.display()))?;
    overrides.apply(&mut project.config);
    log::debug!(
        "generating for `{}` with suffix `{}` on {}",
        project.name,
        project.config.suffix,
        project.config.runtime
    );
    Ok(project.generate())
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{diagnostic}");
    }
}

/// Generate command: write units to `out_dir`, or print them.
pub fn generate(path: &Path, out_dir: Option<&Path>, overrides: &ConfigArgs) -> Result<()> {
    let output = run_pass(path, overrides)?;
    print_diagnostics(&output.diagnostics);

    match out_dir {
        Some(dir) => {
            let written = write_units(dir, &output.units)
                .with_context(|| format!("failed to write units to {}", dir.display()))?;
            println!("Wrote {} unit(s) to {}", written.len(), dir.display());
            for unit_path in written {
                println!("  {}", unit_path.display());
            }
        }
        None => {
            for unit in &output.units {
                println!("// ==> {} <==", unit.name);
                print!("{}", unit.text);
            }
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct UnitListing {
    unit: String,
    container: String,
    wrappers: Vec<WrapperListing>,
}

#[derive(Debug, Serialize)]
struct WrapperListing {
    original: String,
    wrapper: String,
}

impl From<&EmittedUnit> for UnitListing {
    fn from(unit: &EmittedUnit) -> Self {
        Self {
            unit: unit.name.clone(),
            container: unit.unit.container.to_string(),
            wrappers: unit
                .unit
                .wrappers()
                .map(|wrapper| WrapperListing {
                    original: wrapper.delegate.to_string(),
                    wrapper: wrapper.name.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Listing<'a> {
    units: Vec<UnitListing>,
    diagnostics: &'a [Diagnostic],
}

fn listing(output: &GenerationOutput) -> Listing<'_> {
    Listing {
        units: output.units.iter().map(UnitListing::from).collect(),
        diagnostics: &output.diagnostics,
    }
}

/// List command: wrappers per unit.
pub fn list(path: &Path, json: bool, overrides: &ConfigArgs) -> Result<()> {
    let output = run_pass(path, overrides)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&listing(&output))?);
        return Ok(());
    }

    if output.units.is_empty() {
        println!("No #[asyncify] functions found.");
    }
    for unit in listing(&output).units {
        println!("{} ({})", unit.unit, unit.container);
        for wrapper in unit.wrappers {
            println!("  {} -> {}", wrapper.original, wrapper.wrapper);
        }
    }
    print_diagnostics(&output.diagnostics);
    Ok(())
}

/// Check command: fails when the pass reports errors.
pub fn check(path: &Path, overrides: &ConfigArgs) -> Result<()> {
    let output = run_pass(path, overrides)?;
    print_diagnostics(&output.diagnostics);

    let errors = output.diagnostics.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        bail!("{errors} error(s) in #[asyncify] functions");
    }
    println!(
        "{} unit(s), {} warning(s)",
        output.units.len(),
        output.diagnostics.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_crate(source: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"sample\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), source).unwrap();
        dir
    }

    #[test]
    fn test_listing_json_shape() {
        let dir = sample_crate(
            "pub struct Program;\nimpl Program {\n    #[asyncify::asyncify]\n    pub fn print_number(number: i32) {}\n}\n",
        );
        let output = run_pass(dir.path(), &ConfigArgs::default()).unwrap();
        let json = serde_json::to_value(listing(&output)).unwrap();

        assert_eq!(json["units"][0]["unit"], "crate-Program.asyncify.rs");
        assert_eq!(json["units"][0]["container"], "crate::Program");
        assert_eq!(json["units"][0]["wrappers"][0]["original"], "print_number");
        assert_eq!(json["units"][0]["wrappers"][0]["wrapper"], "print_number_async");
        assert_eq!(json["diagnostics"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_check_fails_on_errors() {
        let dir = sample_crate(
            "pub struct S;\nimpl S {\n    #[asyncify::asyncify]\n    pub fn bad(&mut self) {}\n}\n",
        );
        assert!(check(dir.path(), &ConfigArgs::default()).is_err());

        let clean = sample_crate("#[asyncify::asyncify]\npub fn fine() {}\n");
        assert!(check(clean.path(), &ConfigArgs::default()).is_ok());
    }

    #[test]
    fn test_generate_writes_out_dir() {
        let dir = sample_crate("#[asyncify::asyncify]\npub fn job() -> u8 { 1 }\n");
        let out = tempfile::tempdir().unwrap();
        generate(dir.path(), Some(out.path()), &ConfigArgs::default()).unwrap();

        let text = fs::read_to_string(out.path().join("crate.asyncify.rs")).unwrap();
        assert!(text.contains("job_async"));
    }
}
