//! One generation pass: scan, resolve and filter, group, emit.

use asyncify_core::{Diagnostic, EmittedUnit, GeneratorConfig, MarkerDefinition};
use log::{debug, info};

use crate::emitter::Emitter;
use crate::filter::{group_by_container, reject_nested, AttributeFilter};
use crate::resolver::{SourceResolver, SymbolResolver};
use crate::scanner::Scanner;
use crate::source::SourceForest;

/// Result of a pass. Diagnostics never stop a pass, so both halves are always
/// populated as far as the input allows.
#[derive(Debug, Default)]
pub struct GenerationOutput {
    pub units: Vec<EmittedUnit>,
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn unit(&self, name: &str) -> Option<&EmittedUnit> {
        self.units.iter().find(|unit| unit.name == name)
    }
}

/// Runs generation passes. Holds configuration only; every pass starts from
/// scratch.
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
    marker: MarkerDefinition,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            marker: MarkerDefinition::asyncify(),
        }
    }

    pub fn with_marker(mut self, marker: MarkerDefinition) -> Self {
        self.marker = marker;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Run a pass with the built-in resolver, which knows the marker's own
    /// exports for glob imports.
    pub fn generate(&self, forest: &SourceForest) -> GenerationOutput {
        let resolver = SourceResolver::new(forest)
            .with_known_exports(self.marker.identities().iter().cloned());
        self.run(forest, &resolver)
    }

    pub fn run<R: SymbolResolver + ?Sized>(
        &self,
        forest: &SourceForest,
        resolver: &R,
    ) -> GenerationOutput {
        let mut diagnostics = Vec::new();

        let candidates = Scanner::scan(forest);
        debug!("scanned {} files, {} candidates", forest.len(), candidates.len());

        let targets =
            AttributeFilter::new(resolver, &self.marker).filter(candidates, &mut diagnostics);
        debug!("{} marked targets", targets.len());

        let groups = reject_nested(group_by_container(targets), &mut diagnostics);

        let emitter = Emitter::new(&self.config);
        let units: Vec<EmittedUnit> = groups
            .iter()
            .filter_map(|group| emitter.emit_group(group, resolver, &mut diagnostics))
            .map(EmittedUnit::new)
            .collect();

        info!(
            "generated {} units ({} diagnostics)",
            units.len(),
            diagnostics.len()
        );
        GenerationOutput { units, diagnostics }
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}
