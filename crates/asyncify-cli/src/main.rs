//! CLI tool for asyncify.
//!
//! Runs generation passes over a crate outside of its build script: writing
//! or printing units, listing wrappers and checking for diagnostics.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use asyncify_core::{GeneratorConfig, Runtime};
use clap::{Args, Parser, ValueEnum};

#[derive(Parser)]
#[command(name = "cargo-asyncify")]
#[command(bin_name = "cargo asyncify")]
#[command(about = "Generate background-task wrappers for #[asyncify] functions", long_about = None)]
#[command(version)]
enum Cli {
    #[command(subcommand)]
    Asyncify(Commands),
}

#[derive(Parser)]
enum Commands {
    /// Generate wrapper units
    Generate {
        /// Crate root containing Cargo.toml
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Directory to write units into (prints them if not specified)
        #[arg(long, short)]
        out_dir: Option<PathBuf>,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// List the wrappers each unit would contain
    List {
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Report diagnostics; exits with an error if any are errors
    Check {
        #[arg(long, default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },
}

/// Overrides for `[package.metadata.asyncify]`.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Suffix appended to wrapper names
    #[arg(long)]
    suffix: Option<String>,

    /// Runtime the wrappers schedule work on
    #[arg(long, value_enum)]
    runtime: Option<RuntimeArg>,
}

impl ConfigArgs {
    pub fn apply(&self, config: &mut GeneratorConfig) {
        if let Some(suffix) = &self.suffix {
            config.suffix = suffix.clone();
        }
        if let Some(runtime) = self.runtime {
            config.runtime = runtime.into();
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RuntimeArg {
    /// tokio::task::spawn_blocking (default)
    Tokio,
    /// std::thread::spawn
    Thread,
}

impl From<RuntimeArg> for Runtime {
    fn from(arg: RuntimeArg) -> Self {
        match arg {
            RuntimeArg::Tokio => Runtime::Tokio,
            RuntimeArg::Thread => Runtime::Thread,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("warn"));

    let Cli::Asyncify(cmd) = Cli::parse();

    match cmd {
        Commands::Generate {
            path,
            out_dir,
            config,
        } => commands::generate(&path, out_dir.as_deref(), &config),
        Commands::List { path, json, config } => commands::list(&path, json, &config),
        Commands::Check { path, config } => commands::check(&path, &config),
    }
}
