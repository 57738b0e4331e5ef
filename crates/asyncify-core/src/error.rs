use std::path::PathBuf;

use thiserror::Error;

/// Failures of the host surface (loading sources, reading configuration,
/// writing units). Problems with individual declarations never end up here;
/// they are reported as [`Diagnostic`](crate::Diagnostic)s instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: syn::Error,
    },

    #[error("Invalid manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("Source directory not found: {}", .0.display())]
    MissingSourceDir(PathBuf),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
