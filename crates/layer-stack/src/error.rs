//! Error types for building a layer stack.

use std::path::{Path, PathBuf};

use grd_format::GrdError;
use thiserror::Error;

/// Errors that can occur while assembling or post-processing a dataset.
#[derive(Error, Debug)]
pub enum StackError {
    /// Fewer than two layers vary over the study area.
    #[error("at least two layers with variation are required, found {found}")]
    InsufficientLayers { found: usize },

    /// A raster pair could not be read or written.
    #[error(transparent)]
    Grid(#[from] GrdError),

    /// The output grid cannot be laid out.
    #[error("invalid output geometry: {0}")]
    InvalidGeometry(String),

    /// Reading or writing a side file failed.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A collaborator returned output that does not fit the dataset.
    #[error("classification error: {0}")]
    Classification(String),
}

impl StackError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create an InvalidGeometry error.
    pub fn invalid_geometry(msg: impl Into<String>) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a Classification error.
    pub fn classification(msg: impl Into<String>) -> Self {
        Self::Classification(msg.into())
    }
}

/// Result type for layer stack operations.
pub type Result<T> = std::result::Result<T, StackError>;
