//! Error types for raster file pairs.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while reading or writing a raster pair.
#[derive(Error, Debug)]
pub enum GrdError {
    /// The header or the payload file of the pair does not exist.
    #[error("raster pair {base:?} is missing its {missing} file")]
    MissingFilePair { base: PathBuf, missing: &'static str },

    /// The header could not be interpreted.
    #[error("invalid header {path:?}: {reason}")]
    InvalidHeader { path: PathBuf, reason: String },

    /// The header declares a sample type this crate does not know.
    #[error("unknown data type: {0:?}")]
    UnknownDataType(String),

    /// Reading or writing one of the files failed.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GrdError {
    /// Create a MissingFilePair error.
    pub fn missing(base: impl AsRef<Path>, missing: &'static str) -> Self {
        Self::MissingFilePair {
            base: base.as_ref().to_path_buf(),
            missing,
        }
    }

    /// Create an InvalidHeader error.
    pub fn invalid_header(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::InvalidHeader {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Result type for raster pair operations.
pub type Result<T> = std::result::Result<T, GrdError>;
