/// Error types shared across the application
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem access failed for a specific path
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The folder to index does not exist or is not a directory
    #[error("Folder not found: {0}")]
    FolderNotFound(PathBuf),

    /// Settings JSON could not be encoded or decoded
    #[error("Invalid settings file: {0}")]
    SettingsFormat(#[from] serde_json::Error),

    /// Thumbnail decoding failed
    #[error("Failed to decode {path}: {source}")]
    Thumbnail {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A blocking task panicked or was cancelled
    #[error("Task join error: {0}")]
    TaskJoin(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
