use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Walk error: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("Invalid dataset root: {0}")]
    InvalidRoot(String),

    #[error("Invalid catalog configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing metadata field '{field}' for {}", path.display())]
    MissingMetadata { path: PathBuf, field: String },

    #[error("Invalid metadata in {}: {reason}", path.display())]
    InvalidMetadata { path: PathBuf, reason: String },

    #[error("Unknown subject: {0}")]
    UnknownSubject(String),
}

impl CatalogError {
    pub fn missing_metadata(path: impl Into<PathBuf>, field: impl Into<String>) -> Self {
        Self::MissingMetadata {
            path: path.into(),
            field: field.into(),
        }
    }

    pub fn invalid_metadata(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
