use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SidecarError>;

#[derive(Error, Debug)]
pub enum SidecarError {
    #[error("IO error on {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {}: {source}", path.display())]
    JsonError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Sidecar {} is not a JSON object", .0.display())]
    NotAnObject(PathBuf),

    #[error("Failed to print dry-run record: {0}")]
    OutputError(#[source] std::io::Error),
}

impl SidecarError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::JsonError {
            path: path.into(),
            source,
        }
    }
}
