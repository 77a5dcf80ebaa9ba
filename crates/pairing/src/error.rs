use std::path::PathBuf;
use thiserror::Error;

/// Result type for pairing operations
pub type Result<T> = std::result::Result<T, PairingError>;

/// Errors raised while grouping, pairing or materializing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PairingError {
    /// A run does not hold exactly one pair of fieldmap files
    #[error("Unpaired fieldmap run '{run_id}': expected 2 files, found {count}")]
    UnpairedFieldmap { run_id: String, count: usize },

    /// Both files of a run share the same phase-encoding direction
    #[error("Fieldmap run '{run_id}' has two {polarity} files")]
    PolarityMismatch { run_id: String, polarity: String },

    /// Strategy name not in the closed set
    #[error("Unknown strategy '{0}' (expected one of: last, closest, task, eta_squared)")]
    UnknownStrategy(String),

    /// Strategy recognised but not implemented
    #[error("Unsupported strategy: {0}")]
    UnsupportedStrategy(String),

    /// Fieldmap path does not end in a known data extension
    #[error("No known data extension on {}", .0.display())]
    UnknownDataExtension(PathBuf),

    /// Acquisition path is not below the materializer root
    #[error("{} is outside {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

impl PairingError {
    /// Data-integrity errors are fatal to one subject/session unit only.
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            Self::UnpairedFieldmap { .. } | Self::PolarityMismatch { .. }
        )
    }
}
