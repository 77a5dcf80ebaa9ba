//! # Intended-For Sidecar
//!
//! Read-modify-write of single keys in the JSON metadata documents that sit
//! next to imaging data files.
//!
//! ```no_run
//! use intended_for_sidecar::{JsonSidecarWriter, SidecarWriter};
//! use serde_json::json;
//! use std::path::Path;
//!
//! let writer = JsonSidecarWriter::new();
//! writer.upsert(
//!     Path::new("/bids/sub-01/fmap/sub-01_dir-PA_epi.json"),
//!     "IntendedFor",
//!     &json!(["func/sub-01_task-rest_bold.nii.gz"]),
//! )?;
//! # Ok::<(), intended_for_sidecar::SidecarError>(())
//! ```

mod dry_run;
mod error;
mod json;

pub use dry_run::{DryRunWriter, RecordedWrite};
pub use error::{Result, SidecarError};
pub use json::JsonSidecarWriter;

use serde::Serialize;
use std::path::Path;

/// What an upsert did to the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// Field was absent and has been added
    Inserted,

    /// Field held a different value and has been overwritten
    Replaced { previous: serde_json::Value },

    /// Field already held this value; nothing written
    Unchanged,

    /// Nothing was read or written
    DryRun,
}

/// Key-value patch target for sidecar documents.
pub trait SidecarWriter {
    /// Set `field` to `value` in the document at `path`, preserving every
    /// other key. Calling twice with the same value is a no-op the second time.
    fn upsert(&self, path: &Path, field: &str, value: &serde_json::Value) -> Result<UpsertOutcome>;
}
