//! # Intended-For Catalog
//!
//! Queryable view of a BIDS-style dataset: which functional acquisitions and
//! which fieldmap files exist for a subject/session, each resolved into a
//! typed record with its acquisition-order key.
//!
//! ## Layout
//!
//! ```text
//! dataset_root/
//!     sub-01/
//!         ses-A/
//!             func/sub-01_ses-A_task-rest_run-1_bold.nii.gz (+ .json)
//!             fmap/sub-01_ses-A_dir-PA_run-1_epi.nii.gz     (+ .json)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use intended_for_catalog::{BidsCatalog, Catalog, CatalogConfig};
//!
//! fn main() -> intended_for_catalog::Result<()> {
//!     let catalog = BidsCatalog::open("/data/bids", CatalogConfig::default())?;
//!     for subject in catalog.list_subjects()? {
//!         let scans = catalog.query_acquisitions(&subject, None, None)?;
//!         println!("{subject}: {} functional scans", scans.len());
//!     }
//!     Ok(())
//! }
//! ```

mod bids;
mod config;
mod entities;
mod error;
mod memory;
mod types;

pub use bids::BidsCatalog;
pub use config::CatalogConfig;
pub use entities::BidsEntities;
pub use error::{CatalogError, Result};
pub use memory::MemoryCatalog;
pub use types::{pairing_key, Acquisition, FieldmapFile, Polarity};

use std::collections::BTreeSet;

/// Read-only queries over a dataset.
///
/// `session = None` means "any session": a session-less subject, or every
/// session of the subject collapsed into one unit.
pub trait Catalog {
    fn list_subjects(&self) -> Result<BTreeSet<String>>;

    /// Sessions of a subject in ascending order. Empty for session-less subjects.
    fn list_sessions(&self, subject: &str) -> Result<Vec<String>>;

    /// Distinct task labels of the subject's functional acquisitions, sorted.
    fn list_tasks(&self, subject: &str, session: Option<&str>) -> Result<Vec<String>>;

    /// Functional acquisitions sorted ascending by `order_key` (stable).
    fn query_acquisitions(
        &self,
        subject: &str,
        session: Option<&str>,
        task: Option<&str>,
    ) -> Result<Vec<Acquisition>>;

    /// Fieldmap files in catalog order. Callers group and sort them.
    fn query_fieldmaps(
        &self,
        subject: &str,
        session: Option<&str>,
        task: Option<&str>,
    ) -> Result<Vec<FieldmapFile>>;

    /// Dataset root that acquisition paths are rooted at.
    fn root(&self) -> &std::path::Path;
}
