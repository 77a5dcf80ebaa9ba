//! # Intended-For Pairing
//!
//! Decides which functional scans each fieldmap pair should correct.
//!
//! ## Pipeline
//!
//! ```text
//! FieldmapFile[] (catalog order)
//!     │
//!     ├──> group()          runs of exactly two opposite-polarity files,
//!     │                     sorted by min order key
//!     │
//!     ├──> PairingEngine    last | closest | task
//!     │      └─> Assignment (group -> acquisitions, borrowed)
//!     │
//!     └──> Materializer     one SidecarWrite per fieldmap file
//! ```
//!
//! ## Example
//!
//! ```rust
//! use intended_for_catalog::{Acquisition, FieldmapFile, Polarity};
//! use intended_for_pairing::{group, Materializer, PairingEngine, Strategy};
//!
//! let fieldmaps = vec![
//!     FieldmapFile::new("/bids/sub-01/fmap/sub-01_dir-PA_run-1_epi.nii.gz", 1, "1", Polarity::Positive),
//!     FieldmapFile::new("/bids/sub-01/fmap/sub-01_dir-AP_run-1_epi.nii.gz", 2, "1", Polarity::Negative),
//! ];
//! let scans = vec![Acquisition::new("/bids/sub-01/func/sub-01_task-rest_bold.nii.gz", 3, Some("rest"))];
//!
//! let groups = group(&fieldmaps).unwrap();
//! let assignment = PairingEngine::new(Strategy::Closest).pair(&scans, &groups).unwrap();
//! let writes = Materializer::new("/bids/sub-01").materialize(&assignment).unwrap();
//!
//! assert_eq!(writes.len(), 2);
//! assert_eq!(writes[0].value, vec!["func/sub-01_task-rest_bold.nii.gz".to_string()]);
//! ```

mod assignment;
mod engine;
mod error;
mod group;
mod materialize;
mod strategy;

pub use assignment::{Assignment, GroupAssignment};
pub use engine::PairingEngine;
pub use error::{PairingError, Result};
pub use group::{group, FieldmapGroup};
pub use materialize::{Materializer, SidecarWrite, DEFAULT_FIELD};
pub use strategy::Strategy;
