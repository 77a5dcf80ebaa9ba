//! Batch driver behind the `intended-for` binary: plans subject/session
//! units from a catalog, pairs each one and upserts the resulting sidecar
//! fields. Failures are contained per unit.

pub mod batch;
pub mod config;

pub use batch::{
    plan_units, run_batch, BatchOptions, BatchReport, SessionMode, UnitReport, UnitStatus,
    WorkUnit, WriteCounts,
};
pub use config::{IntendedForConfig, CONFIG_ENV};
