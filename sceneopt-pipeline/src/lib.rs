//! Reversible scene optimization
//!
//! This crate sequences the optimization passes over a host's live scene:
//! - Ordered, toggleable passes run inside one snapshot transaction
//! - Revert through the snapshot store
//! - Download-size preset, mesh merging, LOD generation and mesh analysis
//! - Configuration profiles and per-run statistics

pub mod config;
pub mod error_log;
pub mod orchestrator;
pub mod pass;
pub mod passes;
pub mod session;
pub mod stats;

pub use config::*;
pub use error_log::*;
pub use orchestrator::*;
pub use pass::*;
pub use session::*;
pub use stats::*;

pub use sceneopt_backup::{RestoreFailure, RestoreReport, SnapshotStore};
pub use sceneopt_simplification::{LodReport, LodSettings, MergeReport};
