//! Mercator: Merkle snapshots of a directory tree
//!
//! Scans a directory into a Merkle tree of content fingerprints, persists it as
//! a flat manifest, and diffs manifests (or a manifest against the live tree)
//! with an O(1) check on the root fingerprint before any per-file comparison.

pub mod api;
pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod ignore;
pub mod logging;
pub mod manifest;
pub mod render;
pub mod tree;
pub mod types;

pub use api::{ScanApi, ScanOutcome, ScanReport};
pub use diff::{diff, DiffResult};
pub use error::{ApiError, ScanError};
pub use manifest::Manifest;
pub use types::Fingerprint;
