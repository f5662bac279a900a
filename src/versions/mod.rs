// file: src/versions/mod.rs
// version: 1.0.0
// guid: e1f60f96-bdf4-45a5-816e-bd3dae1825e7

//! Package version database: normalization, updates and verification

pub mod database;
pub mod normalizer;
pub mod record;
pub mod updater;
pub mod verify;

pub use database::{MatchPolicy, UpdateReport, VersionDb};
pub use normalizer::{DebPackagesNormalizer, Normalizer, TsvNormalizer};
pub use record::{DbRow, PackageRecord};
pub use updater::DbUpdater;
pub use verify::{Finding, Md5Issue, NodeOs, PackageCheck, PackageList};
