// file: src/versions/updater.rs
// version: 1.0.1
// guid: 321f957e-6f03-4cd9-994d-561bd296b5c6

//! Batch update of the version database from a package listing

use super::database::{MatchPolicy, UpdateReport, VersionDb};
use super::normalizer::Normalizer;
use crate::{CudetError, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Feeds normalized package listings into a version database
pub struct DbUpdater<'a> {
    normalizer: &'a dyn Normalizer,
    release: String,
    policy: MatchPolicy,
    dry_run: bool,
}

impl<'a> DbUpdater<'a> {
    pub fn new(normalizer: &'a dyn Normalizer, release: impl Into<String>) -> Self {
        Self {
            normalizer,
            release: release.into(),
            policy: MatchPolicy::default(),
            dry_run: false,
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Compute the report without writing the database
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Read the listing at `input` and update the database at `db_path`
    pub fn update_from_file(&self, input: &Path, db_path: &Path) -> Result<UpdateReport> {
        let raw = fs::read_to_string(input).map_err(|e| CudetError::io_at(input, e))?;
        self.update(&raw, db_path)
    }

    /// Update the database at `db_path` from a raw listing
    pub fn update(&self, raw: &str, db_path: &Path) -> Result<UpdateReport> {
        if self.release.trim().is_empty() {
            return Err(CudetError::validation("release cannot be empty"));
        }

        let mut db = VersionDb::load(db_path)?;
        let records = self.normalizer.normalize(raw)?;
        info!(
            "Reconciling {} records into {} (release {})",
            records.len(),
            db_path.display(),
            self.release
        );

        let report = db.apply(&records, &self.release, self.policy)?;

        if self.dry_run {
            info!("DRY RUN: database left untouched");
        } else {
            db.save()?;
        }

        info!(
            "{} appended, {} updated, {} unchanged",
            report.appended, report.updated, report.unchanged
        );
        Ok(report)
    }
}
