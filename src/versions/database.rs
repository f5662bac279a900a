// file: src/versions/database.rs
// version: 1.0.1
// guid: fefbd33e-b247-4996-b05a-935f748df0c0

//! Tab-separated package version database

use super::record::{DbRow, PackageRecord};
use crate::{CudetError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Id given to the first row of an empty database
pub const FIRST_ID: u64 = 1;

/// Job id column value for rows appended by the updater
pub const DEFAULT_JOB_ID: &str = "0";

/// Channel column value for rows appended by the updater
pub const DEFAULT_CHANNEL: &str = "release";

/// OS column value for rows appended by the updater
pub const DEFAULT_OS: &str = "ubuntu";

/// How an incoming record is matched against existing rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Compare the filename column (and the record columns for the
    /// unchanged check) for equality
    #[default]
    Exact,
    /// Match when the whole row line contains the filename (or the record
    /// line for the unchanged check)
    Substring,
}

impl MatchPolicy {
    fn is_unchanged(self, row: &DbRow, record: &PackageRecord) -> bool {
        match self {
            MatchPolicy::Exact => row.record == *record,
            MatchPolicy::Substring => row.to_line().contains(&record.to_line()),
        }
    }

    fn filename_matches(self, row: &DbRow, record: &PackageRecord) -> bool {
        match self {
            MatchPolicy::Exact => row.record.filename == record.filename,
            MatchPolicy::Substring => row.to_line().contains(&record.filename),
        }
    }
}

impl std::str::FromStr for MatchPolicy {
    type Err = CudetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "exact" => Ok(MatchPolicy::Exact),
            "substring" => Ok(MatchPolicy::Substring),
            _ => Err(CudetError::validation(format!("Unknown match policy: {}", s))),
        }
    }
}

/// Outcome of applying a batch of records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReport {
    /// Rows appended for previously unknown filenames
    pub appended: usize,
    /// Existing rows whose record columns were rewritten
    pub updated: usize,
    /// Records already present verbatim
    pub unchanged: usize,
}

impl UpdateReport {
    pub fn changed(&self) -> bool {
        self.appended > 0 || self.updated > 0
    }
}

/// In-memory view of the version database file
#[derive(Debug, Clone)]
pub struct VersionDb {
    path: PathBuf,
    rows: Vec<DbRow>,
    dirty: bool,
}

impl VersionDb {
    /// Load the database at `path`; the file must exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading version database {}", path.display());

        let content = fs::read_to_string(path).map_err(|e| CudetError::io_at(path, e))?;
        let db = Self::parse(path, &content)?;

        info!("Loaded {} rows from {}", db.rows.len(), path.display());
        Ok(db)
    }

    /// Parse database content; `path` is used for error messages and saving
    pub fn parse<P: AsRef<Path>>(path: P, content: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut rows = Vec::new();

        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row = DbRow::parse(line).map_err(|e| {
                CudetError::database(format!("{}:{}: {}", path.display(), index + 1, e))
            })?;
            rows.push(row);
        }

        Ok(Self {
            path,
            rows,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> &[DbRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Id for the next appended row, taken from the last row only
    pub fn next_id(&self) -> Result<u64> {
        self.following_id().ok_or_else(|| self.id_overflow())
    }

    fn following_id(&self) -> Option<u64> {
        match self.rows.last() {
            Some(row) => row.id.checked_add(1),
            None => Some(FIRST_ID),
        }
    }

    fn id_overflow(&self) -> CudetError {
        CudetError::database(format!("{}: id overflow", self.path.display()))
    }

    /// Whether any row belongs to `release`
    pub fn has_release(&self, release: &str) -> bool {
        self.rows.iter().any(|row| row.release == release)
    }

    /// Rows for a package on an OS, optionally restricted to one release
    pub fn find<'a>(
        &'a self,
        name: &'a str,
        os: &'a str,
        release: Option<&'a str>,
    ) -> impl Iterator<Item = &'a DbRow> + 'a {
        self.rows.iter().filter(move |row| {
            row.record.name == name
                && row.os == os
                && release.map_or(true, |r| row.release == r)
        })
    }

    /// Reconcile `records` into the database.
    ///
    /// A record already present is skipped; a record with an unknown
    /// filename is appended under `release`; otherwise every row with the
    /// same filename has its record columns replaced.
    pub fn apply(
        &mut self,
        records: &[PackageRecord],
        release: &str,
        policy: MatchPolicy,
    ) -> Result<UpdateReport> {
        let mut report = UpdateReport::default();
        let mut next_id = self.following_id();

        for record in records {
            if self.rows.iter().any(|row| policy.is_unchanged(row, record)) {
                report.unchanged += 1;
                continue;
            }

            let matching: Vec<usize> = self
                .rows
                .iter()
                .enumerate()
                .filter(|(_, row)| policy.filename_matches(row, record))
                .map(|(index, _)| index)
                .collect();

            if matching.is_empty() {
                let id = next_id.ok_or_else(|| self.id_overflow())?;
                next_id = id.checked_add(1);
                debug!("Appending {} as id {}", record, id);
                self.rows.push(DbRow {
                    id,
                    job_id: DEFAULT_JOB_ID.to_string(),
                    release: release.to_string(),
                    channel: DEFAULT_CHANNEL.to_string(),
                    os: DEFAULT_OS.to_string(),
                    record: record.clone(),
                });
                report.appended += 1;
                continue;
            }

            if matching.len() > 1 {
                warn!(
                    "{} rows match filename {}, rewriting all of them",
                    matching.len(),
                    record.filename
                );
            }

            for index in matching {
                let row = &mut self.rows[index];
                debug!("Updating row {}: {} -> {}", row.id, row.record, record);
                row.record = record.clone();
                report.updated += 1;
            }
        }

        if report.changed() {
            self.dirty = true;
        }

        Ok(report)
    }

    /// Render the database as file content
    pub fn to_tsv(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            out.push_str(&row.to_line());
            out.push('\n');
        }
        out
    }

    /// Write the database back if it changed.
    ///
    /// Content goes to a temporary file next to the database which is then
    /// renamed over it with the database's permissions. Returns whether
    /// anything was written.
    pub fn save(&mut self) -> Result<bool> {
        if !self.dirty {
            debug!("No changes to {}", self.path.display());
            return Ok(false);
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let permissions = fs::metadata(&self.path)
            .map_err(|e| CudetError::io_at(&self.path, e))?
            .permissions();

        let mut tmp =
            tempfile::NamedTempFile::new_in(&dir).map_err(|e| CudetError::io_at(&dir, e))?;
        tmp.write_all(self.to_tsv().as_bytes())
            .map_err(|e| CudetError::io_at(tmp.path(), e))?;
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(|e| CudetError::io_at(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| CudetError::io_at(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| CudetError::io_at(&self.path, e.error))?;

        self.dirty = false;
        info!("Wrote {} rows to {}", self.rows.len(), self.path.display());
        Ok(true)
    }
}
