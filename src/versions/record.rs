// file: src/versions/record.rs
// version: 1.0.1
// guid: c06ebd0e-077e-4b92-bb39-c1da242a3d14

//! Package records and version database rows

use crate::{CudetError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of leading columns owned by the database rather than the record
pub const PREFIX_COLUMNS: usize = 5;

/// Number of columns produced by a normalizer
pub const RECORD_COLUMNS: usize = 3;

/// A normalized package entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
    pub filename: String,
}

impl PackageRecord {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            filename: filename.into(),
        }
    }

    /// Tab-joined representation as stored in the database
    pub fn to_line(&self) -> String {
        format!("{}\t{}\t{}", self.name, self.version, self.filename)
    }
}

impl fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.name, self.version, self.filename)
    }
}

/// One line of the version database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbRow {
    pub id: u64,
    pub job_id: String,
    pub release: String,
    pub channel: String,
    pub os: String,
    pub record: PackageRecord,
}

impl DbRow {
    /// Parse a tab-separated database line
    pub fn parse(line: &str) -> Result<Self> {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() != PREFIX_COLUMNS + RECORD_COLUMNS {
            return Err(CudetError::database(format!(
                "expected {} tab-separated columns, found {}",
                PREFIX_COLUMNS + RECORD_COLUMNS,
                columns.len()
            )));
        }

        let id = columns[0].trim().parse::<u64>().map_err(|_| {
            CudetError::database(format!("id '{}' is not an integer", columns[0]))
        })?;

        Ok(Self {
            id,
            job_id: columns[1].to_string(),
            release: columns[2].to_string(),
            channel: columns[3].to_string(),
            os: columns[4].to_string(),
            record: PackageRecord::new(columns[5], columns[6], columns[7]),
        })
    }

    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.id,
            self.job_id,
            self.release,
            self.channel,
            self.os,
            self.record.to_line()
        )
    }
}
