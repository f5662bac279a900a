// file: src/versions/normalizer.rs
// version: 1.0.1
// guid: 2f133d3c-adeb-4c52-82bd-39412bf0d8ba

//! Conversion of raw package listings into package records

use super::record::{PackageRecord, RECORD_COLUMNS};
use crate::{CudetError, Result};
use tracing::debug;

/// Turns a raw package listing into normalized records
pub trait Normalizer {
    fn normalize(&self, raw: &str) -> Result<Vec<PackageRecord>>;
}

impl<F> Normalizer for F
where
    F: Fn(&str) -> Result<Vec<PackageRecord>>,
{
    fn normalize(&self, raw: &str) -> Result<Vec<PackageRecord>> {
        self(raw)
    }
}

/// Reads Debian `Packages` index stanzas.
///
/// Each stanza must carry `Package`, `Version` and `Filename` fields. Only
/// the last path component of `Filename` is kept.
#[derive(Debug, Default, Clone, Copy)]
pub struct DebPackagesNormalizer;

impl Normalizer for DebPackagesNormalizer {
    fn normalize(&self, raw: &str) -> Result<Vec<PackageRecord>> {
        let mut records = Vec::new();
        let mut stanza = Stanza::default();

        for (index, line) in raw.lines().enumerate() {
            let line_no = index + 1;

            if line.trim().is_empty() {
                if let Some(record) = stanza.finish()? {
                    records.push(record);
                }
                continue;
            }

            // continuation of a multi-line field such as Description
            if line.starts_with(' ') || line.starts_with('\t') {
                continue;
            }

            let (key, value) = line.split_once(':').ok_or_else(|| {
                CudetError::parse(format!(
                    "line {}: expected 'Field: value', got '{}'",
                    line_no, line
                ))
            })?;

            stanza.start.get_or_insert(line_no);
            let value = value.trim().to_string();
            match key {
                "Package" => stanza.package = Some(value),
                "Version" => stanza.version = Some(value),
                "Filename" => stanza.filename = Some(value),
                _ => {}
            }
        }

        if let Some(record) = stanza.finish()? {
            records.push(record);
        }

        debug!("Normalized {} package stanzas", records.len());
        Ok(records)
    }
}

#[derive(Default)]
struct Stanza {
    start: Option<usize>,
    package: Option<String>,
    version: Option<String>,
    filename: Option<String>,
}

impl Stanza {
    fn finish(&mut self) -> Result<Option<PackageRecord>> {
        let stanza = std::mem::take(self);
        let Some(start) = stanza.start else {
            return Ok(None);
        };

        let missing = |field: &str| {
            CudetError::parse(format!("stanza at line {}: missing {} field", start, field))
        };

        let name = stanza.package.ok_or_else(|| missing("Package"))?;
        let version = stanza.version.ok_or_else(|| missing("Version"))?;
        let path = stanza.filename.ok_or_else(|| missing("Filename"))?;
        let filename = path.rsplit('/').next().unwrap_or(&path).to_string();

        Ok(Some(PackageRecord::new(name, version, filename)))
    }
}

/// Reads pre-normalized `name<TAB>version<TAB>filename` lines
#[derive(Debug, Default, Clone, Copy)]
pub struct TsvNormalizer;

impl Normalizer for TsvNormalizer {
    fn normalize(&self, raw: &str) -> Result<Vec<PackageRecord>> {
        let mut records = Vec::new();

        for (index, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != RECORD_COLUMNS || fields.iter().any(|f| f.is_empty()) {
                return Err(CudetError::parse(format!(
                    "line {}: expected {} non-empty tab-separated fields, got '{}'",
                    index + 1,
                    RECORD_COLUMNS,
                    line
                )));
            }

            records.push(PackageRecord::new(fields[0], fields[1], fields[2]));
        }

        Ok(records)
    }
}
