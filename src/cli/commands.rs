// file: src/cli/commands.rs
// version: 1.0.1
// guid: 7ca49d1c-0649-4abe-bf84-3a9ef0a3af6b

//! Command implementations for the CLI

use super::args::ListingFormat;
use crate::{
    config::{Config, ConfigLoader, ConfigOverrides},
    logging::with_operation_span,
    versions::{
        verify, DbUpdater, DebPackagesNormalizer, MatchPolicy, Normalizer, TsvNormalizer,
        VersionDb,
    },
    Result,
};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name of the version database inside `cudet_db_dir`
pub const DEFAULT_DB_FILE: &str = "versions.tsv";

/// Build the effective configuration: defaults, then file, then CLI overrides
pub fn load_config(config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Config> {
    let config = match config_path {
        Some(path) => ConfigLoader::new().load(path)?,
        None => Config::default(),
    };
    overrides.apply(&config)
}

fn db_path(config: &Config, db: Option<PathBuf>) -> PathBuf {
    db.unwrap_or_else(|| config.cudet_db_dir.join(DEFAULT_DB_FILE))
}

/// Print the effective configuration
pub async fn show_config_command(config: &Config, json: bool) -> Result<()> {
    let rendered = if json {
        serde_json::to_string_pretty(config)?
    } else {
        serde_yaml::to_string(config)?
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

/// Update the version database from a package listing
pub async fn update_db_command(
    config: &Config,
    input: &Path,
    db: Option<PathBuf>,
    release: &str,
    format: ListingFormat,
    policy: MatchPolicy,
    dry_run: bool,
) -> Result<()> {
    let db_path = db_path(config, db);
    info!("Updating {} from {}", db_path.display(), input.display());

    let normalizer: &dyn Normalizer = match format {
        ListingFormat::Deb => &DebPackagesNormalizer,
        ListingFormat::Tsv => &TsvNormalizer,
    };

    let report = with_operation_span("update-db", || {
        DbUpdater::new(normalizer, release)
            .with_policy(policy)
            .with_dry_run(dry_run)
            .update_from_file(input, &db_path)
    })?;

    println!(
        "{} appended, {} updated, {} unchanged{}",
        report.appended,
        report.updated,
        report.unchanged,
        if dry_run { " (dry run)" } else { "" }
    );
    Ok(())
}

/// Check collected package lists against the version database
pub async fn verify_command(
    config: &Config,
    db: Option<PathBuf>,
    release: Option<String>,
    version_file: &Path,
) -> Result<()> {
    let db = VersionDb::load(db_path(config, db))?;

    let release = match release {
        Some(release) => release,
        None => verify::read_release(version_file)?,
    };
    info!("Verifying against release {}", release);

    if !db.has_release(&release) {
        warn!("The database does not have any data for release {}", release);
        println!("Sorry, the database does not have any data for release {}!", release);
        return Ok(());
    }

    println!("{}", "versions verification analysis...".bold());
    let mut mismatches = 0;
    for list in verify::find_package_lists(&config.outdir)? {
        for check in verify::verify_package_list(&db, &release, &list)? {
            if !check.is_match() {
                mismatches += 1;
                println!("{}", check.to_string().yellow());
            }
        }
    }

    println!("{}", "built-in md5 verification analysis...".bold());
    let issues = verify::find_md5_issues(&config.outdir)?;
    for issue in &issues {
        println!("{}", issue.to_string().red());
    }

    info!(
        "{} version mismatches, {} md5 issues",
        mismatches,
        issues.len()
    );
    Ok(())
}
