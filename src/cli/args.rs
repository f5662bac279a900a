// file: src/cli/args.rs
// version: 1.0.1
// guid: af8be0cd-b0b2-4943-9cc8-e0c8570407b2

//! Command line argument definitions

use crate::config::ConfigOverrides;
use crate::versions::MatchPolicy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cudet")]
#[command(about = "Collector configuration and package version database tool")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file merged over the built-in defaults
    #[arg(short, long, global = true, env = "CUDET_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Settings that can be overridden from the command line
#[derive(Args, Debug, Clone, Default)]
pub struct OverrideArgs {
    /// Local output directory
    #[arg(long, global = true)]
    pub outdir: Option<String>,

    /// Directory holding the version databases
    #[arg(long, global = true)]
    pub db_dir: Option<String>,

    /// Management node address
    #[arg(long, global = true)]
    pub fuel_ip: Option<String>,

    /// Per-command timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

impl From<OverrideArgs> for ConfigOverrides {
    fn from(args: OverrideArgs) -> Self {
        ConfigOverrides {
            outdir: args.outdir,
            cudet_db_dir: args.db_dir,
            fuel_ip: args.fuel_ip,
            timeout: args.timeout,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the effective configuration
    ShowConfig {
        #[arg(short, long)]
        json: bool,
    },

    /// Update the version database from a package listing
    UpdateDb {
        #[arg(short, long, help = "Package listing to import")]
        input: PathBuf,

        #[arg(short, long, help = "Database file (defaults to <db_dir>/versions.tsv)")]
        db: Option<PathBuf>,

        #[arg(short, long, help = "Release recorded on appended rows")]
        release: String,

        #[arg(long, value_enum, default_value = "deb")]
        format: ListingFormat,

        #[arg(long = "match", value_enum, default_value = "exact")]
        match_policy: MatchArg,

        #[arg(long, help = "Show what would change without writing the database")]
        dry_run: bool,
    },

    /// Check collected package lists against the version database
    Verify {
        #[arg(short, long, help = "Database file (defaults to <db_dir>/versions.tsv)")]
        db: Option<PathBuf>,

        #[arg(short, long, help = "Release to check against")]
        release: Option<String>,

        #[arg(
            long,
            default_value = "/etc/fuel/version.yaml",
            help = "File to read the release from"
        )]
        version_file: PathBuf,
    },
}

/// Syntax of the package listing given to `update-db`
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListingFormat {
    /// Debian `Packages` index
    Deb,
    /// name<TAB>version<TAB>filename lines
    Tsv,
}

/// Filename match policy argument
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchArg {
    Exact,
    Substring,
}

impl From<MatchArg> for MatchPolicy {
    fn from(arg: MatchArg) -> Self {
        match arg {
            MatchArg::Exact => MatchPolicy::Exact,
            MatchArg::Substring => MatchPolicy::Substring,
        }
    }
}
