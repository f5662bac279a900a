// file: src/lib.rs
// version: 1.0.0
// guid: dedbda6e-597e-432b-b2e3-536b698b8d00

//! # cudet
//!
//! Configuration defaults for the cloud environment data collector and the
//! package version database it checks installed packages against.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod versions;

pub use error::{CudetError, Result};

/// Version information for the utility
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
