// file: src/cli/mod.rs
// version: 1.0.0
// guid: 200e72c5-4fff-4a16-a8c9-71ee38b8b7a3

//! Command line interface for cudet

pub mod args;
pub mod commands;

pub use args::Cli;
pub use commands::*;
