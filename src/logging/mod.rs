// file: src/logging/mod.rs
// version: 1.0.0
// guid: 1b7a2e74-f89b-4df4-9293-3ae37556bee8

//! Logging system for cudet

pub mod logger;

pub use logger::{init_logger, with_operation_span};
