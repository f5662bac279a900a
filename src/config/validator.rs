// file: src/config/validator.rs
// version: 1.0.0
// guid: 2c83fb93-970b-497f-8e10-aa151cc0dae0

use super::{Config, LogsConfig};
use crate::{CudetError, Result};
use regex::Regex;
use tracing::debug;

/// Validate the complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("Validating configuration");

    if config.timeout == 0 {
        return Err(CudetError::validation("timeout must be greater than 0"));
    }

    if config.fuel_port == 0 {
        return Err(CudetError::validation("fuel_port must not be 0"));
    }

    if config.fuel_ip.trim().is_empty() {
        return Err(CudetError::validation("fuel_ip cannot be empty"));
    }

    validate_logs(&config.logs)?;

    Ok(())
}

fn validate_logs(logs: &LogsConfig) -> Result<()> {
    Regex::new(&logs.exclude).map_err(|e| {
        CudetError::validation(format!("logs.exclude is not a valid regex: {}", e))
    })?;

    logs.start.trim().parse::<u32>().map_err(|_| {
        CudetError::validation(format!(
            "logs.start must be a number of days, got '{}'",
            logs.start
        ))
    })?;

    Ok(())
}
