// file: src/config/loader.rs
// version: 1.0.1
// guid: b38cef19-5f53-4243-bbe0-1b9d57e19ae5

//! Configuration file loading and environment variable substitution

use super::Config;
use crate::{CudetError, Result};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// On-disk syntax of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick a format from the file extension, YAML when unknown
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => ConfigFormat::Json,
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
    env_vars: HashMap<String, String>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self {
            env_vars: std::env::vars().collect(),
        }
    }

    /// Load configuration from a file, merged over the defaults
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Config> {
        self.load_over(&Config::default(), path)
    }

    /// Load configuration from a file, merged over `base`
    pub fn load_over<P: AsRef<Path>>(&self, base: &Config, path: P) -> Result<Config> {
        let path = path.as_ref();
        info!("Loading configuration from {}", path.display());

        let content = fs::read_to_string(path).map_err(|e| {
            CudetError::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let overrides = self.parse_overrides(&content, ConfigFormat::from_path(path))?;
        debug!("Config file sets {} keys", overrides.len());

        let config = base.merge(&overrides)?;
        config.validate()?;

        Ok(config)
    }

    /// Parse file content into a top-level override mapping
    pub fn parse_overrides(&self, content: &str, format: ConfigFormat) -> Result<Mapping> {
        let expanded = self.expand_env_vars(content)?;
        if expanded.trim().is_empty() {
            return Ok(Mapping::new());
        }

        let value: Value = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(&expanded)?,
            ConfigFormat::Json => serde_json::from_str(&expanded)?,
            ConfigFormat::Toml => toml::from_str(&expanded)?,
        };

        match value {
            Value::Mapping(map) => Ok(map),
            Value::Null => Ok(Mapping::new()),
            _ => Err(CudetError::config(
                "configuration file must contain a mapping at the top level",
            )),
        }
    }

    /// Expand environment variables in configuration content
    fn expand_env_vars(&self, content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| CudetError::config(format!("Invalid regex pattern: {}", e)))?;

        let mut result = content.to_string();
        let mut missing_vars = Vec::new();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];

            if let Some(value) = self.env_vars.get(var_name) {
                result = result.replace(placeholder, value);
            } else if !missing_vars.iter().any(|v| v == var_name) {
                missing_vars.push(var_name.to_string());
            }
        }

        if !missing_vars.is_empty() {
            return Err(CudetError::config(format!(
                "Missing environment variables: {}",
                missing_vars.join(", ")
            )));
        }

        Ok(result)
    }

    /// Set environment variable for substitution
    pub fn set_env_var(&mut self, key: String, value: String) {
        self.env_vars.insert(key, value);
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Overrides given on the command line, applied after the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub outdir: Option<String>,
    pub cudet_db_dir: Option<String>,
    pub fuel_ip: Option<String>,
    pub timeout: Option<u64>,
}

impl ConfigOverrides {
    /// Build the override mapping, expanding `~` in paths
    pub fn to_mapping(&self) -> Mapping {
        let mut map = Mapping::new();

        if let Some(outdir) = &self.outdir {
            map.insert("outdir".into(), expand_path(outdir).into());
        }
        if let Some(db_dir) = &self.cudet_db_dir {
            map.insert("cudet_db_dir".into(), expand_path(db_dir).into());
        }
        if let Some(fuel_ip) = &self.fuel_ip {
            map.insert("fuel_ip".into(), fuel_ip.clone().into());
        }
        if let Some(timeout) = self.timeout {
            map.insert("timeout".into(), timeout.into());
        }

        map
    }

    /// Apply the overrides to `config`
    pub fn apply(&self, config: &Config) -> Result<Config> {
        let merged = config.merge(&self.to_mapping())?;
        merged.validate()?;
        Ok(merged)
    }
}

fn expand_path(path: &str) -> String {
    shellexpand::tilde(path).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_env_var_expansion() {
        let mut loader = ConfigLoader::new();
        loader.set_env_var("TEST_VAR".to_string(), "test_value".to_string());

        let content = "key: ${TEST_VAR}";
        let result = loader.expand_env_vars(content).unwrap();
        assert_eq!(result, "key: test_value");
    }

    #[test]
    fn test_missing_env_var() {
        let loader = ConfigLoader::new();
        let content = "key: ${CUDET_MISSING_VAR}";

        let result = loader.expand_env_vars(content);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Missing environment variables"));
    }

    #[test]
    fn test_log_exclude_regex_is_not_expanded() {
        let loader = ConfigLoader::new();
        let content = r"exclude: '[-_]\d{8}$|atop[-_]|\.gz$'";
        assert_eq!(loader.expand_env_vars(content).unwrap(), content);
    }

    #[test]
    fn test_load_yaml_config() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            r#"
fuel_ip: 10.20.0.2
timeout: 120
cmds:
  - uptime
filters:
  roles: [controller]
"#
        )
        .unwrap();

        let config = ConfigLoader::new().load(file.path())?;

        assert_eq!(config.fuel_ip, "10.20.0.2");
        assert_eq!(config.timeout, 120);
        assert_eq!(config.cmds, vec!["uptime".to_string()]);
        assert_eq!(config.filters.roles, vec!["controller".to_string()]);
        assert_eq!(config.filters.status, vec!["ready".to_string()]);
        assert_eq!(config.prefix, "nice -n 19 ionice -c 3");

        Ok(())
    }

    #[test]
    fn test_load_json_and_toml_configs() -> Result<()> {
        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"{{"timeout": 45, "clean": false}}"#).unwrap();
        let config = ConfigLoader::new().load(json.path())?;
        assert_eq!(config.timeout, 45);
        assert!(!config.clean);

        let mut toml_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(toml_file, "timeout = 90\n\n[logs]\nstart = \"5\"").unwrap();
        let config = ConfigLoader::new().load(toml_file.path())?;
        assert_eq!(config.timeout, 90);
        assert_eq!(config.logs.start, "5");

        Ok(())
    }

    #[test]
    fn test_logs_start_accepts_integer() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "logs:\n  start: 30").unwrap();

        let config = ConfigLoader::new().load(file.path())?;

        assert_eq!(config.logs.start, "30");
        assert_eq!(config.logs.path, PathBuf::from("/var/log"));
        Ok(())
    }

    #[test]
    fn test_logs_start_rejects_non_numeric() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "logs:\n  start: soon").unwrap();

        assert!(ConfigLoader::new().load(file.path()).is_err());
    }

    #[test]
    fn test_empty_file_yields_defaults() -> Result<()> {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let config = ConfigLoader::new().load(file.path())?;
        assert_eq!(config, Config::default());
        Ok(())
    }

    #[test]
    fn test_missing_file_names_path() {
        let result = ConfigLoader::new().load("/nonexistent/cudet.yaml");
        let message = result.unwrap_err().to_string();
        assert!(message.contains("/nonexistent/cudet.yaml"));
    }

    #[test]
    fn test_non_mapping_rejected() {
        let result = ConfigLoader::new().parse_overrides("- a\n- b", ConfigFormat::Yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_overrides_apply_after_file() -> Result<()> {
        let base = Config::default().merge(&serde_yaml::from_str("timeout: 120")?)?;
        let overrides = ConfigOverrides {
            timeout: Some(5),
            outdir: Some("/var/tmp/cudet".to_string()),
            ..Default::default()
        };

        let config = overrides.apply(&base)?;

        assert_eq!(config.timeout, 5);
        assert_eq!(config.outdir, PathBuf::from("/var/tmp/cudet"));
        Ok(())
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.yml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("config")), ConfigFormat::Yaml);
    }
}
