// file: src/config/mod.rs
// version: 1.0.1
// guid: 40ea1c35-3b77-4904-9a85-1133912ee981

//! Configuration module for cudet
//!
//! Holds the collector settings with their defaults, file loading with
//! environment variable substitution, and shallow override merging.

pub mod loader;
pub mod validator;

pub use loader::{ConfigFormat, ConfigLoader, ConfigOverrides};

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::PathBuf;

/// Suffix format used for timestamped output names
pub const TIMESTAMP_FORMAT: &str = "_%Y-%m-%d_%H-%M-%S";

/// Settings consumed by the collector at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Management node address
    pub fuel_ip: String,
    /// Management API port
    pub fuel_port: u16,
    /// Bypass any configured HTTP proxy when talking to the API
    pub fuel_skip_proxy: bool,
    pub fuel_user: String,
    pub fuel_pass: String,
    pub fuel_tenant: String,
    /// Directory holding request definitions
    pub rqdir: PathBuf,
    /// Request definitions file
    pub rqfile: PathBuf,
    /// Directory holding the package version databases
    pub cudet_db_dir: PathBuf,
    /// Local output directory for collected data
    pub outdir: PathBuf,
    /// Append a timestamp to every output file name
    pub outputs_timestamp: bool,
    /// Append a timestamp to the output directory
    pub dir_timestamp: bool,
    /// Remove the output directory before collecting
    pub clean: bool,
    pub put: Vec<String>,
    pub cmds: Vec<String>,
    pub scripts: Vec<String>,
    pub files: Vec<String>,
    pub filelists: Vec<String>,
    pub logs: LogsConfig,
    pub filters: FiltersConfig,
    /// Shell prefix for remote command execution
    pub prefix: String,
    pub ssh_opts: Vec<String>,
    /// Environment assignments exported for remote execution
    pub env_vars: Vec<String>,
    /// Per-command collection timeout in seconds
    pub timeout: u64,
}

/// Log collection rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogsConfig {
    /// Root directory to collect logs from
    pub path: PathBuf,
    /// Regex of file names to skip
    pub exclude: String,
    /// Only collect logs modified within this many days
    #[serde(deserialize_with = "string_or_int")]
    pub start: String,
}

/// Accept `start: 30` as well as `start: '30'`
fn string_or_int<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        String(String),
        Int(i64),
    }

    Ok(match StringOrInt::deserialize(deserializer)? {
        StringOrInt::String(s) => s,
        StringOrInt::Int(n) => n.to_string(),
    })
}

/// Node selection predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FiltersConfig {
    pub status: Vec<String>,
    pub online: bool,
    pub roles: Vec<String>,
    pub id: Vec<u32>,
    pub cluster: Vec<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fuel_ip: "127.0.0.1".to_string(),
            fuel_port: 8000,
            fuel_skip_proxy: true,
            fuel_user: "admin".to_string(),
            fuel_pass: "admin".to_string(),
            fuel_tenant: "admin".to_string(),
            rqdir: PathBuf::from("/usr/share/cudet/rq"),
            rqfile: PathBuf::from("/usr/share/cudet/rq.yaml"),
            cudet_db_dir: PathBuf::from("/usr/share/cudet/db"),
            outdir: PathBuf::from("/tmp/cudet/info"),
            outputs_timestamp: false,
            dir_timestamp: false,
            clean: true,
            put: vec![],
            cmds: vec![],
            scripts: vec![],
            files: vec![],
            filelists: vec![],
            logs: LogsConfig::default(),
            filters: FiltersConfig::default(),
            prefix: "nice -n 19 ionice -c 3".to_string(),
            ssh_opts: vec![
                "-oConnectTimeout=2".to_string(),
                "-oStrictHostKeyChecking=no".to_string(),
                "-oUserKnownHostsFile=/dev/null".to_string(),
                "-oLogLevel=error".to_string(),
                "-lroot".to_string(),
                "-oBatchMode=yes".to_string(),
            ],
            env_vars: vec![
                "OPENRC=/root/openrc".to_string(),
                "IPTABLES_STR=\"iptables -nvL\"".to_string(),
                "LC_ALL=\"C\"".to_string(),
                "LANG=\"C\"".to_string(),
            ],
            timeout: 600,
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/var/log"),
            exclude: r"[-_]\d{8}$|atop[-_]|\.gz$".to_string(),
            start: "30".to_string(),
        }
    }
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            status: vec!["ready".to_string()],
            online: true,
            roles: vec![],
            id: vec![],
            cluster: vec![],
        }
    }
}

impl Config {
    /// Replace top-level keys with the values from `overrides`.
    ///
    /// Replacement is shallow: a list or nested section given in the
    /// overrides replaces the current value wholesale. Keys missing inside a
    /// replaced nested section fall back to that section's defaults, not to
    /// the current values.
    pub fn merge(&self, overrides: &Mapping) -> crate::Result<Config> {
        let mut base = match serde_yaml::to_value(self)? {
            Value::Mapping(map) => map,
            _ => return Err(crate::CudetError::config("configuration is not a mapping")),
        };

        for (key, value) in overrides {
            let name = key
                .as_str()
                .ok_or_else(|| crate::CudetError::config(format!("non-string key: {:?}", key)))?;
            if !base.contains_key(key) {
                return Err(crate::CudetError::config(format!("unknown key: {}", name)));
            }
            tracing::debug!("Overriding configuration key {}", name);
            base.insert(key.clone(), value.clone());
        }

        Ok(serde_yaml::from_value(Value::Mapping(base))?)
    }

    /// Validate field values
    pub fn validate(&self) -> crate::Result<()> {
        validator::validate_config(self)
    }

    /// Effective output directory, timestamped when `dir_timestamp` is set
    pub fn output_dir<Tz>(&self, now: &DateTime<Tz>) -> PathBuf
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        if self.dir_timestamp {
            let mut dir = self.outdir.clone().into_os_string();
            dir.push(now.format(TIMESTAMP_FORMAT).to_string());
            PathBuf::from(dir)
        } else {
            self.outdir.clone()
        }
    }

    /// Suffix appended to output file names when `outputs_timestamp` is set
    pub fn output_suffix<Tz>(&self, now: &DateTime<Tz>) -> Option<String>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        self.outputs_timestamp
            .then(|| now.format(TIMESTAMP_FORMAT).to_string())
    }

    /// Credential assignments for the management CLI
    pub fn cli_credentials(&self) -> String {
        format!(
            "OS_TENANT_NAME={} OS_USERNAME={} OS_PASSWORD={}",
            self.fuel_tenant, self.fuel_user, self.fuel_pass
        )
    }
}
