// file: src/versions/verify.rs
// version: 1.0.1
// guid: f30a4608-2cad-447e-82e2-8498dbc6aec6

//! Comparison of collected node package lists against the version database

use super::database::VersionDb;
use super::record::DbRow;
use crate::{CudetError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File name marker of collected package lists
pub const PACKAGE_LIST_MARKER: &str = ".packagelist-";

/// File name marker of package checksum verification output
pub const MD5_REPORT_MARKER: &str = ".packages-md5-verify-";

/// Packages whose checksum mismatches are expected
pub const MD5_IGNORED_PACKAGES: &[&str] = &["vim-tiny"];

/// Operating system of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeOs {
    Ubuntu,
    Centos,
}

impl NodeOs {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeOs::Ubuntu => "ubuntu",
            NodeOs::Centos => "centos",
        }
    }

    /// Whether an installed version corresponds to a database version.
    ///
    /// Ubuntu versions may carry an epoch prefix (`1:`) that the database
    /// omits; CentOS versions must be identical.
    pub fn version_matches(&self, installed: &str, db_version: &str) -> bool {
        match self {
            NodeOs::Ubuntu => {
                let pattern = format!(r"^(\d+:)?{}$", regex::escape(db_version));
                Regex::new(&pattern)
                    .map(|re| re.is_match(installed))
                    .unwrap_or(false)
            }
            NodeOs::Centos => installed == db_version,
        }
    }
}

/// A collected package list for one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageList {
    pub path: PathBuf,
    pub cluster_id: u32,
    pub node_id: u32,
    pub os: NodeOs,
}

/// Verdict for one installed package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// Version known for the node's release
    Match,
    /// Package unknown in every release
    NotInDb,
    /// Package known only for other releases
    PackageFromDifferentRelease,
    /// Version known, but for another release
    VersionFromDifferentRelease(DbRow),
    /// Package known, version unknown in every release
    VersionNotInDb,
}

/// Result of checking one installed package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCheck {
    pub cluster_id: u32,
    pub node_id: u32,
    pub name: String,
    pub version: String,
    pub finding: Finding,
}

impl PackageCheck {
    pub fn is_match(&self) -> bool {
        self.finding == Finding::Match
    }
}

impl fmt::Display for PackageCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "env {}, node {}: ", self.cluster_id, self.node_id)?;
        match &self.finding {
            Finding::Match => write!(
                f,
                "package matches - {} (version {})",
                self.name, self.version
            ),
            Finding::NotInDb => write!(
                f,
                "package not in db - {} (version {})",
                self.name, self.version
            ),
            Finding::PackageFromDifferentRelease => write!(
                f,
                "package from a different release - {} (version {})",
                self.name, self.version
            ),
            Finding::VersionFromDifferentRelease(row) => write!(
                f,
                "package version from a different release - {}, version {}, release data: {}",
                self.name,
                self.version,
                row.to_line()
            ),
            Finding::VersionNotInDb => write!(
                f,
                "package version not in db - {}, version {}",
                self.name, self.version
            ),
        }
    }
}

/// A package reported by the on-node checksum verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Md5Issue {
    pub cluster_id: u32,
    pub node_id: u32,
    pub package: String,
    pub details: String,
}

impl fmt::Display for Md5Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "env {}, node {}: {} - {}",
            self.cluster_id, self.node_id, self.package, self.details
        )
    }
}

/// Read the management node release from its `version.yaml`
pub fn read_release(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path).map_err(|e| CudetError::io_at(path, e))?;
    let doc: Value = serde_yaml::from_str(&content)?;

    let release = doc
        .get("VERSION")
        .and_then(|v| v.get("release"))
        .or_else(|| doc.get("release"));

    match release {
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(CudetError::parse(format!(
            "no release found in {}",
            path.display()
        ))),
    }
}

/// Cluster and node ids from `/cluster-N/` and `/node-N/` path components
fn node_ids(path: &Path) -> Option<(u32, u32)> {
    let mut cluster = None;
    let mut node = None;

    for component in path.components() {
        let part = component.as_os_str().to_str()?;
        if let Some(id) = part.strip_prefix("cluster-") {
            cluster = id.parse().ok().or(cluster);
        } else if let Some(id) = part.strip_prefix("node-") {
            node = id.parse().ok().or(node);
        }
    }

    Some((cluster?, node?))
}

fn files_with_marker(outdir: &Path, marker: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if !outdir.exists() {
        warn!("Output directory {} does not exist", outdir.display());
        return Ok(found);
    }

    for entry in WalkDir::new(outdir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            CudetError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("{}: {}", outdir.display(), e),
            ))
        })?;
        if entry.file_type().is_file()
            && entry.file_name().to_string_lossy().contains(marker)
        {
            found.push(entry.into_path());
        }
    }

    Ok(found)
}

/// Find collected package lists under `outdir`
pub fn find_package_lists(outdir: &Path) -> Result<Vec<PackageList>> {
    let mut lists = Vec::new();

    for path in files_with_marker(outdir, PACKAGE_LIST_MARKER)? {
        let name = path.to_string_lossy().to_string();
        let os = if name.ends_with("-ubuntu") {
            NodeOs::Ubuntu
        } else if name.ends_with("-centos") {
            NodeOs::Centos
        } else {
            warn!("Unknown OS, skipping data file {}", path.display());
            continue;
        };

        let Some((cluster_id, node_id)) = node_ids(&path) else {
            warn!("No cluster/node id in path, skipping {}", path.display());
            continue;
        };

        lists.push(PackageList {
            path,
            cluster_id,
            node_id,
            os,
        });
    }

    debug!("Found {} package lists under {}", lists.len(), outdir.display());
    Ok(lists)
}

/// Classify one installed package against the database
pub fn check_package(
    db: &VersionDb,
    release: &str,
    os: NodeOs,
    name: &str,
    version: &str,
) -> Finding {
    let same_release: Vec<&DbRow> = db.find(name, os.as_str(), Some(release)).collect();

    if same_release.is_empty() {
        return if db.find(name, os.as_str(), None).next().is_some() {
            Finding::PackageFromDifferentRelease
        } else {
            Finding::NotInDb
        };
    }

    if same_release
        .iter()
        .any(|row| os.version_matches(version, &row.record.version))
    {
        return Finding::Match;
    }

    match db
        .find(name, os.as_str(), None)
        .find(|row| os.version_matches(version, &row.record.version))
    {
        Some(row) => Finding::VersionFromDifferentRelease(row.clone()),
        None => Finding::VersionNotInDb,
    }
}

/// Check every package of a collected list
pub fn verify_package_list(
    db: &VersionDb,
    release: &str,
    list: &PackageList,
) -> Result<Vec<PackageCheck>> {
    let content =
        fs::read_to_string(&list.path).map_err(|e| CudetError::io_at(&list.path, e))?;
    let mut checks = Vec::new();

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let (name, version) = line.split_once('\t').ok_or_else(|| {
            CudetError::parse(format!(
                "{}:{}: expected 'name<TAB>version'",
                list.path.display(),
                index + 1
            ))
        })?;

        checks.push(PackageCheck {
            cluster_id: list.cluster_id,
            node_id: list.node_id,
            name: name.to_string(),
            version: version.to_string(),
            finding: check_package(db, release, list.os, name, version),
        });
    }

    Ok(checks)
}

/// Collect checksum verification failures under `outdir`
pub fn find_md5_issues(outdir: &Path) -> Result<Vec<Md5Issue>> {
    let mut issues = Vec::new();

    for path in files_with_marker(outdir, MD5_REPORT_MARKER)? {
        let Some((cluster_id, node_id)) = node_ids(&path) else {
            warn!("No cluster/node id in path, skipping {}", path.display());
            continue;
        };

        let content = fs::read_to_string(&path).map_err(|e| CudetError::io_at(&path, e))?;
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let (package, details) = line.split_once('\t').ok_or_else(|| {
                CudetError::parse(format!(
                    "{}:{}: expected 'package<TAB>details'",
                    path.display(),
                    index + 1
                ))
            })?;

            if MD5_IGNORED_PACKAGES.contains(&package) {
                continue;
            }

            issues.push(Md5Issue {
                cluster_id,
                node_id,
                package: package.to_string(),
                details: details.to_string(),
            });
        }
    }

    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DB: &str = "\
1\t0\t9.0\trelease\tubuntu\tbash\t4.3-7ubuntu1.7\tbash_4.3-7ubuntu1.7_amd64.deb
2\t0\t8.0\trelease\tubuntu\tbash\t4.3-7ubuntu1.5\tbash_4.3-7ubuntu1.5_amd64.deb
3\t0\t8.0\trelease\tubuntu\tpython-nova\t2015.1.1\tpython-nova_2015.1.1_all.deb
4\t0\t9.0\trelease\tcentos\tnginx\t1.10.1-1.el7\tnginx-1.10.1-1.el7.x86_64.rpm
";

    fn db() -> VersionDb {
        VersionDb::parse("versions.tsv", DB).unwrap()
    }

    #[test]
    fn test_ubuntu_epoch_is_optional() {
        assert!(NodeOs::Ubuntu.version_matches("1:4.3-7ubuntu1.7", "4.3-7ubuntu1.7"));
        assert!(NodeOs::Ubuntu.version_matches("4.3-7ubuntu1.7", "4.3-7ubuntu1.7"));
        assert!(!NodeOs::Ubuntu.version_matches("4.3-7ubuntu1.77", "4.3-7ubuntu1.7"));
        assert!(!NodeOs::Centos.version_matches("1:1.10.1-1.el7", "1.10.1-1.el7"));
    }

    #[test]
    fn test_check_package_findings() {
        let db = db();

        assert_eq!(
            check_package(&db, "9.0", NodeOs::Ubuntu, "bash", "4.3-7ubuntu1.7"),
            Finding::Match
        );
        assert_eq!(
            check_package(&db, "9.0", NodeOs::Ubuntu, "vim", "7.4"),
            Finding::NotInDb
        );
        assert_eq!(
            check_package(&db, "9.0", NodeOs::Ubuntu, "python-nova", "2015.1.1"),
            Finding::PackageFromDifferentRelease
        );
        assert_eq!(
            check_package(&db, "9.0", NodeOs::Ubuntu, "bash", "4.3-0"),
            Finding::VersionNotInDb
        );

        match check_package(&db, "9.0", NodeOs::Ubuntu, "bash", "4.3-7ubuntu1.5") {
            Finding::VersionFromDifferentRelease(row) => assert_eq!(row.release, "8.0"),
            other => panic!("unexpected finding {:?}", other),
        }
    }

    #[test]
    fn test_read_release() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("version.yaml");
        fs::write(&path, "VERSION:\n  feature_groups: []\n  release: \"9.0\"\n").unwrap();
        assert_eq!(read_release(&path).unwrap(), "9.0");

        fs::write(&path, "release: '8.0'\n").unwrap();
        assert_eq!(read_release(&path).unwrap(), "8.0");

        fs::write(&path, "api: 1\n").unwrap();
        assert!(read_release(&path).is_err());
    }

    #[test]
    fn test_node_ids_from_path() {
        let path =
            Path::new("/tmp/out/cmds/cluster-3/node-12/node-12-10.20.0.4.packagelist-ubuntu");
        assert_eq!(node_ids(path), Some((3, 12)));
        assert_eq!(node_ids(Path::new("/tmp/out/x.packagelist-ubuntu")), None);
    }

    #[test]
    fn test_find_and_verify_package_lists() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let node_dir = dir.path().join("cmds/cluster-1/node-2");
        fs::create_dir_all(&node_dir)?;
        fs::write(
            node_dir.join("node-2-10.20.0.3.packagelist-ubuntu"),
            "bash\t4.3-7ubuntu1.7\nvim\t7.4\n",
        )?;
        fs::write(node_dir.join("node-2-10.20.0.3.packagelist-debian"), "bash\t1\n")?;

        let lists = find_package_lists(dir.path())?;
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].os, NodeOs::Ubuntu);
        assert_eq!((lists[0].cluster_id, lists[0].node_id), (1, 2));

        let checks = verify_package_list(&db(), "9.0", &lists[0])?;
        assert_eq!(checks.len(), 2);
        assert!(checks[0].is_match());
        assert_eq!(checks[1].finding, Finding::NotInDb);
        assert_eq!(
            checks[1].to_string(),
            "env 1, node 2: package not in db - vim (version 7.4)"
        );

        Ok(())
    }

    #[test]
    fn test_md5_issues_skip_ignored_packages() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let node_dir = dir.path().join("cmds/cluster-1/node-5");
        fs::create_dir_all(&node_dir)?;
        fs::write(
            node_dir.join("node-5-10.20.0.6.packages-md5-verify-ubuntu"),
            "vim-tiny\t/usr/bin/vim.tiny\nnova-common\t/etc/nova/nova.conf\n",
        )?;
        fs::write(
            node_dir.join("node-5-10.20.0.6.packages-md5-verify-centos"),
            "",
        )?;

        let issues = find_md5_issues(dir.path())?;
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].to_string(),
            "env 1, node 5: nova-common - /etc/nova/nova.conf"
        );

        Ok(())
    }
}
