// file: tests/cli_test.rs
// version: 1.0.0
// guid: efc1ec79-cdf0-41a9-bcc0-eb51de6c5c6b

//! Command line tests for the cudet binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cudet() -> Command {
    let mut cmd = Command::cargo_bin("cudet").unwrap();
    cmd.env_remove("CUDET_CONFIG");
    cmd
}

#[test]
fn test_show_config_defaults() {
    cudet()
        .arg("show-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("timeout: 600"))
        .stdout(predicate::str::contains("nice -n 19 ionice -c 3"));
}

#[test]
fn test_show_config_json_with_overrides() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("cudet.yaml");
    fs::write(&config, "timeout: 120\n").unwrap();

    cudet()
        .args(["show-config", "--json", "--fuel-ip", "10.20.0.2", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"timeout\": 120"))
        .stdout(predicate::str::contains("\"fuel_ip\": \"10.20.0.2\""));
}

#[test]
fn test_update_db_appends_and_reports() {
    let dir = TempDir::new().unwrap();
    let listing = dir.path().join("listing.tsv");
    let db = dir.path().join("versions.tsv");
    fs::write(&listing, "pkgA\t1.0\tpkgA_1.0.deb\n").unwrap();
    fs::write(&db, "").unwrap();

    cudet()
        .args(["-q", "update-db", "--format", "tsv", "--release", "9.0", "--input"])
        .arg(&listing)
        .arg("--db")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 appended, 0 updated, 0 unchanged"));

    assert_eq!(
        fs::read_to_string(&db).unwrap(),
        "1\t0\t9.0\trelease\tubuntu\tpkgA\t1.0\tpkgA_1.0.deb\n"
    );
}

#[test]
fn test_update_db_missing_database_fails() {
    let dir = TempDir::new().unwrap();
    let listing = dir.path().join("listing.tsv");
    fs::write(&listing, "pkgA\t1.0\tpkgA_1.0.deb\n").unwrap();

    cudet()
        .args(["-q", "update-db", "--format", "tsv", "--release", "9.0", "--input"])
        .arg(&listing)
        .arg("--db")
        .arg(dir.path().join("nope.tsv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.tsv"));
}

#[test]
fn test_verify_reports_unknown_packages() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("versions.tsv");
    fs::write(&db, "1\t0\t9.0\trelease\tubuntu\tbash\t4.3\tbash_4.3.deb\n").unwrap();

    let node_dir = dir.path().join("info/cmds/cluster-1/node-3");
    fs::create_dir_all(&node_dir).unwrap();
    fs::write(
        node_dir.join("node-3-10.20.0.5.packagelist-ubuntu"),
        "bash\t1:4.3\ncurl\t7.35\n",
    )
    .unwrap();

    cudet()
        .args(["-q", "verify", "--release", "9.0", "--outdir"])
        .arg(dir.path().join("info"))
        .arg("--db")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("env 1, node 3: package not in db - curl (version 7.35)"))
        .stdout(predicate::str::contains("bash").not());
}

#[test]
fn test_verify_unknown_release() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("versions.tsv");
    fs::write(&db, "1\t0\t9.0\trelease\tubuntu\tbash\t4.3\tbash_4.3.deb\n").unwrap();

    cudet()
        .args(["-q", "verify", "--release", "7.0", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("does not have any data for release 7.0"));
}
