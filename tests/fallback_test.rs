use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let file = common::instructions_csv(&[common::signed("t1", 1, 1, "10.00")]).unwrap();

    Command::new(cargo_bin!("sigledger"))
        .env("LEDGER_SECRET_KEY", common::SECRET)
        .arg("--db-path")
        .arg("some_db")
        .arg("process")
        .arg(file.path())
        .args(["--users", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage.",
        ))
        .stdout(predicate::str::contains(r#""balance":"10.00""#));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let file = common::instructions_csv(&[common::signed("t1", 1, 1, "10.00")]).unwrap();
    let dir = tempfile::tempdir().unwrap();

    Command::new(cargo_bin!("sigledger"))
        .env("LEDGER_SECRET_KEY", common::SECRET)
        .arg("--db-path")
        .arg(dir.path().join("test_db"))
        .arg("process")
        .arg(file.path())
        .args(["--users", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Falling back").not());
}
