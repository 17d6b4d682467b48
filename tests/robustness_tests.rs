use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

#[test]
fn test_malformed_rows_are_skipped() {
    let valid_a = common::signed("a", 1, 1, "1.00");
    let valid_b = common::signed("b", 1, 1, "2.00");

    let file = tempfile::NamedTempFile::new().unwrap();
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(file.path())
        .unwrap();
    wtr.write_record(["transaction_id", "account_id", "user_id", "amount", "signature"])
        .unwrap();
    wtr.serialize(&valid_a).unwrap();
    // Non-numeric account
    wtr.write_record(["c", "abc", "1", "1.00", "00"]).unwrap();
    // Too many decimal places
    wtr.write_record(["d", "1", "1", "1.001", "00"]).unwrap();
    // Zero amount
    wtr.write_record(["e", "1", "1", "0", "00"]).unwrap();
    wtr.serialize(&valid_b).unwrap();
    wtr.flush().unwrap();
    drop(wtr);

    Command::new(cargo_bin!("sigledger"))
        .env("LEDGER_SECRET_KEY", common::SECRET)
        .arg("process")
        .arg(file.path())
        .args(["--users", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Error reading instruction"))
        .stdout(predicate::str::contains(r#""transaction_id":"c""#).not())
        .stdout(predicate::str::is_match(r"\n1,1,\d{20},3\.00\n").unwrap());
}

#[test]
fn test_unknown_user_is_reported() {
    let file = common::instructions_csv(&[common::signed("x", 1, 99, "1.00")]).unwrap();

    Command::new(cargo_bin!("sigledger"))
        .env("LEDGER_SECRET_KEY", common::SECRET)
        .arg("process")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""transaction_id":"x","error":"#))
        .stdout(predicate::str::contains(r#""status":400"#));
}
