use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use sigledger::domain::transaction::TransactionInstruction;
use sigledger::signature;
use std::process::Command;

mod common;

fn ledger() -> Command {
    let mut cmd = Command::new(cargo_bin!("sigledger"));
    cmd.env("LEDGER_SECRET_KEY", common::SECRET);
    cmd
}

#[test]
fn test_order_prints_signed_instruction() -> Result<(), Box<dyn std::error::Error>> {
    let output = ledger()
        .args(["order", "--account-id", "1", "--user-id", "2"])
        .args(["--amount", "-12.5", "--transaction-id", "order-1"])
        .output()?;
    assert!(output.status.success());

    let order: TransactionInstruction = serde_json::from_slice(&output.stdout)?;
    assert_eq!(order.transaction_id.as_str(), "order-1");
    assert_eq!(order.amount.to_string(), "-12.50");
    assert!(signature::verify(&order, &common::secret()));

    let expected = common::signed("order-1", 1, 2, "-12.50").signature;
    assert_eq!(order.signature, expected);
    Ok(())
}

#[test]
fn test_order_generates_transaction_id() -> Result<(), Box<dyn std::error::Error>> {
    let output = ledger()
        .args(["order", "--account-id", "1", "--user-id", "1", "--amount", "5"])
        .output()?;
    assert!(output.status.success());

    let order: TransactionInstruction = serde_json::from_slice(&output.stdout)?;
    assert!(!order.transaction_id.as_str().is_empty());
    assert!(signature::verify(&order, &common::secret()));
    Ok(())
}

fn stdout_of(cmd: &mut Command) -> Result<String, Box<dyn std::error::Error>> {
    let output = cmd.output()?;
    assert!(output.status.success());
    Ok(String::from_utf8(output.stdout)?)
}

#[test]
fn test_process_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    // No outcome depends on row order: t2 can never be covered by 120.00.
    let file = common::instructions_csv(&[
        common::signed("t1", 1, 1, "100.00"),
        common::signed("t1", 1, 1, "100.00"),
        common::signed("t2", 1, 1, "-150.00"),
        common::signed("t3", 1, 1, "20.00"),
    ])?;

    let stdout = stdout_of(
        ledger()
            .arg("process")
            .arg(file.path())
            .args(["--users", "1"]),
    )?;

    assert_eq!(stdout.matches(r#""result":"ok""#).count(), 2);
    assert_eq!(
        stdout
            .matches(r#"{"transaction_id":"t1","error":"The payment #t1 is processed","status":400}"#)
            .count(),
        1
    );
    assert!(stdout.contains(r#"{"transaction_id":"t2","error":"#));
    assert!(stdout.contains("user_id,account_id,account_number,balance"));
    assert!(predicate::str::is_match(r"\n1,1,40817\d{15},120\.00\n")?.eval(&stdout));
    Ok(())
}

#[test]
fn test_process_many_rows_against_one_account() -> Result<(), Box<dyn std::error::Error>> {
    let mut rows: Vec<_> = (0..20)
        .map(|i| common::signed(&format!("c{}", i), 1, 1, "5.00"))
        .collect();
    rows.push(common::signed("c3", 1, 1, "5.00"));
    rows.push(common::signed("c7", 1, 1, "5.00"));
    rows.extend((0..5).map(|i| common::signed(&format!("d{}", i), 1, 1, "-1.00")));
    let file = common::instructions_csv(&rows)?;

    let stdout = stdout_of(
        ledger()
            .arg("process")
            .arg(file.path())
            .args(["--users", "1"]),
    )?;

    // Debits may run before any credit lands, so only the credits are fixed.
    let report: Vec<serde_json::Value> = stdout
        .lines()
        .filter(|line| line.starts_with('{'))
        .map(serde_json::from_str::<serde_json::Value>)
        .collect::<Result<_, _>>()?;
    assert_eq!(report.len(), rows.len());
    for (line, row) in report.iter().zip(&rows) {
        assert_eq!(line["transaction_id"], row.transaction_id.as_str());
    }

    let replays = report
        .iter()
        .filter(|line| line["status"] == 400 && line["transaction_id"].as_str().unwrap().starts_with('c'))
        .count();
    assert_eq!(replays, 2);

    let debits_ok = report
        .iter()
        .filter(|line| line["result"] == "ok" && line["transaction_id"].as_str().unwrap().starts_with('d'))
        .count();
    let expected = format!(",{}.00\n", 100 - debits_ok);
    assert!(stdout.ends_with(&expected), "{}", stdout);
    Ok(())
}

#[test]
fn test_process_rejects_foreign_signature() -> Result<(), Box<dyn std::error::Error>> {
    let file = common::instructions_csv(&[common::signed("t1", 1, 1, "10.00")])?;

    Command::new(cargo_bin!("sigledger"))
        .env("LEDGER_SECRET_KEY", "another-secret")
        .arg("process")
        .arg(file.path())
        .args(["--users", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""status":400"#))
        .stdout(predicate::str::contains("1,1,").and(predicate::str::contains(",0.00")));

    Ok(())
}

#[test]
fn test_missing_secret_fails() {
    Command::new(cargo_bin!("sigledger"))
        .env_remove("LEDGER_SECRET_KEY")
        .args(["order", "--account-id", "1", "--user-id", "1", "--amount", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("secret-key"));
}
