use std::fs;

use assert_cmd::Command;
use predicates as pred;
use tempfile::tempdir;

#[test]
fn end_to_end_imports_backfills_and_scores() {
    let dir = tempdir().expect("create temp dir");

    let source = dir.path().join("source.json");
    fs::write(
        &source,
        r#"[
            {"customerName": "Alice Mwangi", "accountNo": "1234"},
            {"customerName": "Bob Okello", "accountNo": 5678}
        ]"#,
    )
    .unwrap();

    // one good record per customer plus one structurally broken record
    let customers = dir.path().join("customers.json");
    fs::write(
        &customers,
        r#"[
            {"customerName": "Alice Mwangi", "accountNo": "001234"},
            {"customerName": "Bob Okello", "accountNo": "5678"},
            {"customerName": "", "accountNo": "not-a-number"}
        ]"#,
    )
    .unwrap();

    // a self-directed in-bank transfer lands as a credit for Alice;
    // Bob stays untouched and gets synthetic history
    let transactions = dir.path().join("transactions.json");
    fs::write(
        &transactions,
        r#"[
            {"fromAccount": "1234", "toAccount": "1234", "amount": "250.75",
             "date": "2025-03-01", "transactionType": "withInBank Transaction"}
        ]"#,
    )
    .unwrap();

    let exe = env!("CARGO_BIN_EXE_credit_engine");
    let mut cmd = Command::new(exe);
    cmd.arg(&source)
        .arg(&customers)
        .arg(&transactions)
        .arg("--seed")
        .arg("7");

    cmd.assert()
        .success()
        .stdout(pred::str::contains("\"customers\""))
        .stdout(pred::str::contains("\"pipeline\""))
        .stdout(pred::str::contains("\"clearedBalance\": \"250.75\""))
        .stdout(pred::str::contains("\"synthetic\": true"))
        .stdout(pred::str::contains("\"score\""))
        .stdout(pred::str::contains("customer name is required"));
}

#[test]
fn fully_invalid_transaction_batch_exits_nonzero_with_logs() {
    let dir = tempdir().expect("create temp dir");

    let source = dir.path().join("source.json");
    fs::write(&source, r#"[{"customerName": "Alice Mwangi", "accountNo": "1234"}]"#).unwrap();

    let customers = dir.path().join("customers.json");
    fs::write(&customers, r#"[{"customerName": "Alice Mwangi", "accountNo": "1234"}]"#).unwrap();

    let transactions = dir.path().join("transactions.json");
    fs::write(
        &transactions,
        r#"[{"fromAccount": "9999", "amount": 10, "date": "2025-01-01"}]"#,
    )
    .unwrap();

    let exe = env!("CARGO_BIN_EXE_credit_engine");
    let mut cmd = Command::new(exe);
    cmd.arg(&source).arg(&customers).arg(&transactions);

    cmd.assert()
        .failure()
        .stdout(pred::str::contains("no customer found for account 9999"))
        .stderr(pred::str::contains("no valid transactions imported"));
}

#[test]
fn missing_arguments_print_usage() {
    let exe = env!("CARGO_BIN_EXE_credit_engine");
    let mut cmd = Command::new(exe);
    cmd.assert()
        .code(2)
        .stderr(pred::str::contains("usage: credit_engine"));
}
