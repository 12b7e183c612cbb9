use assert_cmd::Command;
use predicates::prelude::*;

const STATEMENT: &str = "\
JANE DOE CONSULTING LLC
123 MAIN ST
AUSTIN, TX 78701

Account Number: 000001234567
January 1, 2025 through January 31, 2025

DEPOSITS AND ADDITIONS
01/05 Remote Online Deposit 1,500.00
01/15 Orig CO Name:Acme Corp Payment 2,500.00
Total Deposits and Additions $4,000.00

ATM & DEBIT CARD WITHDRAWALS
01/08 Card Purchase 01/07 Shell Oil 5551212 Austin TX Card 1234 45.00
01/12 Card Purchase 01/11 Blue Bottle Coffee Austin TX Card 1234 6.50
Total ATM & Debit Card Withdrawals $51.50

ELECTRONIC WITHDRAWALS
01/20 Orig CO Name:Blue Cross Orig ID:12345 Desc Date:0120 450.00
Total Electronic Withdrawals $450.00
";

fn teller(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("teller").unwrap();
    cmd.env("HOME", home);
    cmd
}

fn init(home: &std::path::Path) {
    let data_dir = home.join("data");
    teller(home)
        .args(["init", "--data-dir", data_dir.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized database"));
}

#[test]
fn test_init_parse_and_report() {
    let home = tempfile::tempdir().unwrap();
    init(home.path());

    let statement = home.path().join("jan.txt");
    std::fs::write(&statement, STATEMENT).unwrap();

    teller(home.path())
        .args(["parse", statement.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("5 parsed, 5 stored"));

    // Same file again is caught by the checksum guard.
    teller(home.path())
        .args(["parse", statement.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("already been imported"));

    teller(home.path())
        .args(["report", "summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Income: $4,000.00"));

    teller(home.path())
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Transactions:  5"));
}

#[test]
fn test_parse_json_output() {
    let home = tempfile::tempdir().unwrap();
    init(home.path());

    let statement = home.path().join("jan.txt");
    std::fs::write(&statement, STATEMENT).unwrap();

    teller(home.path())
        .args(["parse", statement.to_str().unwrap(), "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"transaction_count\": 5"))
        .stdout(predicate::str::contains("\"total_income_cents\": 400000"));
}

#[test]
fn test_unreadable_statement_fails() {
    let home = tempfile::tempdir().unwrap();
    init(home.path());

    let statement = home.path().join("garbage.txt");
    std::fs::write(&statement, "   \n\t\n").unwrap();

    teller(home.path())
        .args(["parse", statement.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unreadable statement"));
}

#[test]
fn test_rules_add_list_and_review() {
    let home = tempfile::tempdir().unwrap();
    init(home.path());

    teller(home.path())
        .args(["rules", "add", "shell", "--category", "Car and Truck Expenses"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added rule"));

    teller(home.path())
        .args(["rules", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Car and Truck Expenses"))
        .stdout(predicate::str::contains("manual"));

    teller(home.path())
        .args(["rules", "add", "x", "--category", "Not A Category"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown category"));
}

#[test]
fn test_export_csv() {
    let home = tempfile::tempdir().unwrap();
    init(home.path());

    let statement = home.path().join("jan.txt");
    std::fs::write(&statement, STATEMENT).unwrap();
    teller(home.path())
        .args(["parse", statement.to_str().unwrap()])
        .assert()
        .success();

    let out = home.path().join("txns.csv");
    teller(home.path())
        .args(["export", "transactions", "--output", out.to_str().unwrap()])
        .assert()
        .success();
    let csv = std::fs::read_to_string(&out).unwrap();
    assert!(csv.starts_with("id,date,description,payee,amount"));
    assert_eq!(csv.lines().count(), 6);
}
