//! CLI and basic command tests

mod common;

use common::{
    create_item, create_user, data_dir, dlms, dlms_as, json_output, setup_campus, setup_store,
};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    dlms(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Digital Ledger Management System"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    dlms(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dlms"));
}

#[test]
fn test_unknown_command_fails() {
    let tmp = TempDir::new().unwrap();
    dlms(&tmp)
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_completions_generate() {
    let tmp = TempDir::new().unwrap();
    dlms(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dlms"));
}

// ============================================================================
// Init Command Tests
// ============================================================================

#[test]
fn test_init_creates_tables_and_config() {
    let tmp = TempDir::new().unwrap();

    dlms(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    let dir = data_dir(&tmp);
    assert!(dir.join("dlms.yaml").exists());
    for table in [
        "users.csv",
        "items.csv",
        "departments.csv",
        "s156.csv",
        "ledger.csv",
        "pll.csv",
        "summary.csv",
        "returns.csv",
        "survey.csv",
        "writeoff.csv",
    ] {
        assert!(dir.join(table).exists(), "{} missing", table);
    }
}

#[test]
fn test_init_fails_if_already_initialized() {
    let tmp = setup_store();
    dlms(&tmp)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn test_init_force_keeps_tables() {
    let tmp = setup_store();
    let config = data_dir(&tmp).join("dlms.yaml");
    fs::write(&config, "workflow:\n  complete_returns: true\n").unwrap();

    dlms(&tmp).args(["init", "--force"]).assert().success();

    let rewritten = fs::read_to_string(&config).unwrap();
    assert!(rewritten.contains("complete_returns: false"));
    let users = fs::read_to_string(data_dir(&tmp).join("users.csv")).unwrap();
    assert!(users.contains("admin"));
}

#[test]
fn test_commands_require_init() {
    let tmp = TempDir::new().unwrap();
    dlms_as(&tmp, "admin")
        .args(["item", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No DLMS data directory"));
}

// ============================================================================
// Users and Departments
// ============================================================================

#[test]
fn test_whoami() {
    let tmp = setup_campus();
    dlms_as(&tmp, "physics")
        .arg("user")
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Department"))
        .stdout(predicate::str::contains("Physics"));
}

#[test]
fn test_user_from_environment() {
    let tmp = setup_campus();
    dlms(&tmp)
        .env("DLMS_USER", "store")
        .args(["user", "whoami"])
        .assert()
        .success()
        .stdout(predicate::str::contains("store"));
}

#[test]
fn test_missing_operator_fails() {
    let tmp = setup_campus();
    dlms(&tmp)
        .args(["item", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No operator"));
}

#[test]
fn test_unknown_user_fails() {
    let tmp = setup_campus();
    dlms_as(&tmp, "ghost")
        .args(["item", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown_user"));
}

#[test]
fn test_only_admin_adds_users() {
    let tmp = setup_campus();
    dlms_as(&tmp, "store")
        .args(["user", "add", "eve", "--role", "admin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unauthorized"));
}

#[test]
fn test_department_user_needs_existing_department() {
    let tmp = setup_campus();
    dlms_as(&tmp, "admin")
        .args(["user", "add", "bio", "--role", "department", "--department", "Biology"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not_found"));
}

#[test]
fn test_duplicate_department_fails() {
    let tmp = setup_campus();
    dlms_as(&tmp, "admin")
        .args(["dept", "add", "Physics"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already_exists"));
}

#[test]
fn test_user_list_json() {
    let tmp = setup_campus();
    let users = json_output(&tmp, "admin", &["user", "list"]);
    let names: Vec<&str> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["admin", "store", "physics", "chem"]);
}

// ============================================================================
// Items
// ============================================================================

#[test]
fn test_item_list_table() {
    let tmp = setup_campus();
    dlms_as(&tmp, "store")
        .args(["item", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Chair"))
        .stdout(predicate::str::contains("Chalk"))
        .stdout(predicate::str::contains("2 items"));
}

#[test]
fn test_item_list_tsv() {
    let tmp = setup_campus();
    dlms_as(&tmp, "store")
        .args(["--format", "tsv", "item", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NAME\tLEDGER\tFOLIO\tTYPE\tSTOCK"))
        .stdout(predicate::str::contains("Chair\tGeneral\t7\tPermanent\t10"));
}

#[test]
fn test_available_lists_only_permanent_stock() {
    let tmp = setup_campus();
    create_item(&tmp, "Bench", "permanent", 0);

    let items = json_output(&tmp, "physics", &["item", "available"]);
    let names: Vec<&str> = items
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Chair"]);
}

#[test]
fn test_receive_stock() {
    let tmp = setup_campus();
    let item = json_output(&tmp, "store", &["item", "receive", "Chair", "5"]);
    assert_eq!(item["stock"], 15);

    dlms_as(&tmp, "physics")
        .args(["item", "receive", "Chair", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unauthorized"));
}

#[test]
fn test_duplicate_item_fails() {
    let tmp = setup_campus();
    dlms_as(&tmp, "store")
        .args(["item", "add", "Chair", "--ledger", "L", "--folio", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already_exists"));
}

#[test]
fn test_empty_list_message() {
    let tmp = setup_campus();
    dlms_as(&tmp, "store")
        .arg("ledger")
        .assert()
        .success()
        .stdout(predicate::str::contains("No ledger entries found."));
}

#[test]
fn test_tables_are_plain_csv() {
    let tmp = setup_store();
    create_user(&tmp, "store", "store", None);
    create_item(&tmp, "Chair", "permanent", 10);

    let items = fs::read_to_string(data_dir(&tmp).join("items.csv")).unwrap();
    let mut lines = items.lines();
    assert_eq!(
        lines.next(),
        Some("name,ledger_name,folio_number,item_type,stock")
    );
    assert_eq!(lines.next(), Some("Chair,General,7,Permanent,10"));
}
