//! Shared test helpers for integration tests

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to get a dlms command isolated inside `tmp`
///
/// The data directory is `<tmp>/data` and the user config points at a file
/// that does not exist, so the developer's own settings never leak in.
pub fn dlms(tmp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("dlms"));
    cmd.current_dir(tmp.path())
        .env("DLMS_DATA_DIR", data_dir(tmp))
        .env("DLMS_CONFIG", tmp.path().join("no-user-config.yaml"))
        .env_remove("DLMS_USER")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to get a dlms command run as `user`
pub fn dlms_as(tmp: &TempDir, user: &str) -> Command {
    let mut cmd = dlms(tmp);
    cmd.args(["--user", user]);
    cmd
}

pub fn data_dir(tmp: &TempDir) -> PathBuf {
    tmp.path().join("data")
}

/// Helper to create an initialized data directory with an `admin` user
pub fn setup_store() -> TempDir {
    let tmp = TempDir::new().unwrap();
    dlms(&tmp)
        .args(["init", "--admin", "admin"])
        .assert()
        .success();
    tmp
}

/// Helper to create a store with two departments, their users, a store
/// keeper, 10 chairs and 100 sticks of chalk
///
/// Users: `admin`, `store`, `physics` (Physics), `chem` (Chemistry).
pub fn setup_campus() -> TempDir {
    let tmp = setup_store();
    for dept in ["Physics", "Chemistry"] {
        dlms_as(&tmp, "admin")
            .args(["dept", "add", dept])
            .assert()
            .success();
    }
    create_user(&tmp, "store", "store", None);
    create_user(&tmp, "physics", "department", Some("Physics"));
    create_user(&tmp, "chem", "department", Some("Chemistry"));
    create_item(&tmp, "Chair", "permanent", 10);
    create_item(&tmp, "Chalk", "consumable", 100);
    tmp
}

pub fn create_user(tmp: &TempDir, username: &str, role: &str, department: Option<&str>) {
    let mut cmd = dlms_as(tmp, "admin");
    cmd.args(["user", "add", username, "--role", role]);
    if let Some(dept) = department {
        cmd.args(["--department", dept]);
    }
    cmd.assert().success();
}

pub fn create_item(tmp: &TempDir, name: &str, item_type: &str, stock: u32) {
    dlms_as(tmp, "store")
        .args([
            "item",
            "add",
            name,
            "--ledger",
            "General",
            "--folio",
            "7",
            "--type",
            item_type,
            "--stock",
            &stock.to_string(),
        ])
        .assert()
        .success();
}

/// Run a command with `--format json` and parse its stdout
pub fn json_output(tmp: &TempDir, user: &str, args: &[&str]) -> serde_json::Value {
    let output = dlms_as(tmp, user)
        .args(["--format", "json"])
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "dlms {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

/// Helper to raise a request and return its full id
pub fn raise_request(tmp: &TempDir, user: &str, item: &str, quantity: u32) -> String {
    let request = json_output(
        tmp,
        user,
        &["request", "raise", item, &quantity.to_string()],
    );
    request["id"].as_str().unwrap().to_string()
}

/// Helper to take a request from raise to receipt
pub fn fulfil_request(tmp: &TempDir, user: &str, item: &str, quantity: u32) -> String {
    let id = raise_request(tmp, user, item, quantity);
    dlms_as(tmp, "store")
        .args(["request", "approve", &id])
        .assert()
        .success();
    dlms_as(tmp, user)
        .args(["request", "receive", &id])
        .assert()
        .success();
    id
}
