//! Integration tests for the LockGuardium CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.  The
//! master password comes from `LOCKGUARDIUM_PASSWORD` so no prompt is
//! needed, and every test writes a `lockguardium.toml` with the cheapest
//! Argon2 settings.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const PASSWORD: &str = "cli-test-password";

/// Helper: get a Command pointing at the lockguardium binary.
fn lockguardium() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("lockguardium").expect("binary should exist");
    cmd.env_remove("LOCKGUARDIUM_DIR")
        .env_remove("LOCKGUARDIUM_PASSWORD")
        .env_remove("LOCKGUARDIUM_NEW_PASSWORD");
    cmd
}

/// Helper: a data dir with fast KDF settings.
fn data_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tmp.child("lockguardium.toml")
        .write_str("argon2_memory_kib = 8192\nargon2_iterations = 1\nargon2_parallelism = 1\n")
        .unwrap();
    tmp
}

/// Helper: a command against `dir` with the password set.
fn vault_cmd(dir: &TempDir) -> Command {
    let mut cmd = lockguardium();
    cmd.arg("--data-dir")
        .arg(dir.path())
        .env("LOCKGUARDIUM_PASSWORD", PASSWORD);
    cmd
}

fn init(dir: &TempDir) {
    vault_cmd(dir).arg("init").assert().success();
}

fn add(dir: &TempDir, service: &str, password: &str) {
    vault_cmd(dir)
        .args(["add", "--service", service, "--username", "user", "--password", password])
        .assert()
        .success();
}

// ---------------------------------------------------------------------------
// Help and version
// ---------------------------------------------------------------------------

#[test]
fn help_flag_shows_usage() {
    lockguardium()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Local encrypted credential vault"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("change-password"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("shell"))
        .stdout(predicate::str::contains("generate"));
}

#[test]
fn version_flag_shows_version() {
    lockguardium()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lockguardium"));
}

#[test]
fn version_command_shows_format() {
    lockguardium()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vault format"));
}

#[test]
fn no_args_shows_help() {
    lockguardium()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

// ---------------------------------------------------------------------------
// Vault lifecycle
// ---------------------------------------------------------------------------

#[test]
fn list_on_missing_vault_fails() {
    let dir = data_dir();
    vault_cmd(&dir)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Vault not found"));
}

#[test]
fn init_creates_files_and_refuses_twice() {
    let dir = data_dir();
    init(&dir);

    dir.child("vault.lgv").assert(predicate::path::exists());
    dir.child("salt.bin").assert(predicate::path::exists());

    vault_cmd(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_rejects_short_password() {
    let dir = data_dir();
    lockguardium()
        .arg("--data-dir")
        .arg(dir.path())
        .env("LOCKGUARDIUM_PASSWORD", "short")
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8 characters"));
    dir.child("vault.lgv").assert(predicate::path::missing());
}

#[test]
fn add_list_show_update_delete() {
    let dir = data_dir();
    init(&dir);
    add(&dir, "GitHub", "gh-secret-1");
    add(&dir, "Bank", "bank-secret");

    vault_cmd(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("GitHub"))
        .stdout(predicate::str::contains("Bank"))
        .stdout(predicate::str::contains("gh-secret-1").not());

    vault_cmd(&dir)
        .args(["list", "--search", "git"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GitHub"))
        .stdout(predicate::str::contains("Bank").not());

    vault_cmd(&dir)
        .args(["show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gh-secret-1"));

    vault_cmd(&dir)
        .args(["update", "1", "--password", "gh-secret-2"])
        .assert()
        .success();

    vault_cmd(&dir)
        .args(["show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gh-secret-2"))
        .stdout(predicate::str::contains("user"));

    vault_cmd(&dir)
        .args(["delete", "1", "--force"])
        .assert()
        .success();

    vault_cmd(&dir)
        .args(["show", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn list_rejects_unknown_sort() {
    let dir = data_dir();
    init(&dir);
    vault_cmd(&dir)
        .args(["list", "--sort", "size"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown sort"));
}

#[test]
fn update_without_fields_fails() {
    let dir = data_dir();
    init(&dir);
    add(&dir, "GitHub", "pw");
    vault_cmd(&dir)
        .args(["update", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to update"));
}

#[test]
fn wrong_password_is_rejected() {
    let dir = data_dir();
    init(&dir);

    lockguardium()
        .arg("--data-dir")
        .arg(dir.path())
        .env("LOCKGUARDIUM_PASSWORD", "definitely-wrong")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to unlock"));
}

#[test]
fn change_password_via_env() {
    let dir = data_dir();
    init(&dir);
    add(&dir, "GitHub", "gh");

    vault_cmd(&dir)
        .env("LOCKGUARDIUM_NEW_PASSWORD", "second-password")
        .arg("change-password")
        .assert()
        .success();

    vault_cmd(&dir).arg("list").assert().failure();

    lockguardium()
        .arg("--data-dir")
        .arg(dir.path())
        .env("LOCKGUARDIUM_PASSWORD", "second-password")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("GitHub"));
}

#[test]
fn export_and_import_with_force() {
    let dir = data_dir();
    init(&dir);
    add(&dir, "Exported", "exp");

    let backup = TempDir::new().unwrap();
    let backup_dir = backup.child("backup");
    vault_cmd(&dir)
        .arg("export")
        .arg(backup_dir.path())
        .assert()
        .success();
    backup_dir.child("vault.lgv").assert(predicate::path::exists());

    // A second installation receives the export.
    let target = data_dir();
    init(&target);
    vault_cmd(&target)
        .arg("import")
        .arg(backup_dir.path())
        .arg("--force")
        .assert()
        .success();

    vault_cmd(&target)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported"));
}

#[test]
fn audit_shows_operations() {
    let dir = data_dir();
    init(&dir);
    add(&dir, "Audited", "pw");

    vault_cmd(&dir)
        .arg("audit")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("pw").not());
}

// ---------------------------------------------------------------------------
// Stateless utilities
// ---------------------------------------------------------------------------

#[test]
fn generate_prints_password_of_requested_length() {
    let output = lockguardium()
        .args(["generate", "--length", "24", "--no-symbols"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let password = stdout.lines().next().unwrap();
    assert_eq!(password.len(), 24);
    assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn generate_rejects_all_classes_disabled() {
    lockguardium()
        .args([
            "generate",
            "--no-uppercase",
            "--no-lowercase",
            "--no-digits",
            "--no-symbols",
        ])
        .assert()
        .failure();
}

#[test]
fn strength_rates_password() {
    lockguardium()
        .args(["strength", "abc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Weak"));

    lockguardium()
        .args(["strength", "Abcdefgh1234!@#$"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Strong"));
}

#[test]
fn completions_for_bash() {
    lockguardium()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lockguardium"));
}
