// ABOUTME: End-to-end CLI tests driving the table-sync binary
// ABOUTME: Exercises config loading, exec, and ping through a temp config file

use std::fs;
use std::path::Path;
use std::process::Command;

const BIN: &str = env!("CARGO_BIN_EXE_table-sync");

fn setup_users(path: &Path, rows: &[(i64, &str, i64)]) {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.execute(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            age INT NOT NULL
        )",
        [],
    )
    .unwrap();

    for (id, name, age) in rows {
        conn.execute(
            "INSERT INTO users (id, name, age) VALUES (?1, ?2, ?3)",
            rusqlite::params![id, name, age],
        )
        .unwrap();
    }
}

#[test]
fn test_exec_and_ping_commands() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("source.db");
    let target_path = dir.path().join("target.db");

    setup_users(&source_path, &[(1, "Alice", 30), (2, "Bob", 25)]);
    setup_users(&target_path, &[]);

    let config_path = dir.path().join("sync-config.toml");
    fs::write(
        &config_path,
        format!(
            r#"
            [[jobs]]
            name = "users"
            columns = ["id", "name", "age"]
            primary_key = "id"

            [jobs.source]
            driver = "sqlite"
            dsn = "{}"
            table = "users"

            [[jobs.targets]]
            driver = "sqlite"
            dsn = "{}"
            table = "users"
            "#,
            source_path.display(),
            target_path.display()
        ),
    )
    .unwrap();

    // First exec converges the empty target
    let output = Command::new(BIN)
        .arg("--config")
        .arg(&config_path)
        .arg("exec")
        .output()
        .expect("Failed to execute command");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {}", stdout);
    assert!(stdout.contains("users:"));
    assert!(stdout.contains("source checksum:"));
    assert!(stdout.contains("1 ok, 1 changed"));

    // A second exec is a no-op
    let output = Command::new(BIN)
        .arg("--config")
        .arg(&config_path)
        .arg("exec")
        .arg("users")
        .output()
        .expect("Failed to execute command");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {}", stdout);
    assert!(stdout.contains("1 ok, 0 changed"));

    // Both tables exist, so ping reports all ok
    let output = Command::new(BIN)
        .arg("--config")
        .arg(&config_path)
        .arg("ping")
        .output()
        .expect("Failed to execute command");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {}", stdout);
    assert!(stdout.contains("all ok"));

    // An unknown job name exits nonzero
    let output = Command::new(BIN)
        .arg("--config")
        .arg(&config_path)
        .arg("exec")
        .arg("nope")
        .output()
        .expect("Failed to execute command");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!output.status.success());
    assert!(stdout.contains("job 'nope' not found in config"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("sync-config.toml");
    fs::write(&config_path, "jobs = 3").unwrap();

    let output = Command::new(BIN)
        .arg("--config")
        .arg(&config_path)
        .arg("exec")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load config"));
}
