use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn bin(state: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("marine-cli").expect("binary");
    cmd.env("MARINE_STATE_DIR", state)
        .env_remove("MARINE_CONFIG")
        .env_remove("MARINE_DB_PATH")
        .env_remove("MARINE_SQL_PATH");
    cmd
}

fn schema_script() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../crates/marine-kernel/sql/marine_schema.sql")
}

#[test]
fn init_runs_script_once_then_reports_reachable() {
    let tmp = tempdir().expect("tmpdir");
    let db = tmp.path().join("marine.sqlite");

    bin(tmp.path())
        .args(["db", "status", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"initialized\":false"));

    bin(tmp.path())
        .args(["db", "init", "--db"])
        .arg(&db)
        .arg("--sql")
        .arg(schema_script())
        .assert()
        .success()
        .stdout(predicate::str::contains("SQL file executed successfully"))
        .stdout(predicate::str::contains("2 skipped"));

    bin(tmp.path())
        .args(["db", "init", "--db"])
        .arg(&db)
        .arg("--sql")
        .arg(schema_script())
        .assert()
        .success()
        .stdout(predicate::str::contains("exists and is reachable"));
}

#[test]
fn init_with_missing_script_fails_unless_bundled() {
    let tmp = tempdir().expect("tmpdir");
    let db = tmp.path().join("marine.sqlite");
    let missing = tmp.path().join("nope.sql");

    bin(tmp.path())
        .args(["db", "init", "--db"])
        .arg(&db)
        .arg("--sql")
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("SQL file not found"));

    bin(tmp.path())
        .args(["db", "init", "--bundled", "--db"])
        .arg(&db)
        .arg("--sql")
        .arg(&missing)
        .assert()
        .success()
        .stdout(predicate::str::contains("bundled schema"));
}

#[test]
fn broken_script_reports_line_and_rolls_back() {
    let tmp = tempdir().expect("tmpdir");
    let db = tmp.path().join("marine.sqlite");
    let script = tmp.path().join("broken.sql");
    fs::write(
        &script,
        "CREATE TABLE Probe (id INTEGER PRIMARY KEY);\nBOGUS STATEMENT;\n",
    )
    .expect("write script");

    bin(tmp.path())
        .args(["script", "run"])
        .arg(&script)
        .arg("--db")
        .arg(&db)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"))
        .stderr(predicate::str::contains("BOGUS"));

    bin(tmp.path())
        .args(["db", "status", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"present\":[]"));
}

#[test]
fn split_honours_delimiter_blocks() {
    let tmp = tempdir().expect("tmpdir");
    let script = tmp.path().join("trigger.sql");
    fs::write(
        &script,
        "CREATE TABLE t (id INTEGER);\n\
         DELIMITER $$\n\
         CREATE TRIGGER tr AFTER INSERT ON t BEGIN SELECT 1; END$$\n\
         DELIMITER ;\n\
         INSERT INTO t VALUES (1);\n",
    )
    .expect("write script");

    bin(tmp.path())
        .args(["script", "split"])
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("line 3 (delimiter $$)"))
        .stdout(predicate::str::contains("BEGIN SELECT 1; END"))
        .stdout(predicate::str::contains("-- 3 statements"));
}

#[test]
fn split_does_not_need_a_valid_config() {
    let tmp = tempdir().expect("tmpdir");
    let script = tmp.path().join("one.sql");
    fs::write(&script, "SELECT 1;\n").expect("write script");

    let mut cmd = assert_cmd::Command::cargo_bin("marine-cli").expect("binary");
    cmd.env("MARINE_CONFIG", tmp.path().join("absent.toml"))
        .args(["script", "split"])
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("-- 1 statements"));

    bin(tmp.path())
        .env("MARINE_CONFIG", tmp.path().join("absent.toml"))
        .args(["db", "status", "--db"])
        .arg(tmp.path().join("marine.sqlite"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("MARINE_CONFIG"));
}
