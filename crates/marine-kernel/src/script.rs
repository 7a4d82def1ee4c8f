//! Line-oriented executor for `.sql` scripts that use `DELIMITER` directives.
//!
//! Scripts written for the MySQL client switch the statement terminator with
//! `DELIMITER //` so trigger and procedure bodies containing `;` stay whole.
//! The splitter honours that directive in a single pass; it does not look
//! inside string literals or comments.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};

const DEFAULT_DELIMITER: &str = ";";
const STATEMENT_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptStatement {
    pub sql: String,
    /// 1-based line where the statement starts.
    pub line: usize,
    /// Delimiter that terminated the statement.
    pub delimiter: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScriptReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub executed: usize,
    pub skipped: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("SQL file not found at: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read SQL file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("error executing statement at line {line}: {source}\nStatement:\n{statement}")]
    Execute {
        line: usize,
        statement: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("script transaction failed: {0}")]
    Transaction(#[source] rusqlite::Error),
}

/// Split a script into executable statements.
pub fn split_script(script: &str) -> Vec<ScriptStatement> {
    let mut out = Vec::new();
    let mut delimiter = DEFAULT_DELIMITER.to_string();
    let mut pending = String::new();
    let mut start_line = 0usize;

    for (idx, raw_line) in script.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() && pending.is_empty() {
            continue;
        }
        if let Some(next) = delimiter_directive(line) {
            delimiter = next.unwrap_or(DEFAULT_DELIMITER).to_string();
            continue;
        }
        if pending.is_empty() {
            start_line = idx + 1;
        }
        pending.push_str(raw_line);
        pending.push('\n');

        if let Some(body) = pending.trim_end().strip_suffix(delimiter.as_str()) {
            let body = body.trim();
            if !body.is_empty() {
                out.push(ScriptStatement {
                    sql: body.to_string(),
                    line: start_line,
                    delimiter: delimiter.clone(),
                });
            }
            pending.clear();
        }
    }

    let rest = pending.trim();
    if !rest.is_empty() {
        out.push(ScriptStatement {
            sql: rest.to_string(),
            line: start_line,
            delimiter,
        });
    }
    out
}

/// `Some(Some(tok))` for `DELIMITER tok`, `Some(None)` for a bare `DELIMITER`.
fn delimiter_directive(line: &str) -> Option<Option<&str>> {
    let mut parts = line.split_whitespace();
    let head = parts.next()?;
    if !head.eq_ignore_ascii_case("DELIMITER") {
        return None;
    }
    Some(parts.next())
}

/// Statements the SQLite file makes meaningless: database selection and
/// transaction control (the executor owns the transaction).
fn is_skippable(sql: &str) -> bool {
    let words: Vec<String> = strip_leading_comments(sql)
        .split_whitespace()
        .take(3)
        .map(|w| w.to_ascii_uppercase())
        .collect();
    let first = words.first().map(String::as_str).unwrap_or("");
    let second = words.get(1).map(String::as_str).unwrap_or("");
    match first {
        "USE" => words.len() == 2,
        "CREATE" | "DROP" => matches!(second, "DATABASE" | "SCHEMA"),
        "BEGIN" | "START" | "COMMIT" | "ROLLBACK" | "END" => {
            words.len() == 1 || matches!(second, "TRANSACTION" | "WORK")
        }
        _ => false,
    }
}

/// Drop `--`/`#` comment lines and `/* */` blocks that precede the first token.
fn strip_leading_comments(sql: &str) -> &str {
    let mut rest = sql.trim_start();
    loop {
        if rest.starts_with("--") || rest.starts_with('#') {
            rest = match rest.find('\n') {
                Some(end) => rest[end + 1..].trim_start(),
                None => "",
            };
        } else if let Some(body) = rest.strip_prefix("/*") {
            rest = match body.find("*/") {
                Some(end) => body[end + 2..].trim_start(),
                None => "",
            };
        } else {
            return rest;
        }
    }
}

fn preview(sql: &str) -> String {
    sql.chars().take(STATEMENT_PREVIEW_CHARS).collect()
}

/// Execute every statement of `script` inside one transaction. The first
/// failure rolls the whole script back.
pub fn execute_script(conn: &mut Connection, script: &str) -> Result<ScriptReport, ScriptError> {
    let statements = split_script(script);
    let tx = conn.transaction().map_err(ScriptError::Transaction)?;
    let mut report = ScriptReport::default();
    let mut failure = None;

    for stmt in &statements {
        if is_skippable(&stmt.sql) {
            debug!(line = stmt.line, sql = %stmt.sql, "skipping script statement");
            report.skipped += 1;
            continue;
        }
        debug!(line = stmt.line, delimiter = %stmt.delimiter, "executing script statement");
        if let Err(source) = tx.execute_batch(&stmt.sql) {
            failure = Some((stmt, source));
            break;
        }
        report.executed += 1;
    }

    if let Some((stmt, source)) = failure {
        warn!(line = stmt.line, error = %source, "script statement failed; rolling back");
        if let Err(err) = tx.rollback() {
            warn!(error = %err, "rollback after script failure failed");
        }
        return Err(ScriptError::Execute {
            line: stmt.line,
            statement: preview(&stmt.sql),
            source,
        });
    }

    tx.commit().map_err(ScriptError::Transaction)?;
    Ok(report)
}

pub fn execute_script_file(conn: &mut Connection, path: &Path) -> Result<ScriptReport, ScriptError> {
    if !path.exists() {
        return Err(ScriptError::NotFound(path.to_path_buf()));
    }
    let script = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut report = execute_script(conn, &script)?;
    report.path = Some(path.to_path_buf());
    info!(
        path = %path.display(),
        executed = report.executed,
        skipped = report.skipped,
        "SQL file executed successfully"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sqls(script: &str) -> Vec<String> {
        split_script(script).into_iter().map(|s| s.sql).collect()
    }

    #[test]
    fn splits_on_semicolons_and_skips_blank_lines() {
        let script = "\n\nCREATE TABLE a (x INT);\n\nINSERT INTO a VALUES (1);\n";
        assert_eq!(
            sqls(script),
            vec!["CREATE TABLE a (x INT)", "INSERT INTO a VALUES (1)"]
        );
    }

    #[test]
    fn multi_line_statement_keeps_inner_newlines() {
        let script = "SELECT 1,\n  2\nFROM t;\n";
        let out = split_script(script);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].sql, "SELECT 1,\n  2\nFROM t");
        assert_eq!(out[0].line, 1);
    }

    #[test]
    fn delimiter_block_keeps_trigger_body_whole() {
        let script = "\
CREATE TABLE t (x INT);
DELIMITER //
CREATE TRIGGER trg BEFORE INSERT ON t
BEGIN
  SELECT 1;
  SELECT 2;
END//
DELIMITER ;
INSERT INTO t VALUES (1);
";
        let out = split_script(script);
        assert_eq!(out.len(), 3);
        assert!(out[1].sql.starts_with("CREATE TRIGGER trg"));
        assert!(out[1].sql.ends_with("END"));
        assert!(out[1].sql.contains("SELECT 1;\n  SELECT 2;"));
        assert_eq!(out[1].delimiter, "//");
        assert_eq!(out[1].line, 3);
        assert_eq!(out[2].delimiter, ";");
        assert_eq!(out[2].line, 9);
    }

    #[test]
    fn bare_delimiter_resets_to_semicolon_and_is_case_insensitive() {
        let script = "delimiter $$\nSELECT 1$$\nDELIMITER\nSELECT 2;\n";
        let out = split_script(script);
        assert_eq!(sqls(script), vec!["SELECT 1", "SELECT 2"]);
        assert_eq!(out[0].delimiter, "$$");
        assert_eq!(out[1].delimiter, ";");
    }

    #[test]
    fn delimiter_must_be_a_whole_word() {
        let out = sqls("DELIMITERS are not directives;\n");
        assert_eq!(out, vec!["DELIMITERS are not directives"]);
    }

    #[test]
    fn trailing_statement_without_delimiter_is_emitted() {
        assert_eq!(sqls("SELECT 1;\nSELECT 2"), vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn empty_statements_are_dropped() {
        assert_eq!(sqls(";\n  ;\nSELECT 1;\n"), vec!["SELECT 1"]);
    }

    #[test]
    fn skippable_statements() {
        assert!(is_skippable("USE marine_db"));
        assert!(is_skippable("create database if not exists marine_db"));
        assert!(is_skippable("DROP SCHEMA marine_db"));
        assert!(is_skippable("START TRANSACTION"));
        assert!(is_skippable("COMMIT"));
        assert!(!is_skippable("USE_COUNT"));
        assert!(!is_skippable("CREATE TABLE t (x INT)"));
        assert!(!is_skippable("BEGIN\n  SELECT 1;\nEND"));
    }

    #[test]
    fn leading_comments_do_not_hide_skippable_statements() {
        assert!(is_skippable("-- header\n-- more\nCREATE DATABASE marine_db"));
        assert!(is_skippable("# mysql comment\nUSE marine_db"));
        assert!(is_skippable("/* block\n comment */ USE marine_db"));
        assert!(!is_skippable("-- only a comment"));
        assert!(!is_skippable("-- note\nCREATE TABLE t (x INT)"));
    }

    #[test]
    fn commented_database_selection_is_skipped() {
        let mut conn = Connection::open_in_memory().unwrap();
        let report = execute_script(
            &mut conn,
            "-- setup\nCREATE DATABASE IF NOT EXISTS marine_db;\n# switch\nUSE marine_db;\nCREATE TABLE t (x INT);\n",
        )
        .unwrap();
        assert_eq!(report.skipped, 2);
        assert_eq!(report.executed, 1);
    }

    #[test]
    fn bundled_schema_loads_and_skips_database_selection() {
        let mut conn = Connection::open_in_memory().unwrap();
        let report = execute_script(&mut conn, crate::BUNDLED_SCHEMA).unwrap();
        assert_eq!(report.skipped, 2);
        let species: i64 = conn
            .query_row("SELECT COUNT(*) FROM Species", [], |r| r.get(0))
            .unwrap();
        assert_eq!(species, 5);
    }

    #[test]
    fn execute_commits_all_statements() {
        let mut conn = Connection::open_in_memory().unwrap();
        let report = execute_script(
            &mut conn,
            "CREATE DATABASE marine_db;\nUSE marine_db;\nCREATE TABLE t (x INT);\nINSERT INTO t VALUES (1);\nINSERT INTO t VALUES (2);\n",
        )
        .unwrap();
        assert_eq!(report.executed, 3);
        assert_eq!(report.skipped, 2);
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn execute_rolls_back_on_first_failure() {
        let mut conn = Connection::open_in_memory().unwrap();
        let err = execute_script(
            &mut conn,
            "CREATE TABLE t (x INT);\nINSERT INTO t VALUES (1);\nINSERT INTO missing VALUES (2);\nINSERT INTO t VALUES (3);\n",
        )
        .unwrap_err();
        match err {
            ScriptError::Execute {
                line, statement, ..
            } => {
                assert_eq!(line, 3);
                assert_eq!(statement, "INSERT INTO missing VALUES (2)");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let exists: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='t'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(exists, 0, "earlier statements must be rolled back");
    }

    #[test]
    fn failing_statement_preview_is_truncated() {
        let mut conn = Connection::open_in_memory().unwrap();
        let long = format!("SELEC {};", "x".repeat(900));
        let err = execute_script(&mut conn, &long).unwrap_err();
        match err {
            ScriptError::Execute { statement, .. } => {
                assert_eq!(statement.chars().count(), STATEMENT_PREVIEW_CHARS)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn trigger_in_delimiter_block_executes() {
        let mut conn = Connection::open_in_memory().unwrap();
        execute_script(
            &mut conn,
            "CREATE TABLE t (x INT);\nDELIMITER //\nCREATE TRIGGER trg_t BEFORE INSERT ON t\nFOR EACH ROW WHEN NEW.x < 0\nBEGIN\n  SELECT RAISE(ABORT, 'negative');\nEND//\nDELIMITER ;\n",
        )
        .unwrap();
        let err = conn.execute("INSERT INTO t VALUES (-1)", []).unwrap_err();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn missing_file_is_reported() {
        let mut conn = Connection::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.sql");
        let err = execute_script_file(&mut conn, &path).unwrap_err();
        assert!(matches!(err, ScriptError::NotFound(p) if p == path));
    }

    #[test]
    fn non_utf8_file_is_a_read_error() {
        let mut conn = Connection::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.sql");
        std::fs::write(&path, b"CREATE TABLE t (x INT);\n-- caf\xff\n").unwrap();
        let err = execute_script_file(&mut conn, &path).unwrap_err();
        assert!(matches!(err, ScriptError::Read { path: p, .. } if p == path));
    }

    #[test]
    fn file_report_carries_path() {
        let mut conn = Connection::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.sql");
        std::fs::write(&path, "CREATE TABLE t (x INT);\n").unwrap();
        let report = execute_script_file(&mut conn, &path).unwrap();
        assert_eq!(report.path.as_deref(), Some(path.as_path()));
        assert_eq!(report.executed, 1);
    }

    proptest! {
        #[test]
        fn statements_survive_either_delimiter(
            bodies in proptest::collection::vec("[A-Za-z0-9_ ,()]{1,40}", 1..8),
            use_block in any::<bool>(),
        ) {
            let bodies: Vec<String> = bodies
                .into_iter()
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty() && !b.to_ascii_uppercase().starts_with("DELIMITER"))
                .collect();
            let delim = if use_block { "//" } else { ";" };
            let mut script = String::new();
            if use_block {
                script.push_str("DELIMITER //\n");
            }
            for body in &bodies {
                script.push_str(body);
                script.push_str(delim);
                script.push('\n');
            }
            prop_assert_eq!(sqls(&script), bodies);
        }
    }
}
