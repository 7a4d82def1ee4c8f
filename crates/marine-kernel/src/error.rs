use std::path::PathBuf;

use crate::script::ScriptError;

pub type Result<T> = std::result::Result<T, KernelError>;

#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("{0}")]
    Validation(String),
    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: i64 },
    #[error("unknown table: {0}")]
    UnknownTable(String),
    #[error("unknown column {column} for table {table}")]
    UnknownColumn { table: &'static str, column: String },
    #[error("database is not initialized (missing tables: {})", missing.join(", "))]
    NotInitialized { missing: Vec<&'static str> },
    #[error("SQL file not found; searched: {}", display_paths(searched))]
    ScriptMissing { searched: Vec<PathBuf> },
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("cannot create database directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("join error: {0}")]
    Join(String),
}

impl KernelError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        KernelError::Validation(msg.into())
    }

    /// True when the error stems from a table that does not exist yet.
    pub fn is_missing_table(&self) -> bool {
        match self {
            KernelError::NotInitialized { .. } => true,
            KernelError::Sqlite(err) => err.to_string().contains("no such table"),
            _ => false,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
