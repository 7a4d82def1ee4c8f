use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use tracing::info;

pub mod config;

pub use config::{config_schema_json, load_config, parse_config, Config};

pub const DEFAULT_CONFIG_REL: &str = "configs/marine.toml";
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8095;
pub const DEFAULT_MAX_CONCURRENCY: usize = 256;
pub const DEFAULT_DB_FILE: &str = "marine.sqlite";

/// Effective runtime settings: config file values overlaid by environment.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub config_source: Option<PathBuf>,
    pub state_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub bind: String,
    pub port: u16,
    pub max_concurrency: usize,
    pub db_path: PathBuf,
    pub sql_candidates: Vec<PathBuf>,
    pub auto_init: bool,
    pub log_filter: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid MARINE_PORT: {0}")]
    InvalidPort(String),
    #[error("invalid MARINE_HTTP_MAX_CONC: {0}")]
    InvalidConcurrency(String),
    #[error("invalid config {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },
}

pub fn env_truthy(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve a config file path independent of the current working directory.
///
/// Search order (first existing wins):
/// - `MARINE_CONFIG_DIR` environment variable if set (joined with `rel`)
/// - Directory of the current executable, then its parent
/// - Workspace root during development
/// - Current working directory
///
/// If `rel` is absolute, it is returned if it exists.
pub fn resolve_config_path(rel: &str) -> Option<PathBuf> {
    let rel_path = Path::new(rel);
    if rel_path.is_absolute() {
        return rel_path.exists().then(|| rel_path.to_path_buf());
    }

    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(cfg_dir) = env_nonempty("MARINE_CONFIG_DIR") {
        candidates.push(PathBuf::from(cfg_dir));
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.push(exe_dir.to_path_buf());
            if let Some(parent) = exe_dir.parent() {
                candidates.push(parent.to_path_buf());
            }
        }
    }
    candidates.push(Path::new(env!("CARGO_MANIFEST_DIR")).join("../../"));
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd);
    }

    candidates
        .into_iter()
        .map(|base| base.join(rel))
        .find(|p| p.exists())
}

fn default_state_dir() -> PathBuf {
    directories::ProjectDirs::from("org", "marine", "marine-desk")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("state"))
}

/// Locate and parse the config file: `MARINE_CONFIG` when set (must exist),
/// otherwise `configs/marine.toml` if one can be found.
pub fn discover_config() -> anyhow::Result<Option<(PathBuf, Config)>> {
    let path = match env_nonempty("MARINE_CONFIG") {
        Some(explicit) => {
            let p = PathBuf::from(explicit);
            if !p.exists() {
                anyhow::bail!("MARINE_CONFIG points to missing file {}", p.display());
            }
            p
        }
        None => match resolve_config_path(DEFAULT_CONFIG_REL) {
            Some(p) => p,
            None => return Ok(None),
        },
    };
    let cfg = load_config(&path.to_string_lossy()).map_err(|err| SettingsError::InvalidConfig {
        path: path.clone(),
        reason: err.to_string(),
    })?;
    info!(path = %path.display(), "loaded config");
    Ok(Some((path, cfg)))
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let discovered = discover_config().context("loading configuration")?;
    Ok(settings_from(discovered)?)
}

fn anchor(base: Option<&Path>, raw: &str) -> PathBuf {
    let p = PathBuf::from(raw);
    match base {
        Some(dir) if p.is_relative() => dir.join(p),
        _ => p,
    }
}

/// Overlay environment variables on an optional parsed config.
pub fn settings_from(discovered: Option<(PathBuf, Config)>) -> Result<Settings, SettingsError> {
    let (config_source, cfg) = match discovered {
        Some((path, cfg)) => (Some(path), cfg),
        None => (None, Config::default()),
    };
    let config_dir = config_source
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf);

    let state_dir = env_nonempty("MARINE_STATE_DIR")
        .map(PathBuf::from)
        .or_else(|| {
            cfg.runtime
                .state_dir
                .as_deref()
                .map(|raw| anchor(config_dir.as_deref(), raw))
        })
        .unwrap_or_else(default_state_dir);
    let logs_dir = env_nonempty("MARINE_LOGS_DIR")
        .map(PathBuf::from)
        .or_else(|| {
            cfg.runtime
                .logs_dir
                .as_deref()
                .map(|raw| anchor(config_dir.as_deref(), raw))
        })
        .unwrap_or_else(|| state_dir.join("logs"));

    let bind = env_nonempty("MARINE_BIND")
        .or(cfg.http.bind.clone())
        .unwrap_or_else(|| DEFAULT_BIND.to_string());
    let port = match env_nonempty("MARINE_PORT") {
        Some(raw) => raw.parse().map_err(|_| SettingsError::InvalidPort(raw))?,
        None => cfg.http.port.unwrap_or(DEFAULT_PORT),
    };
    let max_concurrency = match env_nonempty("MARINE_HTTP_MAX_CONC") {
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => return Err(SettingsError::InvalidConcurrency(raw)),
        },
        None => cfg
            .http
            .max_concurrency
            .unwrap_or(DEFAULT_MAX_CONCURRENCY)
            .max(1),
    };

    let db_path = env_nonempty("MARINE_DB_PATH")
        .or(cfg.database.path.clone())
        .map(|raw| anchor(Some(&state_dir), &raw))
        .unwrap_or_else(|| state_dir.join(DEFAULT_DB_FILE));

    let mut sql_candidates = Vec::new();
    if let Some(raw) = env_nonempty("MARINE_SQL_PATH") {
        sql_candidates.push(PathBuf::from(raw));
    }
    if let Some(raw) = cfg.database.sql_path.as_deref() {
        sql_candidates.push(anchor(config_dir.as_deref(), raw));
    }
    for raw in &cfg.database.fallback_sql_paths {
        sql_candidates.push(anchor(config_dir.as_deref(), raw));
    }
    sql_candidates.dedup();

    let auto_init = env_truthy("MARINE_AUTO_INIT")
        .or(cfg.database.auto_init)
        .unwrap_or(true);
    let log_filter = cfg
        .logging
        .filter
        .clone()
        .unwrap_or_else(|| "info".to_string());

    Ok(Settings {
        config_source,
        state_dir,
        logs_dir,
        bind,
        port,
        max_concurrency,
        db_path,
        sql_candidates,
        auto_init,
        log_filter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 10] = [
        "MARINE_CONFIG",
        "MARINE_STATE_DIR",
        "MARINE_LOGS_DIR",
        "MARINE_BIND",
        "MARINE_PORT",
        "MARINE_HTTP_MAX_CONC",
        "MARINE_DB_PATH",
        "MARINE_SQL_PATH",
        "MARINE_AUTO_INIT",
        "MARINE_CONFIG_DIR",
    ];

    fn clear_env() {
        for key in VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_without_config() {
        clear_env();
        std::env::set_var("MARINE_STATE_DIR", "/tmp/marine-state");
        let s = settings_from(None).unwrap();
        assert_eq!(s.bind, DEFAULT_BIND);
        assert_eq!(s.port, DEFAULT_PORT);
        assert_eq!(s.db_path, PathBuf::from("/tmp/marine-state").join(DEFAULT_DB_FILE));
        assert_eq!(s.logs_dir, PathBuf::from("/tmp/marine-state/logs"));
        assert!(s.sql_candidates.is_empty());
        assert!(s.auto_init);
        clear_env();
    }

    #[test]
    #[serial]
    fn config_paths_are_anchored_to_config_dir() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marine.toml");
        let cfg = parse_config(
            r#"
            [runtime]
            state_dir = "state"
            [database]
            path = "db/marine.sqlite"
            sql_path = "schema.sql"
            fallback_sql_paths = ["/abs/fallback.sql"]
            "#,
        )
        .unwrap();
        let s = settings_from(Some((path, cfg))).unwrap();
        assert_eq!(s.state_dir, dir.path().join("state"));
        assert_eq!(s.db_path, dir.path().join("state").join("db/marine.sqlite"));
        assert_eq!(
            s.sql_candidates,
            vec![dir.path().join("schema.sql"), PathBuf::from("/abs/fallback.sql")]
        );
    }

    #[test]
    #[serial]
    fn env_overrides_config() {
        clear_env();
        let cfg = parse_config("[http]\nport = 9000\n[database]\nauto_init = true\n").unwrap();
        std::env::set_var("MARINE_STATE_DIR", "/tmp/marine-state");
        std::env::set_var("MARINE_PORT", "9100");
        std::env::set_var("MARINE_SQL_PATH", "/data/custom.sql");
        std::env::set_var("MARINE_AUTO_INIT", "0");
        std::env::set_var("MARINE_DB_PATH", "/data/marine.sqlite");
        let s = settings_from(Some((PathBuf::from("/etc/marine/marine.toml"), cfg))).unwrap();
        assert_eq!(s.port, 9100);
        assert_eq!(s.sql_candidates[0], PathBuf::from("/data/custom.sql"));
        assert!(!s.auto_init);
        assert_eq!(s.db_path, PathBuf::from("/data/marine.sqlite"));
        clear_env();
    }

    #[test]
    #[serial]
    fn invalid_env_numbers_are_errors() {
        clear_env();
        std::env::set_var("MARINE_STATE_DIR", "/tmp/marine-state");
        std::env::set_var("MARINE_PORT", "http");
        assert!(matches!(
            settings_from(None),
            Err(SettingsError::InvalidPort(_))
        ));
        std::env::remove_var("MARINE_PORT");
        std::env::set_var("MARINE_HTTP_MAX_CONC", "0");
        assert!(matches!(
            settings_from(None),
            Err(SettingsError::InvalidConcurrency(_))
        ));
        clear_env();
    }

    #[test]
    #[serial]
    fn explicit_missing_config_fails() {
        clear_env();
        std::env::set_var("MARINE_CONFIG", "/definitely/not/here.toml");
        assert!(discover_config().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn explicit_config_is_validated() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[http]\nport = -1\n").unwrap();
        std::env::set_var("MARINE_CONFIG", &path);
        let err = discover_config().unwrap_err();
        assert!(err.to_string().contains("invalid config"));
        clear_env();
    }
}
