use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

pub mod error;
pub mod labels;
pub mod model;
mod records;
pub mod script;
pub mod whitelist;
mod workflow;

pub use error::{KernelError, Result};
pub use records::{BrowseResult, DASHBOARD_RECENT_LIMIT, DEFAULT_RECENT_LIMIT};
pub use script::{split_script, ScriptError, ScriptReport, ScriptStatement};
pub use whitelist::Table;

/// Schema and seed catalogue shipped with the crate.
pub const BUNDLED_SCHEMA: &str = include_str!("../sql/marine_schema.sql");

#[derive(Clone)]
pub struct Kernel {
    db_path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct DbStatus {
    pub db_path: PathBuf,
    pub initialized: bool,
    pub present: Vec<&'static str>,
    pub missing: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InitOutcome {
    AlreadyPresent,
    Initialized { report: ScriptReport },
}

impl InitOutcome {
    pub fn message(&self, db_path: &Path) -> String {
        match self {
            InitOutcome::AlreadyPresent => {
                format!("Database '{}' exists and is reachable", db_path.display())
            }
            InitOutcome::Initialized { .. } => "SQL file executed successfully".to_string(),
        }
    }
}

impl Kernel {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| KernelError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        debug!(db = %db_path.display(), "opened marine database");
        Ok(Self {
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub(crate) fn conn(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        // Busy timeout (default 5000ms; override with MARINE_SQLITE_BUSY_MS)
        let busy_ms: u64 = std::env::var("MARINE_SQLITE_BUSY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5000);
        conn.busy_timeout(Duration::from_millis(busy_ms))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }

    pub fn status(&self) -> Result<DbStatus> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT COUNT(1) FROM sqlite_master WHERE type='table' AND name=?")?;
        let mut present = Vec::new();
        let mut missing = Vec::new();
        for table in Table::ALL {
            let n: i64 = stmt.query_row([table.as_str()], |row| row.get(0))?;
            if n > 0 {
                present.push(table.as_str());
            } else {
                missing.push(table.as_str());
            }
        }
        Ok(DbStatus {
            db_path: self.db_path.clone(),
            initialized: missing.is_empty(),
            present,
            missing,
        })
    }

    pub fn is_initialized(&self) -> Result<bool> {
        Ok(self.status()?.initialized)
    }

    /// Fails with `NotInitialized` when any domain table is missing.
    pub fn require_initialized(&self) -> Result<()> {
        let status = self.status()?;
        if status.initialized {
            Ok(())
        } else {
            Err(KernelError::NotInitialized {
                missing: status.missing,
            })
        }
    }

    /// Leave an initialized database alone; otherwise run the first existing
    /// candidate script, or the bundled schema when `bundled_fallback` is set.
    pub fn ensure_initialized(
        &self,
        candidates: &[PathBuf],
        bundled_fallback: bool,
    ) -> Result<InitOutcome> {
        if self.is_initialized()? {
            return Ok(InitOutcome::AlreadyPresent);
        }
        let mut conn = self.conn()?;
        let report = match candidates.iter().find(|p| p.exists()) {
            Some(path) => script::execute_script_file(&mut conn, path)?,
            None if bundled_fallback => {
                info!("no SQL file found; loading bundled schema");
                script::execute_script(&mut conn, BUNDLED_SCHEMA)?
            }
            None => {
                return Err(KernelError::ScriptMissing {
                    searched: candidates.to_vec(),
                })
            }
        };
        Ok(InitOutcome::Initialized { report })
    }

    /// Execute an arbitrary script file regardless of current state.
    pub fn run_script_file(&self, path: &Path) -> Result<ScriptReport> {
        let mut conn = self.conn()?;
        Ok(script::execute_script_file(&mut conn, path)?)
    }

    pub fn load_bundled_schema(&self) -> Result<ScriptReport> {
        let mut conn = self.conn()?;
        Ok(script::execute_script(&mut conn, BUNDLED_SCHEMA)?)
    }

    // These helpers offload rusqlite work from async executors.

    pub(crate) async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Kernel) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let k = self.clone();
        tokio::task::spawn_blocking(move || f(&k))
            .await
            .map_err(|e| KernelError::Join(e.to_string()))?
    }

    pub async fn status_async(&self) -> Result<DbStatus> {
        self.blocking(|k| k.status()).await
    }

    pub async fn ensure_initialized_async(
        &self,
        candidates: Vec<PathBuf>,
        bundled_fallback: bool,
    ) -> Result<InitOutcome> {
        self.blocking(move |k| k.ensure_initialized(&candidates, bundled_fallback))
            .await
    }

    pub async fn dashboard_async(&self) -> Result<model::Dashboard> {
        self.blocking(|k| k.dashboard()).await
    }

    pub async fn list_species_async(&self) -> Result<Vec<model::Species>> {
        self.blocking(|k| k.list_species()).await
    }

    pub async fn list_locations_async(&self) -> Result<Vec<model::Location>> {
        self.blocking(|k| k.list_locations()).await
    }

    pub async fn list_observers_async(&self) -> Result<Vec<model::Observer>> {
        self.blocking(|k| k.list_observers()).await
    }

    pub async fn add_species_async(&self, new: model::NewSpecies) -> Result<i64> {
        self.blocking(move |k| k.add_species(&new)).await
    }

    pub async fn add_observer_async(&self, new: model::NewObserver) -> Result<i64> {
        self.blocking(move |k| k.add_observer(&new)).await
    }

    pub async fn add_location_async(&self, new: model::NewLocation) -> Result<i64> {
        self.blocking(move |k| k.add_location(&new)).await
    }

    pub async fn add_conservation_action_async(
        &self,
        new: model::NewConservationAction,
    ) -> Result<i64> {
        self.blocking(move |k| k.add_conservation_action(&new)).await
    }

    pub async fn search_species_async(&self, term: String) -> Result<Vec<model::SpeciesMatch>> {
        self.blocking(move |k| k.search_species(&term)).await
    }

    pub async fn actions_for_species_async(
        &self,
        species_id: i64,
    ) -> Result<Vec<model::ConservationAction>> {
        self.blocking(move |k| k.actions_for_species(species_id))
            .await
    }

    pub async fn recent_observations_async(
        &self,
        limit: i64,
    ) -> Result<Vec<model::RecentObservation>> {
        self.blocking(move |k| k.recent_observations(limit)).await
    }

    pub async fn list_conservation_actions_async(&self) -> Result<Vec<model::ActionOverview>> {
        self.blocking(|k| k.list_conservation_actions()).await
    }

    pub async fn browse_table_async(
        &self,
        table: Table,
        columns: Vec<String>,
        limit: i64,
    ) -> Result<BrowseResult> {
        self.blocking(move |k| k.browse_table(table, &columns, limit))
            .await
    }

    pub async fn form_options_async(&self) -> Result<model::FormOptions> {
        self.blocking(|k| k.form_options()).await
    }

    pub async fn log_observation_async(
        &self,
        form: model::ObservationForm,
    ) -> Result<model::LoggedObservation> {
        self.blocking(move |k| k.log_observation(&form)).await
    }
}
