pub mod config;
pub mod db;
pub mod paths;
pub mod report;
pub mod script;

pub use config::ConfigCmd;
pub use db::DbCmd;
pub use paths::PathsArgs;
pub use report::ReportCmd;
pub use script::ScriptCmd;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use marine_core::Settings;
use marine_kernel::Kernel;

/// Database selection shared by commands that touch the SQLite file.
#[derive(Args, Clone, Debug)]
pub struct DbArgs {
    /// SQLite file; defaults to the configured database path
    #[arg(long)]
    pub db: Option<PathBuf>,
}

impl DbArgs {
    pub fn open(&self, settings: &Settings) -> Result<Kernel> {
        let path = self.db.clone().unwrap_or_else(|| settings.db_path.clone());
        Kernel::open(&path).with_context(|| format!("opening database {}", path.display()))
    }
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}
