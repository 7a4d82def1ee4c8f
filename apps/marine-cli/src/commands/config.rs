use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Print the JSON schema for marine.toml
    Schema,
    /// Validate a config file against the schema
    Check {
        /// Path to the TOML file
        path: PathBuf,
    },
}

pub fn run(cmd: ConfigCmd) -> Result<()> {
    match cmd {
        ConfigCmd::Schema => super::print_json(&marine_core::config_schema_json(), true),
        ConfigCmd::Check { path } => {
            marine_core::load_config(&path.to_string_lossy())
                .with_context(|| format!("{} is not a valid config", path.display()))?;
            println!("{}: ok", path.display());
            Ok(())
        }
    }
}
