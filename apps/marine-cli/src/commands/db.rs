use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use marine_core::Settings;
use marine_kernel::InitOutcome;

use super::DbArgs;

#[derive(Subcommand)]
pub enum DbCmd {
    /// Report which marine tables exist
    Status(StatusArgs),
    /// Create the marine tables from a SQL script unless they already exist
    Init(InitArgs),
}

#[derive(Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub db: DbArgs,
    /// Pretty-print JSON
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args)]
pub struct InitArgs {
    #[command(flatten)]
    pub db: DbArgs,
    /// Script to run; defaults to the configured candidates
    #[arg(long)]
    pub sql: Option<PathBuf>,
    /// Fall back to the bundled schema when no script is found
    #[arg(long)]
    pub bundled: bool,
}

pub fn run(cmd: DbCmd, settings: &Settings) -> Result<()> {
    match cmd {
        DbCmd::Status(args) => {
            let kernel = args.db.open(settings)?;
            super::print_json(&kernel.status()?, args.pretty)
        }
        DbCmd::Init(args) => init(args, settings),
    }
}

fn init(args: InitArgs, settings: &Settings) -> Result<()> {
    let kernel = args.db.open(settings)?;
    let candidates = match args.sql {
        Some(path) => vec![path],
        None => settings.sql_candidates.clone(),
    };
    if candidates.is_empty() && !args.bundled {
        bail!("no SQL file configured; pass --sql <file> or --bundled");
    }
    let outcome = kernel.ensure_initialized(&candidates, args.bundled)?;
    println!("{}", outcome.message(kernel.db_path()));
    if let InitOutcome::Initialized { report } = outcome {
        let source = report
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "bundled schema".into());
        println!(
            "{} statements executed, {} skipped ({source})",
            report.executed, report.skipped
        );
    }
    Ok(())
}
