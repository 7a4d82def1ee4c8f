use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use marine_core::Settings;

use super::DbArgs;

#[derive(Subcommand)]
pub enum ScriptCmd {
    /// Show how a script splits into statements without running it
    Split(SplitArgs),
    /// Execute a script in one transaction, regardless of database state
    Run(RunArgs),
}

#[derive(Args)]
pub struct SplitArgs {
    /// Script file
    pub path: PathBuf,
    /// Emit JSON instead of the listing
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct RunArgs {
    /// Script file
    pub path: PathBuf,
    #[command(flatten)]
    pub db: DbArgs,
}

pub fn run(cmd: ScriptCmd, settings: &Settings) -> Result<()> {
    match cmd {
        ScriptCmd::Split(args) => split(args),
        ScriptCmd::Run(args) => {
            let kernel = args.db.open(settings)?;
            let report = kernel.run_script_file(&args.path)?;
            println!(
                "{}: {} statements executed, {} skipped",
                args.path.display(),
                report.executed,
                report.skipped
            );
            Ok(())
        }
    }
}

pub fn split(args: SplitArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;
    let statements = marine_kernel::split_script(&text);
    if args.json {
        return super::print_json(&statements, true);
    }
    for (idx, stmt) in statements.iter().enumerate() {
        println!(
            "-- [{}] line {} (delimiter {})",
            idx + 1,
            stmt.line,
            stmt.delimiter
        );
        println!("{}", stmt.sql);
    }
    println!("-- {} statements", statements.len());
    Ok(())
}
