use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{ConfigCmd, DbCmd, PathsArgs, ReportCmd, ScriptCmd};

#[derive(Parser)]
#[command(name = "marine-cli", version, about = "Marine conservation desk CLI")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print effective settings (paths, bind, database) as JSON
    Paths(PathsArgs),
    /// Inspect or validate marine.toml
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },
    /// Database status and initialisation
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },
    /// Split or execute SQL scripts
    Script {
        #[command(subcommand)]
        cmd: ScriptCmd,
    },
    /// Read-only reports over the observation data
    Report {
        #[command(subcommand)]
        cmd: ReportCmd,
    },
}

fn main() {
    let cli = Cli::parse();
    marine_otel::init_cli(cli.verbose);
    if let Err(err) = run(cli.cmd) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cmd: Commands) -> Result<()> {
    let settings = || -> Result<marine_core::Settings> {
        let settings = marine_core::load_settings()?;
        tracing::debug!(db = %settings.db_path.display(), "settings loaded");
        Ok(settings)
    };
    match cmd {
        Commands::Config { cmd } => commands::config::run(cmd),
        Commands::Script {
            cmd: ScriptCmd::Split(args),
        } => commands::script::split(args),
        Commands::Paths(args) => commands::paths::run(args, &settings()?),
        Commands::Db { cmd } => commands::db::run(cmd, &settings()?),
        Commands::Script { cmd } => commands::script::run(cmd, &settings()?),
        Commands::Report { cmd } => commands::report::run(cmd, &settings()?),
    }
}
