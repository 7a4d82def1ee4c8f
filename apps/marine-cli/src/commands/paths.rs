use anyhow::Result;
use clap::Args;
use marine_core::Settings;

#[derive(Args)]
pub struct PathsArgs {
    /// Pretty-print JSON
    #[arg(long)]
    pub pretty: bool,
}

pub fn run(args: PathsArgs, settings: &Settings) -> Result<()> {
    super::print_json(settings, args.pretty)
}
