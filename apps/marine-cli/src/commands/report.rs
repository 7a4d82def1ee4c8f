use anyhow::Result;
use clap::{Args, Subcommand};
use marine_core::Settings;
use marine_kernel::DEFAULT_RECENT_LIMIT;

use super::DbArgs;

#[derive(Subcommand)]
pub enum ReportCmd {
    /// Dashboard totals, status breakdown and pollution by region
    Stats(StatsArgs),
    /// Most recent observations
    Recent(RecentArgs),
    /// Species whose common or scientific name contains a term
    Search(SearchArgs),
}

#[derive(Args)]
pub struct StatsArgs {
    #[command(flatten)]
    pub db: DbArgs,
    /// Emit JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct RecentArgs {
    #[command(flatten)]
    pub db: DbArgs,
    #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
    pub limit: i64,
}

#[derive(Args)]
pub struct SearchArgs {
    pub term: String,
    #[command(flatten)]
    pub db: DbArgs,
}

pub fn run(cmd: ReportCmd, settings: &Settings) -> Result<()> {
    match cmd {
        ReportCmd::Stats(args) => {
            let kernel = args.db.open(settings)?;
            kernel.require_initialized()?;
            let dash = kernel.dashboard()?;
            if args.json {
                return super::print_json(&dash, true);
            }
            let t = &dash.totals;
            println!("species       {}", t.species);
            println!("locations     {}", t.locations);
            println!("observations  {}", t.observations);
            println!("actions       {}", t.actions);
            println!();
            println!("species by conservation status:");
            for row in &dash.species_by_status {
                println!(
                    "  {:<24} {}",
                    row.conservation_status.as_deref().unwrap_or("Unknown"),
                    row.count
                );
            }
            println!("average pollution index by region:");
            for row in &dash.pollution_by_region {
                let avg = row
                    .avg_pollution
                    .map(|v| format!("{v:.2}"))
                    .unwrap_or_else(|| "-".into());
                println!(
                    "  {:<24} {avg}",
                    row.region.as_deref().unwrap_or("Unknown")
                );
            }
            Ok(())
        }
        ReportCmd::Recent(args) => {
            let kernel = args.db.open(settings)?;
            kernel.require_initialized()?;
            for obs in kernel.recent_observations(args.limit)? {
                println!(
                    "{:>5}  {}  {:<22} {:<18} x{}  {}",
                    obs.obs_id,
                    obs.obs_date.format("%Y-%m-%d %H:%M"),
                    obs.common_name.as_deref().unwrap_or("-"),
                    obs.location_name.as_deref().unwrap_or("-"),
                    obs.count_observed,
                    obs.remarks.as_deref().unwrap_or("")
                );
            }
            Ok(())
        }
        ReportCmd::Search(args) => {
            let kernel = args.db.open(settings)?;
            kernel.require_initialized()?;
            let hits = kernel.search_species(&args.term)?;
            if hits.is_empty() {
                println!("No species matched '{}'", args.term.trim());
            }
            for hit in hits {
                let s = &hit.species;
                println!(
                    "{} ({}) [{}] observations: {}",
                    s.common_name,
                    s.scientific_name.as_deref().unwrap_or(""),
                    s.conservation_status.as_deref().unwrap_or("Unknown"),
                    hit.total_observations
                );
                for action in kernel.actions_for_species(s.species_id)? {
                    let start = action
                        .start_date
                        .map(|d| d.to_string())
                        .unwrap_or_default();
                    let end = action
                        .end_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "ongoing".into());
                    println!("  - {} ({start} .. {end})", action.action_type);
                }
            }
            Ok(())
        }
    }
}
