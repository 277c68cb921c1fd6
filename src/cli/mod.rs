//! Command-line parsing for the demand-trends pipeline.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the data/analysis code.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::data::cases::DEFAULT_CASES_BASE_URL;
use crate::data::trends::DEFAULT_TRENDS_BASE_URL;
use crate::domain::Region;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "dtr",
    version,
    about = "Consumer-demand trends around COVID-19 case counts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full pipeline: cases + trends + filters + report + figures.
    Run(RunArgs),
    /// Fetch and print the case-count table only (useful for scripting).
    Cases(CasesArgs),
    /// Fetch and print one region's trend table only.
    Trends(TrendsArgs),
}

/// Options for the full pipeline run.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// First daily report to fetch (MM-DD-YYYY).
    #[arg(long, default_value = "01-22-2020")]
    pub start: String,

    /// Exclusive end of the window (MM-DD-YYYY). Defaults to today.
    #[arg(long)]
    pub end: Option<String>,

    /// Regions to analyze (repeatable).
    #[arg(long, value_enum, default_values_t = [Region::Us, Region::Taiwan])]
    pub region: Vec<Region>,

    /// Root directory for cached downloads.
    #[arg(long, default_value = "data")]
    pub cache_dir: PathBuf,

    /// Output directory for rendered figures.
    #[arg(long, default_value = "figures")]
    pub figures_dir: PathBuf,

    /// Base URL for daily case reports.
    #[arg(long, default_value = DEFAULT_CASES_BASE_URL)]
    pub cases_url: String,

    /// Base URL for the search-interest CSV endpoint.
    #[arg(long, default_value = DEFAULT_TRENDS_BASE_URL)]
    pub trends_url: String,

    /// Skip figure rendering.
    #[arg(long)]
    pub no_plot: bool,

    /// Do not write fetched trend tables to the cache.
    #[arg(long)]
    pub no_persist: bool,

    /// Export the assembled case table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_cases: Option<PathBuf>,

    /// Fetch attempts per resource (1 disables retrying).
    #[arg(long, default_value_t = 3)]
    pub retries: u32,
}

/// Options for the cases-only subcommand.
#[derive(Debug, Parser, Clone)]
pub struct CasesArgs {
    /// First daily report to fetch (MM-DD-YYYY).
    #[arg(long, default_value = "01-22-2020")]
    pub start: String,

    /// Exclusive end of the window (MM-DD-YYYY). Defaults to today.
    #[arg(long)]
    pub end: Option<String>,

    /// Root directory for cached downloads.
    #[arg(long, default_value = "data")]
    pub cache_dir: PathBuf,

    /// Base URL for daily case reports.
    #[arg(long, default_value = DEFAULT_CASES_BASE_URL)]
    pub cases_url: String,

    /// Export the assembled case table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Fetch attempts per resource (1 disables retrying).
    #[arg(long, default_value_t = 3)]
    pub retries: u32,
}

/// Which trend window to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WindowArg {
    /// Five years back from the end date (impact-filter input).
    Long,
    /// Pandemic era only (spike-filter input).
    Recent,
}

/// Options for the trends-only subcommand.
#[derive(Debug, Parser, Clone)]
pub struct TrendsArgs {
    /// Region whose keyword vocabulary to query.
    #[arg(long, value_enum, default_value_t = Region::Us)]
    pub region: Region,

    /// Trend window to fetch.
    #[arg(long, value_enum, default_value_t = WindowArg::Recent)]
    pub window: WindowArg,

    /// Exclusive end of the window (MM-DD-YYYY). Defaults to today.
    #[arg(long)]
    pub end: Option<String>,

    /// Root directory for cached downloads.
    #[arg(long, default_value = "data")]
    pub cache_dir: PathBuf,

    /// Base URL for the search-interest CSV endpoint.
    #[arg(long, default_value = DEFAULT_TRENDS_BASE_URL)]
    pub trends_url: String,

    /// Do not write the fetched table to the cache.
    #[arg(long)]
    pub no_persist: bool,

    /// Fetch attempts per resource (1 disables retrying).
    #[arg(long, default_value_t = 3)]
    pub retries: u32,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn run_defaults_cover_both_regions() {
        let cli = Cli::parse_from(["dtr", "run"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.start, "01-22-2020");
        assert_eq!(args.region, vec![Region::Us, Region::Taiwan]);
        assert_eq!(args.retries, 3);
        assert!(!args.no_plot);
        assert!(args.end.is_none());
    }

    #[test]
    fn regions_parse_from_codes() {
        let cli = Cli::parse_from(["dtr", "run", "--region", "tw"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.region, vec![Region::Taiwan]);
    }

    #[test]
    fn trends_window_parses() {
        let cli = Cli::parse_from(["dtr", "trends", "--region", "us", "--window", "long"]);
        let Command::Trends(args) = cli.command else {
            panic!("expected trends subcommand");
        };
        assert_eq!(args.window, WindowArg::Long);
    }
}
