//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the fetch/filter pipeline
//! - prints the run summary
//! - writes optional exports and figures

use chrono::{Local, Months, NaiveDate};
use clap::Parser;
use reqwest::blocking::Client;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::{CasesArgs, Command, RunArgs, TrendsArgs, WindowArg};
use crate::data::cases::{CaseDataAssembler, DEFAULT_CASES_BASE_URL, HttpCaseSource};
use crate::data::trends::DEFAULT_TRENDS_BASE_URL;
use crate::data::{dates, trends::HttpTrendSource, trends::TrendDataFetcher};
use crate::domain::{PipelineConfig, Region, RetryPolicy, first_report_date, pandemic_onset};
use crate::error::AppError;

pub mod pipeline;

/// Environment override for the case-report base URL.
const CASES_URL_ENV: &str = "DTR_CASES_URL";
/// Environment override for the trend-endpoint base URL.
const TRENDS_URL_ENV: &str = "DTR_TRENDS_URL";

/// Entry point for the `dtr` binary.
pub fn run() -> Result<(), AppError> {
    // We want plain `dtr` (and `dtr --no-plot`) to behave like `dtr run ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());

    init_tracing();
    // A local .env can set the URL overrides; absence is not an error.
    dotenvy::dotenv().ok();

    let cli = crate::cli::Cli::parse_from(argv);
    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Cases(args) => handle_cases(args),
        Command::Trends(args) => handle_trends(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .ok();
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args)?;
    let run = pipeline::run_pipeline(&config)?;

    println!("{}", crate::report::format_run_summary(&run, &config));

    if let Some(path) = &config.export_cases {
        crate::io::table::write_case_table(path, &run.cases.table)?;
        println!("wrote case table to {}", path.display());
    }

    if config.plot {
        render_figures(&run, &config)?;
    }

    Ok(())
}

fn handle_cases(args: CasesArgs) -> Result<(), AppError> {
    let end = parse_end(args.end.as_deref())?;
    let dates = dates::generate(&args.start, end)?;

    let client = Client::new();
    let source = HttpCaseSource::new(
        client,
        resolve_url(args.cases_url, DEFAULT_CASES_BASE_URL, CASES_URL_ENV),
    );
    let assembler = CaseDataAssembler::new(&source, &args.cache_dir, retry_policy(args.retries));
    let cases = assembler.assemble(&dates)?;

    println!("{}", crate::report::format_case_table(&cases));

    if let Some(path) = &args.export {
        crate::io::table::write_case_table(path, &cases.table)?;
        println!("wrote case table to {}", path.display());
    }

    Ok(())
}

fn handle_trends(args: TrendsArgs) -> Result<(), AppError> {
    let end = parse_end(args.end.as_deref())?;
    let start = match args.window {
        WindowArg::Long => end
            .checked_sub_months(Months::new(60))
            .unwrap_or_else(pandemic_onset),
        WindowArg::Recent => first_report_date(),
    };

    let client = Client::new();
    let source = HttpTrendSource::new(
        client,
        resolve_url(args.trends_url, DEFAULT_TRENDS_BASE_URL, TRENDS_URL_ENV),
    );
    let fetcher = TrendDataFetcher::new(&source, &args.cache_dir, retry_policy(args.retries));
    let trends = fetcher.fetch(
        args.region.query_keywords(),
        args.region,
        start,
        end,
        !args.no_persist,
    )?;

    println!("{}", crate::report::format_trend_table(&trends));
    Ok(())
}

fn pipeline_config_from_args(args: &RunArgs) -> Result<PipelineConfig, AppError> {
    if args.region.is_empty() {
        return Err(AppError::empty("no regions requested"));
    }

    Ok(PipelineConfig {
        start: args.start.clone(),
        end: parse_end(args.end.as_deref())?,
        regions: args.region.clone(),
        cache_root: args.cache_dir.clone(),
        figures_dir: args.figures_dir.clone(),
        cases_base_url: resolve_url(args.cases_url.clone(), DEFAULT_CASES_BASE_URL, CASES_URL_ENV),
        trends_base_url: resolve_url(
            args.trends_url.clone(),
            DEFAULT_TRENDS_BASE_URL,
            TRENDS_URL_ENV,
        ),
        persist_trends: !args.no_persist,
        plot: !args.no_plot,
        export_cases: args.export_cases.clone(),
        retry: retry_policy(args.retries),
    })
}

/// Parse the optional end date; `None` means "today".
fn parse_end(raw: Option<&str>) -> Result<NaiveDate, AppError> {
    match raw {
        None => Ok(Local::now().date_naive()),
        Some(raw) => crate::data::cases::parse_report_date(raw),
    }
}

/// Apply an environment override to a base URL unless the flag was changed
/// from its own built-in default.
fn resolve_url(from_args: String, default: &str, env_key: &str) -> String {
    if from_args != default {
        return from_args;
    }
    match std::env::var(env_key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => from_args,
    }
}

fn retry_policy(retries: u32) -> RetryPolicy {
    RetryPolicy {
        attempts: retries.max(1),
        ..RetryPolicy::default()
    }
}

fn render_figures(run: &pipeline::RunOutput, config: &PipelineConfig) -> Result<(), AppError> {
    crate::io::table::create_dir_all(&config.figures_dir)?;

    for region_run in &run.regions {
        if region_run.merged.rows.is_empty() {
            warn!(
                region = region_run.region.label(),
                "merged series is empty, skipping keyword figures"
            );
            continue;
        }
        for keyword in &region_run.merged.keywords {
            let path = config
                .figures_dir
                .join(crate::plot::keyword_figure_name(region_run.region, keyword));
            let highlight = region_run.selection.representative.contains(keyword);
            crate::plot::render_keyword_chart(&path, &region_run.merged, keyword, highlight)?;
        }
    }

    // Cross-region comparison only makes sense when both regions ran.
    if config.regions.contains(&Region::Us) && config.regions.contains(&Region::Taiwan) {
        let taiwan = run.cases.table.series_for(Region::Taiwan);
        let us = run.cases.table.series_for(Region::Us);
        if taiwan.records.is_empty() || us.records.is_empty() {
            warn!("a case series is empty, skipping the comparison figure");
        } else {
            let path = config.figures_dir.join("confirmed_us_taiwan.png");
            crate::plot::render_cases_chart(&path, &taiwan, &us)?;
        }
    }

    println!("wrote figures to {}", config.figures_dir.display());
    Ok(())
}

/// Rewrite argv so `dtr` defaults to `dtr run`.
///
/// Rules:
/// - `dtr`                     -> `dtr run`
/// - `dtr --no-plot ...`       -> `dtr run --no-plot ...`
/// - `dtr --help/--version/-h` -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "cases" | "trends");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "run flags".
    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
        return argv;
    }

    // Otherwise, leave as-is and let clap report the unknown subcommand.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_run() {
        assert_eq!(rewrite_args(args(&["dtr"])), args(&["dtr", "run"]));
        assert_eq!(
            rewrite_args(args(&["dtr", "--no-plot"])),
            args(&["dtr", "run", "--no-plot"])
        );
    }

    #[test]
    fn explicit_subcommands_and_help_pass_through() {
        assert_eq!(
            rewrite_args(args(&["dtr", "cases"])),
            args(&["dtr", "cases"])
        );
        assert_eq!(
            rewrite_args(args(&["dtr", "--help"])),
            args(&["dtr", "--help"])
        );
    }

    #[test]
    fn end_date_parsing() {
        assert_eq!(
            parse_end(Some("03-22-2020")).unwrap(),
            NaiveDate::from_ymd_opt(2020, 3, 22).unwrap()
        );
        assert!(matches!(
            parse_end(Some("")).unwrap_err(),
            AppError::EmptyInput(_)
        ));
        assert!(matches!(
            parse_end(Some("2020-03-22")).unwrap_err(),
            AppError::InvalidArgument(_)
        ));
        // None falls back to today; just check it parses to a date at all.
        assert!(parse_end(None).is_ok());
    }

    #[test]
    fn url_override_applies_only_to_the_matching_default() {
        let key = "DTR_URL_OVERRIDE_TEST";
        unsafe { std::env::set_var(key, "http://override.example") };

        // A flag left at its own default picks up the override.
        assert_eq!(
            resolve_url("http://a".to_string(), "http://a", key),
            "http://override.example"
        );
        // Any other value passes through untouched — including the *other*
        // endpoint's default URL.
        assert_eq!(
            resolve_url(DEFAULT_TRENDS_BASE_URL.to_string(), DEFAULT_CASES_BASE_URL, key),
            DEFAULT_TRENDS_BASE_URL
        );

        unsafe { std::env::remove_var(key) };
    }

    #[test]
    fn retry_policy_never_drops_below_one_attempt() {
        assert_eq!(retry_policy(0).attempts, 1);
        assert_eq!(retry_policy(5).attempts, 5);
    }
}
