//! Shared pipeline logic used by the CLI subcommands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! date range -> case assembly -> trend windows -> impact -> spike ->
//! awareness -> merge
//!
//! The subcommands can then focus on presentation (printing, figures,
//! exports).

use chrono::NaiveDate;
use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::analysis::spike::SpikeSelection;
use crate::analysis::{awareness, impact, merge, spike};
use crate::data::cases::{AssembledCases, CaseDataAssembler, CaseSource, HttpCaseSource};
use crate::data::dates;
use crate::data::trends::{HttpTrendSource, TrendDataFetcher, TrendSource};
use crate::domain::{AwarenessReport, MergedSeries, PipelineConfig, Region, TrendSeries};
use crate::error::AppError;

/// Everything the pipeline computed for one region.
#[derive(Debug, Clone)]
pub struct RegionRun {
    pub region: Region,
    /// Long-history trend table (impact filter input).
    pub history: TrendSeries,
    /// Pandemic-era trend table (spike filter and merge input).
    pub recent: TrendSeries,
    pub impacted: Vec<String>,
    pub selection: SpikeSelection,
    /// Absent when the region had no confirmed case in the window.
    pub awareness: Option<AwarenessReport>,
    pub merged: MergedSeries,
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub dates: Vec<NaiveDate>,
    pub cases: AssembledCases,
    pub regions: Vec<RegionRun>,
}

/// Execute the full pipeline against the live HTTP sources.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunOutput, AppError> {
    let client = Client::new();
    let case_source = HttpCaseSource::new(client.clone(), &config.cases_base_url);
    let trend_source = HttpTrendSource::new(client, &config.trends_base_url);
    run_with_sources(config, &case_source, &trend_source)
}

/// Execute the pipeline with explicit sources.
///
/// This is the seam tests use to drive the whole pipeline from deterministic
/// fixtures.
pub fn run_with_sources<C: CaseSource, T: TrendSource>(
    config: &PipelineConfig,
    case_source: &C,
    trend_source: &T,
) -> Result<RunOutput, AppError> {
    // 1) Date axis for the case-data window.
    let dates = dates::generate(&config.start, config.end)?;

    // 2) Assemble per-date case snapshots (cache-first; missing days skipped).
    let assembler = CaseDataAssembler::new(case_source, &config.cache_root, config.retry);
    let cases = assembler.assemble(&dates)?;
    if !cases.skipped.is_empty() {
        info!(
            skipped = cases.skipped.len(),
            total = dates.len(),
            "some dates had no daily report"
        );
    }

    // 3) Per-region trend windows and selection filters.
    let trend_fetcher = TrendDataFetcher::new(trend_source, &config.cache_root, config.retry);
    let mut regions = Vec::new();

    for &region in &config.regions {
        let keywords = region.query_keywords();

        let history = trend_fetcher.fetch(
            keywords,
            region,
            config.history_start(),
            config.end,
            config.persist_trends,
        )?;
        let recent = trend_fetcher.fetch(
            keywords,
            region,
            config.recent_start(),
            config.end,
            config.persist_trends,
        )?;

        let impacted = impact::select_impacted(&history)?;
        let selection = spike::select_representative(&recent, &impacted)?;

        // A stale trend cache can leave the peak map empty even with a
        // non-empty impacted list; that degrades like the no-case branch
        // instead of aborting the run.
        let series = cases.table.series_for(region);
        let awareness = match series.first_confirmed_date() {
            Some(first) if !selection.peaks.is_empty() => {
                Some(awareness::build(first, &selection.peaks)?)
            }
            Some(_) => {
                warn!(
                    region = region.label(),
                    "no peak dates available, skipping awareness report"
                );
                None
            }
            None => {
                warn!(
                    region = region.label(),
                    "no confirmed cases in window, skipping awareness report"
                );
                None
            }
        };

        let merged = merge::merge(&recent, &series);

        regions.push(RegionRun {
            region,
            history,
            recent,
            impacted,
            selection,
            awareness,
            merged,
        });
    }

    Ok(RunOutput {
        dates,
        cases,
        regions,
    })
}
