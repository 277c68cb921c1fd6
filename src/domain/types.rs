//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during selection/merging
//! - exported to CSV caches and reloaded on later runs
//! - inspected in tests without fixture plumbing

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Months, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Fixed textual date format used for cache keys, cache files, and CLI input.
pub const DATE_FORMAT: &str = "%m-%d-%Y";

/// Canonical English keyword vocabulary (order-significant).
///
/// All downstream comparisons use these labels regardless of the language the
/// upstream trend query was issued in.
pub const KEYWORDS_EN: [&str; 10] = [
    "disinfectants",
    "thermometers",
    "oat milk",
    "rubbing alcohol",
    "powdered milk",
    "hydrogen peroxide",
    "mask",
    "sanitizer",
    "toilet paper",
    "disposable gloves",
];

/// Traditional-Chinese query terms, aligned 1:1 with `KEYWORDS_EN`.
pub const KEYWORDS_TW: [&str; 10] = [
    "消毒",
    "額溫槍",
    "燕麥奶",
    "酒精",
    "奶粉",
    "漂白水",
    "口罩",
    "乾洗手",
    "衛生紙",
    "手套",
];

/// First date with an upstream daily report (01-22-2020).
pub fn first_report_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 22).expect("hardcoded date is valid")
}

/// Pandemic-onset boundary used by the impact filter and window classing.
pub fn pandemic_onset() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).expect("hardcoded date is valid")
}

/// Format a date as a fixed-width cache key (`MM-DD-YYYY`).
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// One of the two tracked regions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Us,
    /// Accepted on the CLI as either `taiwan` or `tw`.
    #[value(alias = "tw")]
    Taiwan,
}

impl Region {
    pub const ALL: [Region; 2] = [Region::Us, Region::Taiwan];

    /// Two-letter region code used in trend queries and cache file names.
    pub fn code(self) -> &'static str {
        match self {
            Region::Us => "US",
            Region::Taiwan => "TW",
        }
    }

    /// Canonical region label used in case tables.
    pub fn label(self) -> &'static str {
        match self {
            Region::Us => "US",
            Region::Taiwan => "Taiwan",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, AppError> {
        match code {
            "US" => Ok(Region::Us),
            "TW" => Ok(Region::Taiwan),
            other => Err(AppError::invalid(format!(
                "unsupported region code '{other}' (expected US or TW)"
            ))),
        }
    }

    /// Resolve an upstream daily-report label to a tracked region.
    ///
    /// Labels outside the allow-list return `None` and the row is dropped.
    /// Any allowed label other than the exact US identifier canonicalizes to
    /// `Taiwan` — including variants with a trailing marker and the named
    /// sub-region that folds into its parent.
    pub fn from_report_label(label: &str) -> Option<Self> {
        match label {
            "US" => Some(Region::Us),
            "Taiwan" | "Taiwan*" | "Taipei and environs" => Some(Region::Taiwan),
            _ => None,
        }
    }

    /// Query terms in the region's language (order-significant, ≤10).
    pub fn query_keywords(self) -> &'static [&'static str; 10] {
        match self {
            Region::Us => &KEYWORDS_EN,
            Region::Taiwan => &KEYWORDS_TW,
        }
    }
}

/// Translate a region-language query term to its canonical English label.
///
/// Unknown terms pass through unchanged so ad-hoc queries still produce a
/// usable column name.
pub fn canonical_keyword(region: Region, query: &str) -> &str {
    region
        .query_keywords()
        .iter()
        .position(|kw| *kw == query)
        .map(|idx| KEYWORDS_EN[idx])
        .unwrap_or(query)
}

/// Aggregated case counts for one region on one date.
///
/// Produced by summing all raw sub-rows for the region on that date (upstream
/// may report multiple sub-regions under one logical region).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseRecord {
    pub date: NaiveDate,
    pub region: Region,
    pub confirmed: u64,
    pub deaths: u64,
    pub recovered: u64,
}

/// Assembled case table across dates and regions, ordered by processed date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseTable {
    pub rows: Vec<CaseRecord>,
}

impl CaseTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Extract the ordered-by-date series for one region.
    pub fn series_for(&self, region: Region) -> CaseSeries {
        CaseSeries {
            region,
            records: self
                .rows
                .iter()
                .filter(|r| r.region == region)
                .copied()
                .collect(),
        }
    }
}

/// Ordered-by-date case records for a single region.
#[derive(Debug, Clone)]
pub struct CaseSeries {
    pub region: Region,
    pub records: Vec<CaseRecord>,
}

impl CaseSeries {
    /// Date of the region's first confirmed case, if any.
    pub fn first_confirmed_date(&self) -> Option<NaiveDate> {
        self.records
            .iter()
            .find(|r| r.confirmed > 0)
            .map(|r| r.date)
    }

    pub fn record_on(&self, date: NaiveDate) -> Option<&CaseRecord> {
        self.records.iter().find(|r| r.date == date)
    }
}

/// Keyword-by-date search-interest table.
///
/// Invariant: every column's `values` has the same length as `dates`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrendSeries {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<TrendColumn>,
}

/// One keyword's interest-over-time scores in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendColumn {
    pub keyword: String,
    pub values: Vec<u32>,
}

impl TrendSeries {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.columns.is_empty()
    }

    pub fn column(&self, keyword: &str) -> Option<&TrendColumn> {
        self.columns.iter().find(|c| c.keyword == keyword)
    }

    pub fn keywords(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.keyword.clone()).collect()
    }
}

/// Which trend query range a cache file belongs to.
///
/// The upstream search-interest API renormalizes scores per query window, so
/// the same keyword/date can legitimately carry different scores across window
/// choices. The two classes are therefore cached as separate files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowClass {
    /// Multi-year baseline window starting before the pandemic onset.
    LongHistory,
    /// Pandemic-era window starting at or after the onset.
    Recent,
}

impl WindowClass {
    pub fn for_window_start(start: NaiveDate) -> Self {
        if start < pandemic_onset() {
            WindowClass::LongHistory
        } else {
            WindowClass::Recent
        }
    }

    /// File-name tag for the cache layout.
    pub fn tag(self) -> &'static str {
        match self {
            WindowClass::LongHistory => "5yr",
            WindowClass::Recent => "recent",
        }
    }
}

/// Keyword → date of maximal search interest (first occurrence on ties).
pub type PeakDateMap = BTreeMap<String, NaiveDate>;

/// Mean lag between the first confirmed case and peak search interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwarenessReport {
    pub first_confirmed_date: NaiveDate,
    /// Floor of the arithmetic mean of per-keyword lags (may be negative).
    pub mean_lag_days: i64,
    pub mean_awareness_date: NaiveDate,
}

/// Trend table left-joined with a region's case series on date.
///
/// Every trend date is kept; case values without a match fill to 0 and the
/// region label fills to the series region. Used only for rendering.
#[derive(Debug, Clone)]
pub struct MergedSeries {
    pub region: Region,
    pub keywords: Vec<String>,
    pub rows: Vec<MergedRow>,
}

/// One merged row: per-keyword interest aligned with `MergedSeries::keywords`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRow {
    pub date: NaiveDate,
    pub interest: Vec<u32>,
    pub confirmed: u64,
    pub deaths: u64,
    pub recovered: u64,
}

/// Bounded retry with backoff for remote fetches.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts (first try included). 1 disables retrying.
    pub attempts: u32,
    /// Delay before the second attempt; doubles per retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults) — no component reads
/// ambient state like the working directory or environment on its own.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Start of the case-data window, in `MM-DD-YYYY` form.
    ///
    /// Kept textual so the date-range generator owns format validation.
    pub start: String,
    /// Exclusive end of the case-data window.
    pub end: NaiveDate,
    pub regions: Vec<Region>,

    pub cache_root: PathBuf,
    pub figures_dir: PathBuf,

    pub cases_base_url: String,
    pub trends_base_url: String,

    /// Persist freshly fetched trend tables to cache.
    pub persist_trends: bool,
    pub plot: bool,
    pub export_cases: Option<PathBuf>,

    pub retry: RetryPolicy,
}

impl PipelineConfig {
    /// Start of the long-history trend window (five years back from `end`).
    pub fn history_start(&self) -> NaiveDate {
        self.end
            .checked_sub_months(Months::new(60))
            .unwrap_or_else(pandemic_onset)
    }

    /// Start of the recent (pandemic-era) trend window.
    pub fn recent_start(&self) -> NaiveDate {
        first_report_date()
    }
}
