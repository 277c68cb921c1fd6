//! Daily case-count fetch, normalization, and assembly.
//!
//! The upstream publishes one CSV per calendar date. Different schema versions
//! name the country column differently, so normalization goes through a
//! declarative alias table rather than inline conditionals; adding a third
//! schema variant means adding one alias entry.
//!
//! Rows are filtered to the allow-list of labels that denote the two tracked
//! regions, then summed per region so multiple upstream sub-region rows
//! collapse into one record.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use tracing::warn;

use crate::data::{FetchFailure, with_retry};
use crate::domain::{CaseRecord, CaseTable, DATE_FORMAT, Region, RetryPolicy, date_key};
use crate::error::AppError;
use crate::io::{cache, table};

/// Default location of the per-date daily-report CSVs.
pub const DEFAULT_CASES_BASE_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data/csse_covid_19_daily_reports";

/// Cache subdirectory for normalized per-date snapshots.
const CASE_CACHE_DIR: &str = "cases";

/// Canonical column name → accepted upstream header names.
const COLUMN_ALIASES: [(&str, &[&str]); 4] = [
    ("Country", &["Country/Region", "Country_Region"]),
    ("Confirmed", &["Confirmed"]),
    ("Deaths", &["Deaths"]),
    ("Recovered", &["Recovered"]),
];

/// Parse a report date from CLI or config input.
///
/// Split out from range generation so callers get `EmptyInput` for an absent
/// date and `InvalidArgument` for a malformed one.
pub fn parse_report_date(raw: &str) -> Result<NaiveDate, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::empty("report date is empty"));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|e| {
        AppError::invalid(format!(
            "report date '{trimmed}' does not match {DATE_FORMAT}: {e}"
        ))
    })
}

/// Source of raw daily-report bodies.
///
/// The seam exists so the fetch/cache/normalize logic is testable against
/// deterministic fixtures instead of the network.
pub trait CaseSource {
    /// Raw CSV body of the daily report for `date`.
    fn daily_report(&self, date: NaiveDate) -> Result<String, FetchFailure>;
}

/// HTTP-backed source reading `{base_url}/{MM-DD-YYYY}.csv`.
pub struct HttpCaseSource {
    client: Client,
    base_url: String,
}

impl HttpCaseSource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl CaseSource for HttpCaseSource {
    fn daily_report(&self, date: NaiveDate) -> Result<String, FetchFailure> {
        let url = format!(
            "{}/{}.csv",
            self.base_url.trim_end_matches('/'),
            date_key(date)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| FetchFailure::Transient(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(FetchFailure::NotFound(format!("{url} returned 404")));
        }
        if !response.status().is_success() {
            return Err(FetchFailure::Transient(format!(
                "{url} returned status {}",
                response.status()
            )));
        }

        response
            .text()
            .map_err(|e| FetchFailure::Transient(e.to_string()))
    }
}

/// Cache-first fetcher for one day's normalized case records.
pub struct CaseDataFetcher<'a, S: CaseSource> {
    source: &'a S,
    cache_dir: PathBuf,
    retry: RetryPolicy,
}

impl<'a, S: CaseSource> CaseDataFetcher<'a, S> {
    pub fn new(source: &'a S, cache_root: &Path, retry: RetryPolicy) -> Self {
        Self {
            source,
            cache_dir: cache_root.join(CASE_CACHE_DIR),
            retry,
        }
    }

    /// One normalized record per tracked region present in the day's report.
    pub fn fetch(&self, date: NaiveDate) -> Result<Vec<CaseRecord>, AppError> {
        let key = date_key(date);
        let path = self.cache_dir.join(format!("{key}.csv"));

        let table = cache::load_or_fetch(
            &path,
            true,
            table::read_case_table,
            || {
                let resource = format!("daily report {key}");
                let body = with_retry(&resource, self.retry, || self.source.daily_report(date))?;
                normalize_daily_report(&body, date)
            },
            table::write_case_table,
        )?;

        Ok(table.rows)
    }
}

/// Normalize one raw daily report into canonical per-region records.
fn normalize_daily_report(body: &str, date: NaiveDate) -> Result<CaseTable, AppError> {
    let resource = format!("daily report {}", date_key(date));

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = resolve_columns(&headers)
        .map_err(|missing| AppError::fetch(&resource, format!("missing column {missing}")))?;
    let [country_idx, confirmed_idx, deaths_idx, recovered_idx] = columns;

    // Region → summed (confirmed, deaths, recovered).
    let mut totals: BTreeMap<Region, (u64, u64, u64)> = BTreeMap::new();

    for result in reader.records() {
        let record = result?;
        let label = record.get(country_idx).map(str::trim).unwrap_or_default();
        let Some(region) = Region::from_report_label(label) else {
            continue;
        };

        let confirmed = parse_count(record.get(confirmed_idx))
            .map_err(|e| AppError::fetch(&resource, e))?;
        let deaths =
            parse_count(record.get(deaths_idx)).map_err(|e| AppError::fetch(&resource, e))?;
        let recovered =
            parse_count(record.get(recovered_idx)).map_err(|e| AppError::fetch(&resource, e))?;

        let entry = totals.entry(region).or_default();
        entry.0 += confirmed;
        entry.1 += deaths;
        entry.2 += recovered;
    }

    let rows = totals
        .into_iter()
        .map(|(region, (confirmed, deaths, recovered))| CaseRecord {
            date,
            region,
            confirmed,
            deaths,
            recovered,
        })
        .collect();

    Ok(CaseTable { rows })
}

/// Resolve the canonical column indices via the alias table.
fn resolve_columns(headers: &csv::StringRecord) -> Result<[usize; 4], &'static str> {
    let mut out = [0usize; 4];
    for (slot, (canonical, aliases)) in COLUMN_ALIASES.iter().enumerate() {
        let idx = headers
            .iter()
            .position(|header| {
                let header = header.trim().trim_start_matches('\u{feff}');
                aliases.contains(&header)
            })
            .ok_or(*canonical)?;
        out[slot] = idx;
    }
    Ok(out)
}

/// Counts appear as integers, floats ("12.0"), or empty cells.
fn parse_count(raw: Option<&str>) -> Result<u64, String> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(0);
    }
    let value = raw
        .parse::<f64>()
        .map_err(|_| format!("non-numeric count '{raw}'"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("invalid count '{raw}'"));
    }
    Ok(value as u64)
}

/// Assembly result: the concatenated table plus the dates that had no report.
#[derive(Debug, Clone)]
pub struct AssembledCases {
    pub table: CaseTable,
    pub skipped: Vec<NaiveDate>,
}

/// Concatenates per-date snapshots into one time-indexed table.
pub struct CaseDataAssembler<'a, S: CaseSource> {
    fetcher: CaseDataFetcher<'a, S>,
}

impl<'a, S: CaseSource> CaseDataAssembler<'a, S> {
    pub fn new(source: &'a S, cache_root: &Path, retry: RetryPolicy) -> Self {
        Self {
            fetcher: CaseDataFetcher::new(source, cache_root, retry),
        }
    }

    /// Fetch every date in order, appending per-region rows.
    ///
    /// A date whose report is unavailable is logged and skipped — it appears
    /// in `skipped`, not as a placeholder row. Any non-fetch error aborts the
    /// run.
    pub fn assemble(&self, dates: &[NaiveDate]) -> Result<AssembledCases, AppError> {
        if dates.is_empty() {
            return Err(AppError::empty("no dates to assemble"));
        }

        let mut rows = Vec::new();
        let mut skipped = Vec::new();

        for &date in dates {
            match self.fetcher.fetch(date) {
                Ok(records) => rows.extend(records),
                Err(AppError::Fetch { resource, reason }) => {
                    warn!(%resource, %reason, "day unavailable, skipping");
                    skipped.push(date);
                }
                Err(err) => return Err(err),
            }
        }

        Ok(AssembledCases {
            table: CaseTable { rows },
            skipped,
        })
    }
}
