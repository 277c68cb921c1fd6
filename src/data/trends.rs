//! Search-interest ("trend") table fetch.
//!
//! The upstream API limits multi-keyword comparisons (scores in a comparison
//! are renormalized against each other), so this fetcher deliberately issues
//! one query per keyword to keep every series independently normalized on its
//! own 0..100 scale.
//!
//! Cache files are keyed by (region, window class): the API also renormalizes
//! scores per query window, so the long-history and recent tables for the
//! same region are different data, not duplicates.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use reqwest::StatusCode;
use reqwest::blocking::Client;

use crate::data::{FetchFailure, with_retry};
use crate::domain::{
    Region, RetryPolicy, TrendColumn, TrendSeries, WindowClass, canonical_keyword,
};
use crate::error::AppError;
use crate::io::{cache, table};

/// Default search-interest endpoint.
pub const DEFAULT_TRENDS_BASE_URL: &str =
    "https://trends.googleapis.com/trends/api/widgetdata/multiline/csv";

/// Cache subdirectory for per-(region, window) trend tables.
const TREND_CACHE_DIR: &str = "trends";

/// Upstream limit on keywords per table.
pub const MAX_KEYWORDS: usize = 10;

/// One interest-over-time observation as reported upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendObservation {
    pub date: NaiveDate,
    /// Interest score in `[0, 100]`.
    pub score: u32,
    /// Upstream "incomplete data" flag; dropped during table assembly.
    pub partial: bool,
}

/// Source of per-keyword interest series.
///
/// The seam exists so the cache/alignment/translation logic is testable
/// against deterministic fixtures instead of the network.
pub trait TrendSource {
    fn interest_over_time(
        &self,
        keyword: &str,
        region: Region,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TrendObservation>, FetchFailure>;
}

/// HTTP-backed source querying `{base_url}?q={kw}&geo={code}&date={window}`.
pub struct HttpTrendSource {
    client: Client,
    base_url: String,
}

impl HttpTrendSource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl TrendSource for HttpTrendSource {
    fn interest_over_time(
        &self,
        keyword: &str,
        region: Region,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TrendObservation>, FetchFailure> {
        let window = format!("{start} {end}");
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", keyword), ("geo", region.code()), ("date", &window)])
            .send()
            .map_err(|e| FetchFailure::Transient(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(FetchFailure::NotFound(format!(
                "no interest data for '{keyword}' ({})",
                region.code()
            )));
        }
        if !response.status().is_success() {
            return Err(FetchFailure::Transient(format!(
                "trend query for '{keyword}' returned status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .map_err(|e| FetchFailure::Transient(e.to_string()))?;
        parse_interest_csv(&body)
    }
}

/// Parse an upstream interest-over-time CSV body.
///
/// The first column is the date, one column carries the score, and an
/// optional `isPartial` column flags incomplete trailing days.
fn parse_interest_csv(body: &str) -> Result<Vec<TrendObservation>, FetchFailure> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| FetchFailure::Transient(e.to_string()))?
        .clone();

    let partial_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("isPartial"));
    let score_idx = (1..headers.len())
        .find(|idx| Some(*idx) != partial_idx)
        .ok_or_else(|| FetchFailure::Transient("response has no score column".to_string()))?;

    let mut out = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| FetchFailure::Transient(e.to_string()))?;

        let raw_date = record.get(0).map(str::trim).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|e| FetchFailure::Transient(format!("invalid date '{raw_date}': {e}")))?;

        let raw_score = record.get(score_idx).map(str::trim).unwrap_or_default();
        let score = if raw_score.is_empty() {
            0
        } else {
            raw_score
                .parse::<u32>()
                .map_err(|e| FetchFailure::Transient(format!("invalid score '{raw_score}': {e}")))?
                .min(100)
        };

        let partial = partial_idx
            .and_then(|idx| record.get(idx))
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        out.push(TrendObservation {
            date,
            score,
            partial,
        });
    }

    Ok(out)
}

/// Cache-first fetcher for a keyword-by-date interest table.
pub struct TrendDataFetcher<'a, S: TrendSource> {
    source: &'a S,
    cache_dir: PathBuf,
    retry: RetryPolicy,
}

impl<'a, S: TrendSource> TrendDataFetcher<'a, S> {
    pub fn new(source: &'a S, cache_root: &Path, retry: RetryPolicy) -> Self {
        Self {
            source,
            cache_dir: cache_root.join(TREND_CACHE_DIR),
            retry,
        }
    }

    /// Fetch the interest table for `keywords` over `[start, end)`.
    ///
    /// `keywords` are query terms in the region's language; column names in
    /// the returned table are always the canonical English labels. When
    /// `persist` is set, a cache miss writes the assembled table back to the
    /// (region, window-class) cache file.
    pub fn fetch(
        &self,
        keywords: &[&str],
        region: Region,
        start: NaiveDate,
        end: NaiveDate,
        persist: bool,
    ) -> Result<TrendSeries, AppError> {
        if keywords.is_empty() {
            return Err(AppError::empty("no keywords to fetch"));
        }
        if keywords.len() > MAX_KEYWORDS {
            return Err(AppError::invalid(format!(
                "at most {MAX_KEYWORDS} keywords per table (got {})",
                keywords.len()
            )));
        }
        if start > end {
            return Err(AppError::invalid(format!(
                "window start {start} is after end {end}"
            )));
        }

        let window = WindowClass::for_window_start(start);
        let path = self
            .cache_dir
            .join(format!("{}_{}.csv", region.code(), window.tag()));

        cache::load_or_fetch(
            &path,
            persist,
            table::read_trend_table,
            || self.fetch_remote(keywords, region, start, end),
            table::write_trend_table,
        )
    }

    fn fetch_remote(
        &self,
        keywords: &[&str],
        region: Region,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TrendSeries, AppError> {
        let mut fetched: Vec<(String, HashMap<NaiveDate, u32>)> = Vec::new();
        let mut dates: Vec<NaiveDate> = Vec::new();

        for &query in keywords {
            let label = canonical_keyword(region, query).to_string();
            let resource = format!("trend {} '{label}'", region.code());
            let observations = with_retry(&resource, self.retry, || {
                self.source.interest_over_time(query, region, start, end)
            })?;

            // The first keyword that returns any data defines the shared date
            // axis; a keyword with an empty response must not lock the axis
            // empty for the ones after it. The partial-day flag is dropped
            // here; scores for partial days are kept as reported.
            if dates.is_empty() {
                dates = observations.iter().map(|o| o.date).collect();
            }

            fetched.push((
                label,
                observations.iter().map(|o| (o.date, o.score)).collect(),
            ));
        }

        // Align every column on the shared axis; a keyword with no
        // observation on a date scores 0.
        let columns = fetched
            .into_iter()
            .map(|(keyword, by_date)| TrendColumn {
                keyword,
                values: dates
                    .iter()
                    .map(|d| by_date.get(d).copied().unwrap_or(0))
                    .collect(),
            })
            .collect();

        Ok(TrendSeries { dates, columns })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::time::Duration;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn no_retry() -> RetryPolicy {
        RetryPolicy {
            attempts: 1,
            base_delay: Duration::from_millis(0),
        }
    }

    /// Fixture source: every keyword scores its index in the query order,
    /// except the last date which scores 100.
    struct FixtureSource {
        dates: Vec<NaiveDate>,
        queries: RefCell<Vec<String>>,
    }

    impl FixtureSource {
        fn new(dates: Vec<NaiveDate>) -> Self {
            Self {
                dates,
                queries: RefCell::new(Vec::new()),
            }
        }
    }

    impl TrendSource for FixtureSource {
        fn interest_over_time(
            &self,
            keyword: &str,
            _region: Region,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<TrendObservation>, FetchFailure> {
            let mut queries = self.queries.borrow_mut();
            let base = queries.len() as u32;
            queries.push(keyword.to_string());

            Ok(self
                .dates
                .iter()
                .enumerate()
                .map(|(idx, &d)| TrendObservation {
                    date: d,
                    score: if idx == self.dates.len() - 1 { 100 } else { base },
                    partial: idx == self.dates.len() - 1,
                })
                .collect())
        }
    }

    #[test]
    fn queries_one_keyword_at_a_time_and_translates_labels() {
        let dates = vec![date(2020, 1, 22), date(2020, 1, 23)];
        let source = FixtureSource::new(dates.clone());
        let dir = tempfile::tempdir().unwrap();
        let fetcher = TrendDataFetcher::new(&source, dir.path(), no_retry());

        let series = fetcher
            .fetch(
                &["口罩", "衛生紙"],
                Region::Taiwan,
                date(2020, 1, 22),
                date(2020, 1, 24),
                false,
            )
            .unwrap();

        assert_eq!(*source.queries.borrow(), vec!["口罩", "衛生紙"]);
        assert_eq!(series.keywords(), vec!["mask", "toilet paper"]);
        assert_eq!(series.dates, dates);
        assert_eq!(series.columns[0].values, vec![0, 100]);
        assert_eq!(series.columns[1].values, vec![1, 100]);
    }

    #[test]
    fn windows_cache_to_separate_files() {
        let dates = vec![date(2020, 1, 22)];
        let source = FixtureSource::new(dates);
        let dir = tempfile::tempdir().unwrap();
        let fetcher = TrendDataFetcher::new(&source, dir.path(), no_retry());

        fetcher
            .fetch(
                &["mask"],
                Region::Us,
                date(2015, 4, 1),
                date(2020, 4, 1),
                true,
            )
            .unwrap();
        fetcher
            .fetch(
                &["mask"],
                Region::Us,
                date(2020, 1, 22),
                date(2020, 4, 1),
                true,
            )
            .unwrap();

        assert!(dir.path().join("trends").join("US_5yr.csv").exists());
        assert!(dir.path().join("trends").join("US_recent.csv").exists());
    }

    #[test]
    fn cached_table_short_circuits_the_source() {
        let dates = vec![date(2020, 1, 22)];
        let source = FixtureSource::new(dates);
        let dir = tempfile::tempdir().unwrap();
        let fetcher = TrendDataFetcher::new(&source, dir.path(), no_retry());

        let window = (date(2020, 1, 22), date(2020, 4, 1));
        let first = fetcher
            .fetch(&["mask"], Region::Us, window.0, window.1, true)
            .unwrap();
        let second = fetcher
            .fetch(&["mask"], Region::Us, window.0, window.1, true)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(source.queries.borrow().len(), 1);
    }

    #[test]
    fn keyword_limits_are_enforced() {
        let source = FixtureSource::new(vec![date(2020, 1, 22)]);
        let dir = tempfile::tempdir().unwrap();
        let fetcher = TrendDataFetcher::new(&source, dir.path(), no_retry());
        let window = (date(2020, 1, 22), date(2020, 4, 1));

        let err = fetcher
            .fetch(&[], Region::Us, window.0, window.1, false)
            .unwrap_err();
        assert!(matches!(err, AppError::EmptyInput(_)));

        let too_many = vec!["kw"; MAX_KEYWORDS + 1];
        let err = fetcher
            .fetch(&too_many, Region::Us, window.0, window.1, false)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn empty_first_keyword_does_not_lock_the_date_axis() {
        /// First query answers empty, every later query has one observation.
        struct SparseSource {
            calls: RefCell<u32>,
        }

        impl TrendSource for SparseSource {
            fn interest_over_time(
                &self,
                _keyword: &str,
                _region: Region,
                start: NaiveDate,
                _end: NaiveDate,
            ) -> Result<Vec<TrendObservation>, FetchFailure> {
                let mut calls = self.calls.borrow_mut();
                *calls += 1;
                if *calls == 1 {
                    return Ok(Vec::new());
                }
                Ok(vec![TrendObservation {
                    date: start,
                    score: 80,
                    partial: false,
                }])
            }
        }

        let source = SparseSource {
            calls: RefCell::new(0),
        };
        let dir = tempfile::tempdir().unwrap();
        let fetcher = TrendDataFetcher::new(&source, dir.path(), no_retry());

        let series = fetcher
            .fetch(
                &["mask", "sanitizer"],
                Region::Us,
                date(2020, 1, 22),
                date(2020, 1, 24),
                false,
            )
            .unwrap();

        // The axis comes from the second keyword; the empty one zero-fills.
        assert!(!series.is_empty());
        assert_eq!(series.dates, vec![date(2020, 1, 22)]);
        assert_eq!(series.columns[0].values, vec![0]);
        assert_eq!(series.columns[1].values, vec![80]);
    }

    #[test]
    fn interest_csv_parsing_drops_the_partial_flag_column() {
        let body = "\
date,mask,isPartial
2020-01-22,12,false
2020-01-23,95,true
";
        let observations = parse_interest_csv(body).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].score, 12);
        assert!(!observations[0].partial);
        assert_eq!(observations[1].score, 95);
        assert!(observations[1].partial);
    }
}
