//! Tabular storage for case and trend data.
//!
//! Cache files are delimited text with a header row. Dates are written in the
//! fixed `MM-DD-YYYY` format and re-parsed as dates on load, so a reloaded
//! table is value-equal to the one that was written.
//!
//! Writes go through write-then-rename so a crashed or concurrent run never
//! leaves a torn file behind at the cache path.

use std::fs::{self, File};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{CaseRecord, CaseTable, DATE_FORMAT, Region, TrendColumn, TrendSeries, date_key};
use crate::error::AppError;

pub fn path_exists(path: &Path) -> bool {
    path.exists()
}

pub fn create_dir_all(path: &Path) -> Result<(), AppError> {
    fs::create_dir_all(path).map_err(|e| AppError::io(path, e))
}

/// Serialized shape of one case row (canonical schema).
#[derive(Debug, Serialize, Deserialize)]
struct CaseCsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Country")]
    country: String,
    #[serde(rename = "Confirmed")]
    confirmed: u64,
    #[serde(rename = "Deaths")]
    deaths: u64,
    #[serde(rename = "Recovered")]
    recovered: u64,
}

impl CaseCsvRow {
    fn from_record(record: &CaseRecord) -> Self {
        Self {
            date: date_key(record.date),
            country: record.region.label().to_string(),
            confirmed: record.confirmed,
            deaths: record.deaths,
            recovered: record.recovered,
        }
    }

    fn into_record(self, path: &Path) -> Result<CaseRecord, AppError> {
        let region = Region::from_report_label(&self.country).ok_or_else(|| {
            AppError::invalid(format!(
                "unknown region label '{}' in '{}'",
                self.country,
                path.display()
            ))
        })?;
        Ok(CaseRecord {
            date: parse_table_date(&self.date)?,
            region,
            confirmed: self.confirmed,
            deaths: self.deaths,
            recovered: self.recovered,
        })
    }
}

pub fn read_case_table(path: &Path) -> Result<CaseTable, AppError> {
    let file = File::open(path).map_err(|e| AppError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = Vec::new();
    for result in reader.deserialize::<CaseCsvRow>() {
        rows.push(result?.into_record(path)?);
    }
    Ok(CaseTable { rows })
}

pub fn write_case_table(path: &Path, table: &CaseTable) -> Result<(), AppError> {
    write_atomically(path, |tmp| {
        let mut writer = csv::Writer::from_path(tmp)?;
        for row in &table.rows {
            writer.serialize(CaseCsvRow::from_record(row))?;
        }
        writer.flush().map_err(|e| AppError::io(tmp, e))
    })
}

/// Read a trend table: first column is the date axis, every other column is a
/// keyword's interest series.
pub fn read_trend_table(path: &Path) -> Result<TrendSeries, AppError> {
    let file = File::open(path).map_err(|e| AppError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(AppError::empty(format!(
            "trend table '{}' has no keyword columns",
            path.display()
        )));
    }

    let mut columns: Vec<TrendColumn> = headers
        .iter()
        .skip(1)
        .map(|name| TrendColumn {
            keyword: name.to_string(),
            values: Vec::new(),
        })
        .collect();

    let mut dates = Vec::new();
    for result in reader.records() {
        let record = result?;
        dates.push(parse_table_date(record.get(0).unwrap_or_default())?);
        for (idx, column) in columns.iter_mut().enumerate() {
            column.values.push(parse_score(record.get(idx + 1), path)?);
        }
    }

    Ok(TrendSeries { dates, columns })
}

pub fn write_trend_table(path: &Path, series: &TrendSeries) -> Result<(), AppError> {
    write_atomically(path, |tmp| {
        let mut writer = csv::Writer::from_path(tmp)?;

        let mut header = vec!["date".to_string()];
        header.extend(series.keywords());
        writer.write_record(&header)?;

        for (idx, date) in series.dates.iter().enumerate() {
            let mut record = vec![date_key(*date)];
            for column in &series.columns {
                record.push(column.values.get(idx).copied().unwrap_or(0).to_string());
            }
            writer.write_record(&record)?;
        }
        writer.flush().map_err(|e| AppError::io(tmp, e))
    })
}

/// Write via a sibling temp file, then rename over the target path.
fn write_atomically(
    path: &Path,
    write: impl FnOnce(&Path) -> Result<(), AppError>,
) -> Result<(), AppError> {
    let tmp = path.with_extension("csv.tmp");
    write(&tmp)?;
    fs::rename(&tmp, path).map_err(|e| AppError::io(path, e))
}

pub(crate) fn parse_table_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| AppError::invalid(format!("invalid table date '{raw}': {e}")))
}

fn parse_score(raw: Option<&str>, path: &Path) -> Result<u32, AppError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(0);
    }
    let score = raw.parse::<u32>().map_err(|e| {
        AppError::invalid(format!(
            "invalid interest score '{raw}' in '{}': {e}",
            path.display()
        ))
    })?;
    Ok(score.min(100))
}
