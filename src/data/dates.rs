//! Calendar date-range generation.
//!
//! The range is half-open: `[start, end)`. The upstream daily reports publish
//! one file per calendar day, and a run processes exactly `end - start` days,
//! never including `end` itself.

use chrono::NaiveDate;

use crate::domain::{DATE_FORMAT, date_key};
use crate::error::AppError;

/// Generate the ordered sequence of dates in `[start, end)`.
///
/// `start` is textual in the fixed `MM-DD-YYYY` format; this function owns
/// format validation for the whole pipeline. `start == end` yields an empty
/// sequence.
pub fn generate(start: &str, end: NaiveDate) -> Result<Vec<NaiveDate>, AppError> {
    let trimmed = start.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid("start date is empty"));
    }

    let start = NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|e| {
        AppError::invalid(format!(
            "start date '{trimmed}' does not match {DATE_FORMAT}: {e}"
        ))
    })?;

    if start > end {
        return Err(AppError::invalid(format!(
            "start {start} is after end {end}"
        )));
    }

    Ok(start.iter_days().take_while(|d| *d < end).collect())
}

/// Same sequence, formatted as fixed-width cache keys.
pub fn generate_keys(start: &str, end: NaiveDate) -> Result<Vec<String>, AppError> {
    Ok(generate(start, end)?.into_iter().map(date_key).collect())
}
