//! Awareness-lag report.
//!
//! How many days after the first confirmed case did public search interest
//! peak, averaged across keywords?

use chrono::{Duration, NaiveDate};

use crate::domain::{AwarenessReport, PeakDateMap};
use crate::error::AppError;

/// Build the awareness report for one region.
///
/// Per-keyword lag is `peak_date - first_confirmed_date` in whole days; a
/// keyword that peaked before the first confirmed case contributes a negative
/// lag and is not filtered out. Fails with `EmptyInput` for an empty peak
/// map — the guard is explicit rather than relying on a division fault.
pub fn build(
    first_confirmed_date: NaiveDate,
    peaks: &PeakDateMap,
) -> Result<AwarenessReport, AppError> {
    if peaks.is_empty() {
        return Err(AppError::empty("peak-date map is empty"));
    }

    let lag_sum: i64 = peaks
        .values()
        .map(|peak| (*peak - first_confirmed_date).num_days())
        .sum();

    // Euclidean division keeps the floor semantics for negative sums.
    let mean_lag_days = lag_sum.div_euclid(peaks.len() as i64);

    Ok(AwarenessReport {
        first_confirmed_date,
        mean_lag_days,
        mean_awareness_date: first_confirmed_date + Duration::days(mean_lag_days),
    })
}
