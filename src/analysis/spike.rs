//! Short-term spike filter.
//!
//! Refines the impacted set to keywords that were quiet more than two weeks
//! before their peak and then surged to near-saturation.

use chrono::{Duration, NaiveDate};

use crate::domain::{PeakDateMap, TrendColumn, TrendSeries};
use crate::error::AppError;

/// Days between the peak date and the comparison boundary.
pub const SPIKE_WINDOW_DAYS: i64 = 14;

/// Maximum score allowed strictly before the boundary.
pub const PAST_MAX_THRESHOLD: u32 = 30;

/// Minimum score required strictly after the boundary.
pub const CURRENT_MIN_THRESHOLD: u32 = 90;

/// Outcome of the spike filter.
#[derive(Debug, Clone)]
pub struct SpikeSelection {
    /// Keywords passing the past/current window comparison.
    pub representative: Vec<String>,
    /// Peak date for every evaluated keyword, selected or not — the caller
    /// needs peak dates for all impacted items to compute awareness lags.
    pub peaks: PeakDateMap,
}

/// Select representative keywords and collect peak dates.
///
/// Evaluates the impacted columns; when `impacted` is empty, evaluates every
/// column instead so the function is reusable standalone. When either side of
/// the 14-day boundary holds no dates (peak too close to the series edge),
/// the comparison is undefined and the keyword is not selected; its peak date
/// is still reported.
pub fn select_representative(
    trends: &TrendSeries,
    impacted: &[String],
) -> Result<SpikeSelection, AppError> {
    if trends.is_empty() {
        return Err(AppError::empty("trend table is empty"));
    }

    let evaluated: Vec<&TrendColumn> = if impacted.is_empty() {
        trends.columns.iter().collect()
    } else {
        trends
            .columns
            .iter()
            .filter(|c| impacted.contains(&c.keyword))
            .collect()
    };

    let mut representative = Vec::new();
    let mut peaks = PeakDateMap::new();

    for column in evaluated {
        let Some(peak_idx) = peak_index(&column.values) else {
            continue;
        };
        let Some(&peak_date) = trends.dates.get(peak_idx) else {
            continue;
        };
        peaks.insert(column.keyword.clone(), peak_date);

        let boundary = peak_date - Duration::days(SPIKE_WINDOW_DAYS);
        let past_max = window_max(trends, column, |date| date < boundary);
        let current_max = window_max(trends, column, |date| date > boundary);

        let (Some(past), Some(current)) = (past_max, current_max) else {
            continue;
        };
        if past < PAST_MAX_THRESHOLD && current > CURRENT_MIN_THRESHOLD {
            representative.push(column.keyword.clone());
        }
    }

    Ok(SpikeSelection {
        representative,
        peaks,
    })
}

/// Index of the maximum value, first occurrence on ties.
fn peak_index(values: &[u32]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (idx, &value) in values.iter().enumerate() {
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}

fn window_max(
    trends: &TrendSeries,
    column: &TrendColumn,
    keep: impl Fn(NaiveDate) -> bool,
) -> Option<u32> {
    trends
        .dates
        .iter()
        .zip(&column.values)
        .filter(|(date, _)| keep(**date))
        .map(|(_, value)| *value)
        .max()
}
