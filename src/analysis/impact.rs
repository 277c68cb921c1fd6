//! Long-term impact filter.
//!
//! Pandemic-driven demand items show a long right tail (rare baseline
//! interest, explosive peak) and negligible pre-pandemic search volume. Both
//! conditions together exclude items with innate seasonal spikes unrelated to
//! the pandemic.

use tracing::debug;

use crate::domain::{TrendColumn, TrendSeries, pandemic_onset};
use crate::error::AppError;
use crate::math::skewness;

/// Full-series skewness must exceed this for a keyword to qualify.
pub const SKEWNESS_THRESHOLD: f64 = 4.0;

/// Pre-onset maximum must stay below this for a keyword to qualify.
pub const PRE_ONSET_MAX_THRESHOLD: u32 = 50;

/// Identify keywords whose trend shape indicates pandemic-driven demand.
///
/// Fails with `EmptyInput` when the table is absent/empty. Columns with an
/// undefined skewness (too few points, flat series) or with no pre-onset
/// dates at all never qualify: the latter cannot demonstrate negligible
/// pre-pandemic volume.
pub fn select_impacted(trends: &TrendSeries) -> Result<Vec<String>, AppError> {
    if trends.is_empty() {
        return Err(AppError::empty("trend table is empty"));
    }

    let mut impacted = Vec::new();
    for column in &trends.columns {
        let values: Vec<f64> = column.values.iter().map(|v| f64::from(*v)).collect();
        let Some(skew) = skewness(&values) else {
            continue;
        };
        let Some(pre_max) = pre_onset_max(trends, column) else {
            continue;
        };

        debug!(keyword = %column.keyword, skew, pre_max, "impact filter");
        if skew > SKEWNESS_THRESHOLD && pre_max < PRE_ONSET_MAX_THRESHOLD {
            impacted.push(column.keyword.clone());
        }
    }

    Ok(impacted)
}

/// Maximum score over dates strictly before the pandemic onset.
fn pre_onset_max(trends: &TrendSeries, column: &TrendColumn) -> Option<u32> {
    trends
        .dates
        .iter()
        .zip(&column.values)
        .filter(|(date, _)| **date < pandemic_onset())
        .map(|(_, value)| *value)
        .max()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::TrendColumn;

    /// Weekly series spanning 2019 into 2020 with the given column values.
    fn weekly_table(columns: Vec<(&str, Vec<u32>)>, len: usize) -> TrendSeries {
        let start = NaiveDate::from_ymd_opt(2019, 1, 6).unwrap();
        let dates = (0..len)
            .map(|w| start + chrono::Duration::weeks(w as i64))
            .collect();
        TrendSeries {
            dates,
            columns: columns
                .into_iter()
                .map(|(keyword, values)| TrendColumn {
                    keyword: keyword.to_string(),
                    values,
                })
                .collect(),
        }
    }

    #[test]
    fn quiet_then_spike_column_is_impacted() {
        // Zero interest all of 2019, one huge spike in early 2020.
        let mut values = vec![0; 60];
        values[55] = 100;
        let table = weekly_table(vec![("mask", values)], 60);

        let impacted = select_impacted(&table).unwrap();
        assert_eq!(impacted, vec!["mask".to_string()]);
    }

    #[test]
    fn uniformly_high_column_is_not_impacted() {
        // Steady high interest throughout: no right tail, high pre-onset max.
        let values = vec![80; 60];
        let table = weekly_table(vec![("powdered milk", values)], 60);

        let impacted = select_impacted(&table).unwrap();
        assert!(impacted.is_empty());
    }

    #[test]
    fn seasonal_pre_onset_peak_disqualifies_even_with_skew() {
        // Mostly quiet but with one strong pre-2020 seasonal spike: the
        // skewness condition alone would pass, the pre-onset max must veto.
        let mut values = vec![0; 60];
        values[10] = 90; // 2019 spike
        values[55] = 100;
        let table = weekly_table(vec![("thermometers", values)], 60);

        let impacted = select_impacted(&table).unwrap();
        assert!(impacted.is_empty());
    }

    #[test]
    fn table_without_pre_onset_dates_selects_nothing() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 22).unwrap();
        let dates: Vec<NaiveDate> = (0..40).map(|d| start + chrono::Duration::days(d)).collect();
        let mut values = vec![0; 40];
        values[35] = 100;
        let table = TrendSeries {
            dates,
            columns: vec![TrendColumn {
                keyword: "mask".to_string(),
                values,
            }],
        };

        let impacted = select_impacted(&table).unwrap();
        assert!(impacted.is_empty());
    }

    #[test]
    fn empty_table_is_empty_input() {
        let err = select_impacted(&TrendSeries::default()).unwrap_err();
        assert!(matches!(err, AppError::EmptyInput(_)));
    }
}
