//! Trend-anchored merge of case and trend data.
//!
//! Trend data is denser and more regular than the sparse daily case
//! snapshots, so the trend date axis is authoritative for charting: every
//! trend date is kept, and case values without a matching date fill to 0
//! (the region label fills to the series region by construction).

use crate::domain::{CaseSeries, MergedRow, MergedSeries, TrendSeries};

/// Left-join `cases` onto the trend date axis.
pub fn merge(trends: &TrendSeries, cases: &CaseSeries) -> MergedSeries {
    let rows = trends
        .dates
        .iter()
        .enumerate()
        .map(|(idx, &date)| {
            let interest = trends
                .columns
                .iter()
                .map(|c| c.values.get(idx).copied().unwrap_or(0))
                .collect();

            let (confirmed, deaths, recovered) = match cases.record_on(date) {
                Some(r) => (r.confirmed, r.deaths, r.recovered),
                None => (0, 0, 0),
            };

            MergedRow {
                date,
                interest,
                confirmed,
                deaths,
                recovered,
            }
        })
        .collect();

    MergedSeries {
        region: cases.region,
        keywords: trends.keywords(),
        rows,
    }
}
