//! Plain-text run summaries.
//!
//! Formatting only — every number here was computed by the pipeline. The
//! output goes straight to stdout, so it favors alignment and short labels
//! over machine readability (the CSV exports cover that).

use crate::app::pipeline::{RegionRun, RunOutput};
use crate::domain::{DATE_FORMAT, PipelineConfig, TrendSeries};

/// Format the full run summary.
pub fn format_run_summary(run: &RunOutput, config: &PipelineConfig) -> String {
    let mut out = String::new();

    out.push_str("=== demand trends run ===\n");
    out.push_str(&format!(
        "window:           {} .. {} (exclusive)\n",
        config.start,
        config.end.format(DATE_FORMAT)
    ));
    out.push_str(&format!(
        "dates processed:  {} ({} skipped)\n",
        run.dates.len() - run.cases.skipped.len(),
        run.cases.skipped.len()
    ));
    if !run.cases.skipped.is_empty() {
        let listed: Vec<String> = run
            .cases
            .skipped
            .iter()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .collect();
        out.push_str(&format!("skipped dates:    {}\n", listed.join(", ")));
    }

    for region_run in &run.regions {
        out.push('\n');
        out.push_str(&format_region(region_run));
    }

    out
}

fn format_region(run: &RegionRun) -> String {
    let mut out = String::new();

    out.push_str(&format!("--- {} ---\n", run.region.label()));
    out.push_str(&format!(
        "impacted:         {}\n",
        join_or_none(&run.impacted)
    ));
    out.push_str(&format!(
        "representative:   {}\n",
        join_or_none(&run.selection.representative)
    ));

    if !run.selection.peaks.is_empty() {
        out.push_str("peak dates:\n");
        for (keyword, peak) in &run.selection.peaks {
            out.push_str(&format!("  {:<16}{}\n", keyword, peak.format(DATE_FORMAT)));
        }
    }

    match &run.awareness {
        Some(report) => {
            out.push_str(&format!(
                "first confirmed:  {}\n",
                report.first_confirmed_date.format(DATE_FORMAT)
            ));
            out.push_str(&format!(
                "mean lag:         {} days (awareness around {})\n",
                report.mean_lag_days,
                report.mean_awareness_date.format(DATE_FORMAT)
            ));
        }
        None => out.push_str("first confirmed:  none in window\n"),
    }

    out
}

/// Format an assembled case table (the `cases` subcommand's output).
pub fn format_case_table(cases: &crate::data::cases::AssembledCases) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} rows ({} dates skipped)\n",
        cases.table.rows.len(),
        cases.skipped.len()
    ));

    // Latest snapshot per region.
    for region in crate::domain::Region::ALL {
        let series = cases.table.series_for(region);
        match series.records.last() {
            Some(last) => out.push_str(&format!(
                "  {:<8}{}  confirmed {:>9}  deaths {:>7}  recovered {:>9}\n",
                region.label(),
                last.date.format(DATE_FORMAT),
                last.confirmed,
                last.deaths,
                last.recovered
            )),
            None => out.push_str(&format!("  {:<8}(no rows)\n", region.label())),
        }
    }

    out
}

/// Format a fetched trend table (the `trends` subcommand's output).
pub fn format_trend_table(trends: &TrendSeries) -> String {
    let mut out = String::new();

    let keywords = trends.keywords();
    out.push_str(&format!(
        "{} dates, {} keywords: {}\n",
        trends.dates.len(),
        keywords.len(),
        join_or_none(&keywords)
    ));

    for column in &trends.columns {
        let max = column.values.iter().copied().max().unwrap_or(0);
        let mean = if column.values.is_empty() {
            0
        } else {
            column.values.iter().map(|&v| u64::from(v)).sum::<u64>()
                / column.values.len() as u64
        };
        out.push_str(&format!(
            "  {:<16}max {:>3}  mean {:>3}\n",
            column.keyword, max, mean
        ));
    }

    out
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::TrendColumn;

    #[test]
    fn empty_lists_render_as_none() {
        assert_eq!(join_or_none(&[]), "(none)");
        assert_eq!(
            join_or_none(&["mask".to_string(), "sanitizer".to_string()]),
            "mask, sanitizer"
        );
    }

    #[test]
    fn trend_table_summary_lists_per_keyword_stats() {
        let trends = TrendSeries {
            dates: vec![
                NaiveDate::from_ymd_opt(2020, 1, 22).unwrap(),
                NaiveDate::from_ymd_opt(2020, 1, 23).unwrap(),
            ],
            columns: vec![TrendColumn {
                keyword: "mask".to_string(),
                values: vec![10, 30],
            }],
        };

        let text = format_trend_table(&trends);
        assert!(text.contains("2 dates, 1 keywords: mask"));
        assert!(text.contains("max  30"));
        assert!(text.contains("mean  20"));
    }
}
