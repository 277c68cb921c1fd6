//! Chart rendering (mechanical I/O).
//!
//! Consumes a merged, date-aligned table plus the highlight set and writes
//! PNG artifacts. No statistics live here; everything is computed upstream.
//!
//! The crate builds plotters without a font backend, so the figures carry no
//! captions or tick labels — only mesh lines and the series themselves. The
//! file name encodes region and keyword, and the run summary on stdout
//! carries the numbers.

use std::path::Path;

use plotters::prelude::*;

use crate::domain::{CaseSeries, MergedSeries, Region};
use crate::error::AppError;

const FIGURE_SIZE: (u32, u32) = (1024, 640);

/// File name for one keyword's figure.
pub fn keyword_figure_name(region: Region, keyword: &str) -> String {
    format!(
        "GoogleTrend_{}_{}.png",
        region.code(),
        keyword.replace(' ', "_")
    )
}

/// Render one keyword's search interest against confirmed cases.
///
/// Interest plots on the primary axis (0..100), confirmed counts on a
/// secondary axis. Highlighted (representative) keywords draw in red.
pub fn render_keyword_chart(
    path: &Path,
    merged: &MergedSeries,
    keyword: &str,
    highlight: bool,
) -> Result<(), AppError> {
    let Some(column) = merged.keywords.iter().position(|k| k == keyword) else {
        return Err(AppError::invalid(format!(
            "keyword '{keyword}' not present in merged series"
        )));
    };
    if merged.rows.is_empty() {
        return Err(AppError::empty("merged series has no rows"));
    }

    let n = merged.rows.len();
    let max_confirmed = merged
        .rows
        .iter()
        .map(|r| r.confirmed)
        .max()
        .unwrap_or(0)
        .max(1);

    let root = BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(0..n, 0u32..100u32)
        .map_err(render_err)?
        .set_secondary_coord(0..n, 0u64..max_confirmed);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .draw()
        .map_err(render_err)?;

    let interest_color = if highlight { RED } else { BLUE };
    chart
        .draw_series(LineSeries::new(
            merged
                .rows
                .iter()
                .enumerate()
                .map(|(idx, row)| (idx, row.interest.get(column).copied().unwrap_or(0))),
            &interest_color,
        ))
        .map_err(render_err)?;

    chart
        .draw_secondary_series(LineSeries::new(
            merged
                .rows
                .iter()
                .enumerate()
                .map(|(idx, row)| (idx, row.confirmed)),
            &BLACK,
        ))
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

/// Render the two regions' confirmed-case curves on twin axes.
///
/// The two regions sit at very different absolute scales, so each gets its
/// own y-axis: Taiwan (blue) on the primary, US (red) on the secondary.
pub fn render_cases_chart(
    path: &Path,
    taiwan: &CaseSeries,
    us: &CaseSeries,
) -> Result<(), AppError> {
    if taiwan.records.is_empty() || us.records.is_empty() {
        return Err(AppError::empty("case series has no records"));
    }

    let n = taiwan.records.len().max(us.records.len());
    let max_tw = taiwan
        .records
        .iter()
        .map(|r| r.confirmed)
        .max()
        .unwrap_or(0)
        .max(1);
    let max_us = us.records.iter().map(|r| r.confirmed).max().unwrap_or(0).max(1);

    let root = BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(0..n, 0u64..max_tw)
        .map_err(render_err)?
        .set_secondary_coord(0..n, 0u64..max_us);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(LineSeries::new(
            taiwan
                .records
                .iter()
                .enumerate()
                .map(|(idx, r)| (idx, r.confirmed)),
            &BLUE,
        ))
        .map_err(render_err)?;

    chart
        .draw_secondary_series(LineSeries::new(
            us.records
                .iter()
                .enumerate()
                .map(|(idx, r)| (idx, r.confirmed)),
            &RED,
        ))
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

fn render_err<E: std::fmt::Display>(err: E) -> AppError {
    AppError::Render(err.to_string())
}
