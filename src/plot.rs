//! Plotting sink for simulation results
//!
//! Renders the comparison arrays produced by the analysis stage to PNG files.
//! This module is a pure sink — arrays in, picture out — and is gated behind
//! the `plotting` feature so headless simulation runs don't carry a renderer.
//!
//! The condition axis of a figure is selected by name (`"nlvs"`,
//! `"n_peaks"`, `"knees"`, `"skews"`, `"asymmetry"`); unsupported selectors
//! fail rather than falling back to a generic label.

pub use plotters;

use std::collections::HashMap;
use std::path::Path;

use nalgebra::{DMatrix, DVector};
use plotters::prelude::*;

use crate::config::ConditionAxis;
use crate::statistics::{nan_mean, nan_sem};

mod palette;
use palette::SeriesPalette;

/// Error occurring while rendering a figure.
#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    /// The figure's configuration was invalid (e.g. an unknown axis selector)
    #[error(transparent)]
    Config(#[from] crate::error::Error),

    /// The backend failed while drawing
    #[error("Error drawing plot: {0}")]
    Draw(String),

    /// There was nothing to draw
    #[error("Cannot plot empty data")]
    Empty,
}

/// Result type for the plotting sink
pub type PlotResult = std::result::Result<(), PlotError>;

fn draw_err(e: impl std::fmt::Display) -> PlotError {
    PlotError::Draw(e.to_string())
}

const FIGURE_SIZE: (u32, u32) = (640, 480);
const CAPTION_FONT: (&str, u32) = ("sans-serif", 24);

/// Plots error distributions across condition groups, as central tendency
/// (NaN-masked mean) with standard-error bars.
///
/// `data` holds one condition per row; `x_axis` names the condition axis and
/// becomes the x-label.
///
/// # Errors
/// Fails on an unknown axis selector, empty input, or a backend error.
pub fn plot_errors(
    path: impl AsRef<Path>,
    data: &DMatrix<f64>,
    title: &str,
    x_axis: &str,
) -> PlotResult {
    let x_label = x_axis.parse::<ConditionAxis>()?.label();
    if data.nrows() == 0 {
        return Err(PlotError::Empty);
    }

    let stats: Vec<(f64, f64)> = data
        .row_iter()
        .map(|row| {
            let mean = nan_mean(row.iter().copied());
            let sem = nan_sem(row.iter().copied());
            (mean, if sem.is_nan() { 0.0 } else { sem })
        })
        .collect();

    let n_groups = stats.len() as f64;
    let y_lo = stats
        .iter()
        .filter(|(m, _)| !m.is_nan())
        .map(|(m, s)| m - s)
        .fold(f64::INFINITY, f64::min);
    let y_hi = stats
        .iter()
        .filter(|(m, _)| !m.is_nan())
        .map(|(m, s)| m + s)
        .fold(f64::NEG_INFINITY, f64::max);
    if !y_lo.is_finite() || !y_hi.is_finite() {
        return Err(PlotError::Empty);
    }
    let pad = 0.1 * (y_hi - y_lo).max(f64::MIN_POSITIVE);

    let root = BitMapBackend::new(path.as_ref(), FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, CAPTION_FONT.into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.5..n_groups + 0.5, y_lo - pad..y_hi + pad)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(x_label)
        .y_desc("Error")
        .x_labels(stats.len())
        .draw()
        .map_err(draw_err)?;

    let mut colors = SeriesPalette::default();
    let color = colors.next_color();
    chart
        .draw_series(
            stats
                .iter()
                .enumerate()
                .filter(|(_, (mean, _))| !mean.is_nan())
                .map(|(i, &(mean, sem))| {
                    let x = i as f64 + 1.0;
                    ErrorBar::new_vertical(x, mean - sem, mean, mean + sem, color.filled(), 10)
                }),
        )
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Plots a single vector of values as a one-dimensional scatter.
///
/// # Errors
/// Fails on empty input or a backend error.
pub fn plot_single_data(path: impl AsRef<Path>, data: &[f64], y_label: &str) -> PlotResult {
    if data.is_empty() {
        return Err(PlotError::Empty);
    }
    let y_hi = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let y_lo = data.iter().copied().fold(f64::INFINITY, f64::min).min(0.0);
    if !y_hi.is_finite() {
        return Err(PlotError::Empty);
    }

    let root = BitMapBackend::new(path.as_ref(), (200, 480)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .y_label_area_size(50)
        .build_cartesian_2d(0.5..1.5f64, y_lo..y_hi + 0.1 * y_hi.abs().max(1.0))
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_desc(y_label)
        .draw()
        .map_err(draw_err)?;

    let mut colors = SeriesPalette::default();
    let color = colors.next_color();
    chart
        .draw_series(
            data.iter()
                .filter(|v| !v.is_nan())
                .map(|&v| Circle::new((1.0, v), 4, color.filled())),
        )
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Plots one power spectrum as a line, in log10 power (and optionally log10
/// frequency).
///
/// # Errors
/// Fails on mismatched inputs or a backend error.
pub fn plot_spectrum(
    path: impl AsRef<Path>,
    freqs: &DVector<f64>,
    powers: &DVector<f64>,
    log_freqs: bool,
) -> PlotResult {
    if freqs.len() != powers.len() || freqs.is_empty() {
        return Err(PlotError::Empty);
    }

    let xs: Vec<f64> = freqs
        .iter()
        .map(|&f| if log_freqs { f.log10() } else { f })
        .collect();
    let ys: Vec<f64> = powers.iter().map(|&p| p.log10()).collect();

    let x_range = xs[0]..xs[xs.len() - 1];
    let y_lo = ys.iter().copied().fold(f64::INFINITY, f64::min);
    let y_hi = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let root = BitMapBackend::new(path.as_ref(), FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_lo..y_hi)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc(if log_freqs { "log10 Frequency" } else { "Frequency" })
        .y_desc("log10 Power")
        .draw()
        .map_err(draw_err)?;

    let mut colors = SeriesPalette::default();
    chart
        .draw_series(LineSeries::new(
            xs.into_iter().zip(ys),
            colors.next_color().stroke_width(2),
        ))
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}

/// Plots the `(condition, recovered peak count)` histogram produced by
/// [`count_peak_conditions`](crate::analysis::count_peak_conditions) as
/// grouped bars — one bar cluster per condition, one color per count.
///
/// # Errors
/// Fails on empty input or a backend error.
pub fn plot_peak_counts(
    path: impl AsRef<Path>,
    counter: &HashMap<(String, u32), usize>,
) -> PlotResult {
    if counter.is_empty() {
        return Err(PlotError::Empty);
    }

    let mut labels: Vec<&String> = counter.keys().map(|(label, _)| label).collect();
    labels.sort();
    labels.dedup();
    let mut counts: Vec<u32> = counter.keys().map(|(_, count)| *count).collect();
    counts.sort_unstable();
    counts.dedup();

    let max_occurrence = *counter.values().max().expect("counter is non-empty") as f64;
    let cluster = counts.len() as f64 + 1.0;
    let x_hi = labels.len() as f64 * cluster;

    let root = BitMapBackend::new(path.as_ref(), FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Recovered peak counts", CAPTION_FONT.into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..x_hi, 0.0..max_occurrence * 1.1)
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Condition")
        .y_desc("Occurrences")
        .draw()
        .map_err(draw_err)?;

    let mut colors = SeriesPalette::default();
    for (slot, &count) in counts.iter().enumerate() {
        let color = colors.next_color();
        chart
            .draw_series(labels.iter().enumerate().filter_map(|(li, label)| {
                let occurrences = *counter.get(&((*label).clone(), count))? as f64;
                let x0 = li as f64 * cluster + slot as f64;
                Some(Rectangle::new([(x0, 0.0), (x0 + 0.8, occurrences)], color.filled()))
            }))
            .map_err(draw_err)?
            .label(format!("{count} peaks"))
            .legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 8, y + 4)], color.filled()));
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    Ok(())
}
