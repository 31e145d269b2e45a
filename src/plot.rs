//! Figure generation using plotters (SVG output)
//!
//! Uses the SVG backend to avoid system font dependencies.

use crate::colvar::ColvarTable;
use crate::error::{Result, TramdError};
use crate::report::{cumulative_histogram, cv_ranges, NormalFit};
use plotters::prelude::*;
use plotters_svg::SVGBackend;
use std::fs;
use std::path::{Path, PathBuf};

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

const SIZE: (u32, u32) = (800, 500);
const BOOTSTRAP_BINS: usize = 50;

fn plot_error(path: &Path, e: Box<dyn std::error::Error>) -> TramdError {
    TramdError::Plot(format!("{}: {}", path.display(), e))
}

/// Widen a collapsed range so plotters gets a non-empty axis
fn padded(min: f64, max: f64) -> (f64, f64) {
    if min.is_finite() && max.is_finite() && max > min {
        (min, max)
    } else if min.is_finite() {
        (min - 0.5, min + 0.5)
    } else {
        (0.0, 1.0)
    }
}

/// Step outline with the change halfway between neighbouring x positions
fn mid_steps(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(2 * x.len());
    for i in 0..x.len().min(y.len()) {
        let left = if i == 0 { x[0] } else { (x[i - 1] + x[i]) / 2.0 };
        let right = if i + 1 == x.len() {
            x[i]
        } else {
            (x[i] + x[i + 1]) / 2.0
        };
        points.push((left, y[i]));
        points.push((right, y[i]));
    }
    points
}

/// Cumulative histogram of dissociation times (replicas dissociated vs time)
pub fn plot_cumulative_histogram(path: &Path, times: &[f64]) -> Result<()> {
    draw_cumulative_histogram(path, times).map_err(|e| plot_error(path, e))
}

fn draw_cumulative_histogram(path: &Path, times: &[f64]) -> DrawResult {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    if times.is_empty() {
        root.draw(&Text::new(
            "No dissociation times",
            (400, 250),
            ("sans-serif", 20).into_font().color(&BLACK),
        ))?;
        root.present()?;
        return Ok(());
    }

    let hist = cumulative_histogram(times);
    let counts: Vec<f64> = hist.counts.iter().map(|&c| c as f64).collect();
    let (x_min, x_max) = padded(
        hist.x.first().copied().unwrap_or(0.0),
        hist.x.last().copied().unwrap_or(1.0),
    );

    let mut chart = ChartBuilder::on(&root)
        .caption("Dissociation times", ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, 0f64..(times.len() as f64 * 1.05))?;

    chart
        .configure_mesh()
        .x_desc("Dissociation Time [ns]")
        .y_desc("N_trj")
        .draw()?;

    chart.draw_series(LineSeries::new(mid_steps(&hist.x, &counts), &BLUE))?;

    root.present()?;
    Ok(())
}

/// Density histogram of bootstrapped residence times with the fitted normal
pub fn plot_bootstrap_distribution(path: &Path, residence_times: &[f64], fit: &NormalFit) -> Result<()> {
    draw_bootstrap_distribution(path, residence_times, fit).map_err(|e| plot_error(path, e))
}

fn draw_bootstrap_distribution(path: &Path, values: &[f64], fit: &NormalFit) -> DrawResult {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    if values.is_empty() {
        root.draw(&Text::new(
            "No bootstrap samples",
            (400, 250),
            ("sans-serif", 20).into_font().color(&BLACK),
        ))?;
        root.present()?;
        return Ok(());
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = padded(min, max);
    let bin_width = (hi - lo) / BOOTSTRAP_BINS as f64;

    let mut bins = vec![0u64; BOOTSTRAP_BINS];
    for &v in values {
        let bin = (((v - lo) / bin_width) as usize).min(BOOTSTRAP_BINS - 1);
        bins[bin] += 1;
    }
    let norm = values.len() as f64 * bin_width;
    let density: Vec<f64> = bins.iter().map(|&c| c as f64 / norm).collect();

    let curve: Vec<(f64, f64)> = (0..=200)
        .map(|i| {
            let x = lo + (hi - lo) * i as f64 / 200.0;
            (x, fit.pdf(x))
        })
        .filter(|(_, y)| y.is_finite())
        .collect();

    let y_max = density
        .iter()
        .chain(curve.iter().map(|(_, y)| y))
        .copied()
        .fold(0.0, f64::max)
        .max(f64::EPSILON);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Residence time {:.3} ± {:.3} ns", fit.mean, fit.std),
            ("sans-serif", 20),
        )
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(lo..hi, 0f64..y_max * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Effective residence time [ns]")
        .y_desc("Density")
        .draw()?;

    chart.draw_series(density.iter().enumerate().map(|(i, &d)| {
        let x0 = lo + i as f64 * bin_width;
        Rectangle::new([(x0, 0.0), (x0 + bin_width, d)], BLUE.mix(0.5).filled())
    }))?;

    chart.draw_series(LineSeries::new(curve, RED.stroke_width(2)))?;

    root.present()?;
    Ok(())
}

/// One plot per CV and replica at `out_dir/<cv>/sim<i>.svg`
///
/// All plots of a CV share the y-limits spanning every table. Returns the
/// written paths.
pub fn plot_cv_timeseries(tables: &[ColvarTable], out_dir: &Path) -> Result<Vec<PathBuf>> {
    let ranges = cv_ranges(tables);
    let mut written = Vec::new();

    for name in ranges.keys() {
        let dir = out_dir.join(name);
        fs::create_dir_all(&dir).map_err(|e| TramdError::io(&dir, e))?;
    }

    for (i, table) in tables.iter().enumerate() {
        let Some(time) = table.time() else {
            tracing::warn!(table = i, "COLVAR table without time column, skipping plots");
            continue;
        };
        let (t_min, t_max) = padded(
            time.first().copied().unwrap_or(0.0),
            time.last().copied().unwrap_or(1.0),
        );

        for name in table.cv_names() {
            let (Some(values), Some(&(y_min, y_max))) = (table.column(name), ranges.get(name)) else {
                continue;
            };
            let path = out_dir.join(name).join(format!("sim{}.svg", i));
            draw_cv(&path, name, time, values, (t_min, t_max), padded(y_min, y_max))
                .map_err(|e| plot_error(&path, e))?;
            written.push(path);
        }
    }

    tracing::info!("Wrote {} CV plots to {}", written.len(), out_dir.display());
    Ok(written)
}

fn draw_cv(
    path: &Path,
    name: &str,
    time: &[f64],
    values: &[f64],
    x_range: (f64, f64),
    y_range: (f64, f64),
) -> DrawResult {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(name, ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)?;

    chart.configure_mesh().x_desc("time").y_desc(name).draw()?;

    chart.draw_series(LineSeries::new(
        time.iter().copied().zip(values.iter().copied()),
        &BLUE,
    ))?;

    root.present()?;
    Ok(())
}
