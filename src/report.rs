//! Summaries and plot-ready data for dissociation and bootstrap results

use crate::colvar::ColvarTable;
use crate::error::{Result, TramdError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Normal distribution fitted by the method of moments
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalFit {
    /// Location (sample mean)
    pub mean: f64,
    /// Scale (standard deviation, normalised by n)
    pub std: f64,
}

impl NormalFit {
    /// Fit location and scale to `values`
    pub fn from_samples(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(TramdError::invalid("cannot fit a distribution to no values"));
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Ok(Self {
            mean,
            std: variance.sqrt(),
        })
    }

    /// Probability density at `x`
    pub fn pdf(&self, x: f64) -> f64 {
        if self.std == 0.0 {
            return if x == self.mean { f64::INFINITY } else { 0.0 };
        }
        let z = (x - self.mean) / self.std;
        (-0.5 * z * z).exp() / (self.std * (2.0 * std::f64::consts::PI).sqrt())
    }
}

/// Step data of a cumulative histogram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativeHistogram {
    pub lower_limit: f64,
    pub bin_size: f64,
    /// Left edge positions, `lower + linspace(0, bin_size * bins, bins)`
    pub x: Vec<f64>,
    /// Number of replicas dissociated up to each bin
    pub counts: Vec<u64>,
}

/// Cumulative histogram of dissociation times with `max(n/2, 1)` bins
///
/// The histogram range is widened on both sides by half a bin spacing so the
/// extreme values fall inside the outer bins.
pub fn cumulative_histogram(times: &[f64]) -> CumulativeHistogram {
    let numbins = (times.len() / 2).max(1);
    if times.is_empty() {
        return CumulativeHistogram {
            lower_limit: 0.0,
            bin_size: 1.0 / numbins as f64,
            x: linspace(0.0, 1.0, numbins),
            counts: vec![0; numbins],
        };
    }

    let min = times.iter().copied().fold(f64::INFINITY, f64::min);
    let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let pad = if numbins > 1 {
        (max - min) / (2.0 * (numbins as f64 - 1.0))
    } else {
        0.0
    };
    let (mut lower, mut upper) = (min - pad, max + pad);
    if upper <= lower {
        lower -= 0.5;
        upper += 0.5;
    }
    let bin_size = (upper - lower) / numbins as f64;

    let mut counts = vec![0u64; numbins];
    for &t in times {
        let bin = (((t - lower) / bin_size) as usize).min(numbins - 1);
        counts[bin] += 1;
    }
    let mut running = 0;
    for c in counts.iter_mut() {
        running += *c;
        *c = running;
    }

    CumulativeHistogram {
        lower_limit: lower,
        bin_size,
        x: linspace(lower, lower + bin_size * numbins as f64, numbins),
        counts,
    }
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Global `(min, max)` of every CV across all tables, for shared axis limits
pub fn cv_ranges(tables: &[ColvarTable]) -> BTreeMap<String, (f64, f64)> {
    let mut ranges: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for table in tables {
        for name in table.cv_names() {
            let Some(column) = table.column(name) else {
                continue;
            };
            let entry = ranges
                .entry(name.to_string())
                .or_insert((f64::INFINITY, f64::NEG_INFINITY));
            for &v in column {
                entry.0 = entry.0.min(v);
                entry.1 = entry.1.max(v);
            }
        }
    }
    ranges
}

/// Summary of one residence-time analysis
#[derive(Debug, Clone, Serialize)]
pub struct ResidenceSummary {
    pub replicas: usize,
    pub min_time: f64,
    pub max_time: f64,
    pub median_time: f64,
    pub n_samples: usize,
    pub sample_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Effective residence time (ns)
    pub residence_time: f64,
    /// Uncertainty of the residence time (ns)
    pub residence_time_std: f64,
}

impl ResidenceSummary {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Replicas:                 {}", self.replicas);
        let _ = writeln!(
            out,
            "Dissociation times [ns]:  min {:.3}  median {:.3}  max {:.3}",
            self.min_time, self.median_time, self.max_time
        );
        let _ = writeln!(
            out,
            "Bootstrap:                {} samples of {} replicas",
            self.n_samples, self.sample_size
        );
        if let Some(seed) = self.seed {
            let _ = writeln!(out, "Seed:                     {}", seed);
        }
        let _ = writeln!(
            out,
            "Effective residence time: {:.3} ± {:.3} ns",
            self.residence_time, self.residence_time_std
        );
        out
    }
}

/// Format like C `%.18e`: `1.742000000000000082e+00`
pub fn format_scientific(value: f64) -> String {
    let raw = format!("{:.18e}", value);
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        // inf / NaN carry no exponent
        None => raw,
    }
}

/// Write one value per line in scientific notation
pub fn write_column(path: &Path, values: &[f64]) -> Result<()> {
    let file = File::create(path).map_err(|e| TramdError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for &v in values {
        writeln!(writer, "{}", format_scientific(v)).map_err(|e| TramdError::io(path, e))?;
    }
    writer.flush().map_err(|e| TramdError::io(path, e))?;
    tracing::debug!(path = %path.display(), rows = values.len(), "wrote column");
    Ok(())
}
