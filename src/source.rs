//! Dissociation times from τRAMD `.log` / `.out` files
//!
//! GROMACS-RAMD prints a line like
//!
//! ```text
//! ==== RAMD ==== GROMACS will be stopped after 871000 steps.
//! ```
//!
//! once the ligand has left the pocket. The step count times the MD
//! timestep (ns) is the dissociation time of that replica.

use crate::error::{Result, TramdError};
use crate::times::DissociationTimes;
use regex::Regex;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Marker printed by GROMACS-RAMD when a replica dissociates
pub const RAMD_STOP_MARKER: &str = "==== RAMD ==== GROMACS will be stopped";

/// Default MD timestep in ns (2 fs)
pub const DEFAULT_TIMESTEP: f64 = 2e-6;

/// Input files, resolved by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    SinglePath(PathBuf),
    PathList(Vec<PathBuf>),
}

impl Source {
    /// Build a source from a list of paths (one path collapses to `SinglePath`)
    pub fn from_paths(mut paths: Vec<PathBuf>) -> Self {
        if paths.len() == 1 {
            Source::SinglePath(paths.remove(0))
        } else {
            Source::PathList(paths)
        }
    }

    /// All paths in scan order
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            Source::SinglePath(p) => std::slice::from_ref(p),
            Source::PathList(ps) => ps,
        }
    }
}

/// Which kind of RAMD output is being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// One `.log` file per replica; times rounded to 3 decimals
    Log,
    /// A single `.out` file collecting all replicas; raw precision
    Out,
}

impl FromStr for ReadMode {
    type Err = TramdError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "log" => Ok(ReadMode::Log),
            "out" => Ok(ReadMode::Out),
            other => Err(TramdError::invalid(format!(
                "mode must be \"log\" or \"out\", got {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for ReadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadMode::Log => f.write_str("log"),
            ReadMode::Out => f.write_str("out"),
        }
    }
}

/// Outcome of matching a single line against the marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerLine {
    /// Line does not start with the marker
    NoMatch,
    /// Marker followed by a step count
    Steps(u64),
    /// Marker present but no usable integer after it
    MissingSteps,
}

/// Line matcher for the RAMD stop marker
#[derive(Debug, Clone)]
pub struct MarkerScanner {
    marker: Regex,
    integer: Regex,
}

impl MarkerScanner {
    /// Scanner for lines starting with the literal `marker` text
    pub fn new(marker: &str) -> Result<Self> {
        if marker.is_empty() {
            return Err(TramdError::invalid("marker must not be empty"));
        }
        let marker = Regex::new(&format!("^{}", regex::escape(marker)))
            .map_err(|e| TramdError::invalid(format!("unusable marker: {}", e)))?;
        let integer = Regex::new(r"[0-9]+")
            .map_err(|e| TramdError::invalid(format!("integer pattern: {}", e)))?;
        Ok(Self { marker, integer })
    }

    /// Scanner for the GROMACS-RAMD stop marker
    pub fn ramd() -> Result<Self> {
        Self::new(RAMD_STOP_MARKER)
    }

    /// Classify one line
    pub fn parse_line(&self, line: &str) -> MarkerLine {
        let Some(m) = self.marker.find(line) else {
            return MarkerLine::NoMatch;
        };
        match self.integer.find(&line[m.end()..]) {
            Some(token) => match token.as_str().parse::<u64>() {
                Ok(steps) => MarkerLine::Steps(steps),
                Err(_) => MarkerLine::MissingSteps,
            },
            None => MarkerLine::MissingSteps,
        }
    }

    /// Step counts of every marker line in `path`, in file order
    pub fn scan_file(&self, path: &Path) -> Result<Vec<u64>> {
        let file = File::open(path).map_err(|e| TramdError::io(path, e))?;
        let reader = BufReader::new(file);
        let mut steps = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| TramdError::io(path, e))?;
            match self.parse_line(&line) {
                MarkerLine::NoMatch => {}
                MarkerLine::Steps(n) => steps.push(n),
                MarkerLine::MissingSteps => {
                    return Err(TramdError::ParseAmbiguity {
                        path: path.to_path_buf(),
                        line: idx + 1,
                        content: line,
                    });
                }
            }
        }

        tracing::debug!(path = %path.display(), markers = steps.len(), "scanned RAMD output");
        Ok(steps)
    }
}

/// Round to 3 decimal places
///
/// Rounds the exact binary value with ties to even, so `1.00025` (stored
/// slightly below the decimal tie) becomes `1.0`.
fn round3(x: f64) -> Result<f64> {
    format!("{:.3}", x)
        .parse()
        .map_err(|e| TramdError::invalid(format!("cannot round {} to 3 decimals: {}", x, e)))
}

/// Read dissociation times with the default RAMD marker
///
/// `Log` mode scans every path and rounds each time to 3 decimals. `Out` mode
/// expects exactly one path and keeps the raw product `steps * timestep`.
///
/// # Errors
///
/// * `InvalidArgument` for a non-positive timestep or an `Out` source that
///   does not name exactly one file
/// * `Io` if any file is missing or unreadable
/// * `ParseAmbiguity` if a marker line carries no step count
pub fn read_dissociation_times(
    source: &Source,
    mode: ReadMode,
    timestep: f64,
) -> Result<DissociationTimes> {
    read_dissociation_times_with(source, mode, timestep, &MarkerScanner::ramd()?)
}

/// Same as [`read_dissociation_times`] with a caller-supplied marker scanner
pub fn read_dissociation_times_with(
    source: &Source,
    mode: ReadMode,
    timestep: f64,
    scanner: &MarkerScanner,
) -> Result<DissociationTimes> {
    if !timestep.is_finite() || timestep <= 0.0 {
        return Err(TramdError::invalid(format!(
            "timestep must be a positive number of ns, got {}",
            timestep
        )));
    }

    let paths = source.paths();
    let mut times = Vec::new();

    match mode {
        ReadMode::Log => {
            for path in paths {
                for steps in scanner.scan_file(path)? {
                    times.push(round3(steps as f64 * timestep)?);
                }
            }
        }
        ReadMode::Out => {
            let [path] = paths else {
                return Err(TramdError::invalid(format!(
                    "\"out\" mode reads exactly one file, got {}",
                    paths.len()
                )));
            };
            times.extend(
                scanner
                    .scan_file(path)?
                    .into_iter()
                    .map(|steps| steps as f64 * timestep),
            );
        }
    }

    tracing::info!(
        "Found {} dissociation times in {} file{}.",
        times.len(),
        paths.len(),
        if paths.len() == 1 { "" } else { "s" }
    );

    DissociationTimes::new(times)
}
