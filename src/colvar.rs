//! PLUMED COLVAR table reader
//!
//! A COLVAR file starts with a `#! FIELDS` header naming its columns,
//! followed by whitespace-separated numeric rows:
//!
//! ```text
//! #! FIELDS time r d1.x
//! #! SET min_d1.x -pi
//!  0.000000 0.512 1.2
//!  2.000000 0.530 1.3
//! ```

use crate::error::{Result, TramdError};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the time column
pub const TIME_FIELD: &str = "time";

/// A parsed COLVAR table, stored column-major
#[derive(Debug, Clone, PartialEq)]
pub struct ColvarTable {
    fields: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl ColvarTable {
    /// Load and parse a COLVAR file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| TramdError::io(path, e))?;
        Self::parse(&contents, path)
    }

    /// Parse COLVAR text; `origin` only labels errors
    pub fn parse(contents: &str, origin: &Path) -> Result<Self> {
        let mut fields: Option<Vec<String>> = None;
        let mut columns: Vec<Vec<f64>> = Vec::new();

        let ambiguous = |idx: usize, line: &str| TramdError::ParseAmbiguity {
            path: PathBuf::from(origin),
            line: idx + 1,
            content: line.to_string(),
        };

        for (idx, line) in contents.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(header) = trimmed.strip_prefix("#!") {
                let mut words = header.split_whitespace();
                if words.next() == Some("FIELDS") {
                    let names: Vec<String> = words.map(str::to_string).collect();
                    if names.is_empty() {
                        return Err(ambiguous(idx, line));
                    }
                    if fields.is_none() {
                        columns = vec![Vec::new(); names.len()];
                        fields = Some(names);
                    } else if fields.as_ref() != Some(&names) {
                        // PLUMED repeats the header on restart; it must agree
                        return Err(ambiguous(idx, line));
                    }
                }
                continue;
            }
            if trimmed.starts_with('#') {
                continue;
            }

            let Some(names) = &fields else {
                return Err(ambiguous(idx, line));
            };

            let values = trimmed
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| ambiguous(idx, line))?;
            if values.len() != names.len() {
                return Err(ambiguous(idx, line));
            }
            for (column, value) in columns.iter_mut().zip(values) {
                column.push(value);
            }
        }

        let fields = fields.ok_or_else(|| {
            TramdError::invalid(format!(
                "{} has no \"#! FIELDS\" header",
                origin.display()
            ))
        })?;

        Ok(Self { fields, columns })
    }

    /// Column names in file order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Every collective variable, i.e. every field except `time`
    pub fn cv_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .map(String::as_str)
            .filter(|name| *name != TIME_FIELD)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.fields
            .iter()
            .position(|f| f == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Time column, if present
    pub fn time(&self) -> Option<&[f64]> {
        self.column(TIME_FIELD)
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
