//! Sorted, immutable sets of dissociation times

use crate::error::{Result, TramdError};
use serde::Serialize;
use std::ops::Deref;

/// Dissociation times in nanoseconds, one per replica, sorted ascending
///
/// Construction sorts the values and rejects negative or non-finite entries.
/// There is no way to mutate the set afterwards; consumers borrow it as a
/// slice through `Deref`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DissociationTimes(Vec<f64>);

impl DissociationTimes {
    /// Build a sorted set from raw times
    pub fn new(mut times: Vec<f64>) -> Result<Self> {
        if let Some(bad) = times.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(TramdError::invalid(format!(
                "dissociation times must be finite and non-negative, got {}",
                bad
            )));
        }
        times.sort_by(f64::total_cmp);
        Ok(Self(times))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Smallest time, None for an empty set
    pub fn min(&self) -> Option<f64> {
        self.0.first().copied()
    }

    /// Largest time, None for an empty set
    pub fn max(&self) -> Option<f64> {
        self.0.last().copied()
    }
}

impl Deref for DissociationTimes {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl AsRef<[f64]> for DissociationTimes {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}
