//! Dissociation detection on distance time series

use crate::colvar::ColvarTable;
use crate::error::{Result, TramdError};
use crate::times::DissociationTimes;

/// Default name of the ligand-pocket distance column in COLVAR files
pub const DEFAULT_DISTANCE_FIELD: &str = "r";

/// Paired `(time, r)` samples of one replica, ascending in time
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    samples: Vec<(f64, f64)>,
}

impl TimeSeries {
    pub fn new(samples: Vec<(f64, f64)>) -> Self {
        Self { samples }
    }

    /// Series built from the `time` column and the named distance column
    pub fn from_colvar(table: &ColvarTable, distance_field: &str) -> Result<Self> {
        let time = table
            .time()
            .ok_or_else(|| TramdError::invalid("COLVAR table has no \"time\" field"))?;
        let r = table.column(distance_field).ok_or_else(|| {
            TramdError::invalid(format!(
                "COLVAR table has no {:?} field (fields: {})",
                distance_field,
                table.fields().join(", ")
            ))
        })?;
        Ok(Self::new(time.iter().copied().zip(r.iter().copied()).collect()))
    }

    pub fn samples(&self) -> &[(f64, f64)] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time of the first sample with `r >= r_diss`, or the last timestamp
    /// when the threshold is never reached. None for an empty series.
    pub fn dissociation_time(&self, r_diss: f64) -> Option<f64> {
        let (last_time, _) = *self.samples.last()?;
        let crossing = self
            .samples
            .iter()
            .find(|(_, r)| *r >= r_diss)
            .map(|(t, _)| *t);
        if crossing.is_none() {
            tracing::debug!(r_diss, last_time, "no crossing, using final timestamp");
        }
        Some(crossing.unwrap_or(last_time))
    }
}

/// One dissociation time per series, sorted ascending
///
/// # Errors
///
/// `InvalidArgument` when `r_diss` is not finite or any series is empty.
pub fn plumed_dissociation_times(series: &[TimeSeries], r_diss: f64) -> Result<DissociationTimes> {
    if !r_diss.is_finite() {
        return Err(TramdError::invalid(format!(
            "r_diss must be finite, got {}",
            r_diss
        )));
    }

    let times = series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            s.dissociation_time(r_diss)
                .ok_or_else(|| TramdError::invalid(format!("time series {} has no samples", i)))
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(
        "Found {} dissociation times in {} time series.",
        times.len(),
        series.len()
    );

    DissociationTimes::new(times)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn series(points: &[(f64, f64)]) -> TimeSeries {
        TimeSeries::new(points.to_vec())
    }

    #[test]
    fn test_first_crossing_wins() {
        let s = series(&[(0.0, 0.3), (1.0, 0.9), (2.0, 1.2), (3.0, 0.4), (4.0, 1.5)]);
        assert_eq!(s.dissociation_time(1.0), Some(2.0));
    }

    #[test]
    fn test_crossing_is_inclusive() {
        let s = series(&[(0.0, 0.3), (1.0, 1.0), (2.0, 2.0)]);
        assert_eq!(s.dissociation_time(1.0), Some(1.0));
    }

    #[test]
    fn test_no_crossing_uses_last_timestamp() {
        let s = series(&[(0.0, 0.1), (5.0, 0.2), (10.0, 0.3)]);
        assert_eq!(s.dissociation_time(1.0), Some(10.0));
    }

    #[test]
    fn test_empty_series_has_no_time() {
        assert_eq!(series(&[]).dissociation_time(1.0), None);
    }

    #[test]
    fn test_plumed_times_sorted() {
        let all = vec![
            series(&[(0.0, 0.1), (8.0, 2.0)]),
            series(&[(0.0, 0.1), (3.0, 2.0)]),
            series(&[(0.0, 0.1), (6.0, 0.2)]),
        ];
        let times = plumed_dissociation_times(&all, 1.0).unwrap();
        assert_eq!(times.as_slice(), &[3.0, 6.0, 8.0]);
    }

    #[test]
    fn test_plumed_rejects_empty_series() {
        let all = vec![series(&[(0.0, 2.0)]), series(&[])];
        let err = plumed_dissociation_times(&all, 1.0).unwrap_err();
        assert!(matches!(err, TramdError::InvalidArgument(_)));
    }

    #[test]
    fn test_plumed_rejects_nan_threshold() {
        assert!(plumed_dissociation_times(&[], f64::NAN).is_err());
    }

    #[test]
    fn test_from_colvar() {
        let table = ColvarTable::parse(
            "#! FIELDS time r\n0.0 0.2\n1.0 0.8\n2.0 1.4\n",
            Path::new("COLVAR"),
        )
        .unwrap();
        let s = TimeSeries::from_colvar(&table, DEFAULT_DISTANCE_FIELD).unwrap();
        assert_eq!(s.samples().len(), 3);
        assert_eq!(s.dissociation_time(1.0), Some(2.0));
    }

    #[test]
    fn test_from_colvar_missing_field() {
        let table = ColvarTable::parse("#! FIELDS time d\n0.0 0.2\n", Path::new("COLVAR")).unwrap();
        let err = TimeSeries::from_colvar(&table, "r").unwrap_err();
        assert!(err.to_string().contains("time, d"));
    }
}
