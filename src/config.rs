//! Analysis configuration
//!
//! Loaded from a TOML file and overridden by command-line flags:
//!
//! ```toml
//! timestep = 2e-6
//! n_samples = 50000
//! sample_size = 12
//! seed = 42
//! r_diss = 3.0
//! ```

use crate::bootstrap::DEFAULT_N_SAMPLES;
use crate::detector::DEFAULT_DISTANCE_FIELD;
use crate::error::{Result, TramdError};
use crate::source::{DEFAULT_TIMESTEP, RAMD_STOP_MARKER};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for one residence-time analysis
///
/// # Example
/// ```
/// use tramd::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.n_samples, 50_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// MD timestep in ns
    pub timestep: f64,

    /// Number of bootstrap iterations
    pub n_samples: usize,

    /// Replicas per bootstrap draw; `None` means `floor(0.8 * n)`
    pub sample_size: Option<usize>,

    /// RNG seed; `None` draws one from the OS
    pub seed: Option<u64>,

    /// Dissociation threshold on the distance CV (COLVAR input)
    pub r_diss: Option<f64>,

    /// Name of the distance column in COLVAR tables
    pub r_column: String,

    /// Line prefix announcing a dissociation in RAMD output
    pub marker: String,

    /// Worker threads for the parallel bootstrap; `None` uses all cores
    pub threads: Option<usize>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            timestep: DEFAULT_TIMESTEP,
            n_samples: DEFAULT_N_SAMPLES,
            sample_size: None,
            seed: None,
            r_diss: None,
            r_column: DEFAULT_DISTANCE_FIELD.to_string(),
            marker: RAMD_STOP_MARKER.to_string(),
            threads: None,
        }
    }
}

impl AnalysisConfig {
    /// Load a TOML configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| TramdError::io(path, e))?;
        let config: AnalysisConfig = toml::from_str(&contents)
            .map_err(|e| TramdError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.timestep.is_finite() || self.timestep <= 0.0 {
            return Err(TramdError::Config(format!(
                "timestep must be > 0 ns, got {}",
                self.timestep
            )));
        }

        if self.n_samples == 0 {
            return Err(TramdError::Config("n_samples must be >= 1".to_string()));
        }

        if self.sample_size == Some(0) {
            return Err(TramdError::Config("sample_size must be >= 1".to_string()));
        }

        if let Some(r) = self.r_diss {
            if !r.is_finite() {
                return Err(TramdError::Config(format!("r_diss must be finite, got {}", r)));
            }
        }

        if self.r_column.is_empty() {
            return Err(TramdError::Config("r_column must not be empty".to_string()));
        }

        if self.marker.is_empty() {
            return Err(TramdError::Config("marker must not be empty".to_string()));
        }

        if self.threads == Some(0) {
            return Err(TramdError::Config("threads must be >= 1".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timestep, 2e-6);
        assert_eq!(config.r_column, "r");
        assert!(config.sample_size.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            AnalysisConfig {
                timestep: 0.0,
                ..Default::default()
            },
            AnalysisConfig {
                n_samples: 0,
                ..Default::default()
            },
            AnalysisConfig {
                sample_size: Some(0),
                ..Default::default()
            },
            AnalysisConfig {
                r_diss: Some(f64::INFINITY),
                ..Default::default()
            },
            AnalysisConfig {
                marker: String::new(),
                ..Default::default()
            },
            AnalysisConfig {
                threads: Some(0),
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{:?}", config);
        }
    }

    #[test]
    fn test_from_file_partial() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tramd.toml");
        fs::write(&path, "n_samples = 1000\nseed = 7\nr_diss = 2.5\n").unwrap();

        let config = AnalysisConfig::from_file(&path).unwrap();
        assert_eq!(config.n_samples, 1000);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.r_diss, Some(2.5));
        assert_eq!(config.timestep, 2e-6);
    }

    #[test]
    fn test_from_file_unknown_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tramd.toml");
        fs::write(&path, "n_sample = 10\n").unwrap();
        let err = AnalysisConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, TramdError::Config(_)));
    }

    #[test]
    fn test_from_file_invalid_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tramd.toml");
        fs::write(&path, "timestep = -1.0\n").unwrap();
        assert!(AnalysisConfig::from_file(&path).is_err());
    }
}
