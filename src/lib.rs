//! tramd - effective residence times from τRAMD simulations
//!
//! This library extracts ligand dissociation times from GROMACS-RAMD output
//! or PLUMED COLVAR tables, estimates the effective residence time by
//! bootstrap resampling, and renders diagnostic figures.
//!
//! ```
//! use tramd::bootstrap::{bootstrap_residence_times, seeded_rng};
//! use tramd::{DissociationTimes, NormalFit};
//!
//! let times = DissociationTimes::new(vec![3.3, 1.7, 2.5, 4.4, 6.2]).unwrap();
//! let result = bootstrap_residence_times(&times, 1000, None, &mut seeded_rng(1)).unwrap();
//! let fit = NormalFit::from_samples(&result).unwrap();
//! assert!(fit.mean >= 1.7 && fit.mean <= 6.2);
//! ```

pub mod bootstrap;
pub mod cli;
pub mod colvar;
pub mod config;
pub mod detector;
pub mod error;
pub mod pipeline;
pub mod plot;
pub mod report;
pub mod source;
pub mod times;

pub use bootstrap::{bootstrap_residence_times, BootstrapResult, CancellationToken};
pub use config::AnalysisConfig;
pub use detector::{plumed_dissociation_times, TimeSeries};
pub use error::{Result, TramdError};
pub use report::NormalFit;
pub use source::{read_dissociation_times, ReadMode, Source};
pub use times::DissociationTimes;
