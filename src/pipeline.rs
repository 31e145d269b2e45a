//! End-to-end analysis: read times, bootstrap, write data and figures

use crate::bootstrap::{
    bootstrap_residence_times_cancellable, bootstrap_residence_times_parallel, median,
    resolve_sample_size, seeded_rng, BootstrapResult, CancellationToken,
};
use crate::colvar::ColvarTable;
use crate::config::AnalysisConfig;
use crate::detector::{plumed_dissociation_times, TimeSeries};
use crate::error::{Result, TramdError};
use crate::plot;
use crate::report::{write_column, NormalFit, ResidenceSummary};
use crate::source::{read_dissociation_times_with, MarkerScanner, ReadMode, Source};
use crate::times::DissociationTimes;
use std::path::{Path, PathBuf};

/// Where the dissociation times come from
#[derive(Debug, Clone)]
pub enum InputKind {
    /// RAMD `.log` / `.out` files
    Ramd(ReadMode),
    /// PLUMED COLVAR tables, one per replica
    Colvar,
}

/// Everything needed for one run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub inputs: Vec<PathBuf>,
    pub kind: InputKind,
    pub output: PathBuf,
    pub analysis: AnalysisConfig,
    pub parallel: bool,
    pub plots: bool,
}

/// Files written by a run
#[derive(Debug, Clone, Default)]
pub struct OutputPaths {
    pub times: PathBuf,
    pub bootstrap: PathBuf,
    pub figures: Vec<PathBuf>,
}

/// Result of a run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub times: DissociationTimes,
    pub bootstrap: BootstrapResult,
    pub summary: ResidenceSummary,
    pub outputs: OutputPaths,
}

/// `<base><suffix>`, keeping the base's directory
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn read_times(config: &PipelineConfig, tables: &mut Vec<ColvarTable>) -> Result<DissociationTimes> {
    let analysis = &config.analysis;
    match config.kind {
        InputKind::Ramd(mode) => {
            let scanner = MarkerScanner::new(&analysis.marker)?;
            let source = Source::from_paths(config.inputs.clone());
            read_dissociation_times_with(&source, mode, analysis.timestep, &scanner)
        }
        InputKind::Colvar => {
            let r_diss = analysis.r_diss.ok_or_else(|| {
                TramdError::invalid("COLVAR input needs a dissociation threshold (r_diss)")
            })?;
            *tables = config
                .inputs
                .iter()
                .map(ColvarTable::from_file)
                .collect::<Result<Vec<_>>>()?;
            let series = tables
                .iter()
                .map(|t| TimeSeries::from_colvar(t, &analysis.r_column))
                .collect::<Result<Vec<_>>>()?;
            plumed_dissociation_times(&series, r_diss)
        }
    }
}

/// Run the analysis and write `<output>_times.dat`, `<output>_bootstrap.dat`
/// and, unless disabled, the figures
pub fn run(config: &PipelineConfig, cancel: &CancellationToken) -> Result<PipelineOutcome> {
    let analysis = &config.analysis;
    analysis.validate()?;

    let mut tables = Vec::new();
    let times = read_times(config, &mut tables)?;

    let sample_size = resolve_sample_size(times.len(), analysis.sample_size)?;
    let seed = analysis.seed.unwrap_or_else(rand::random);
    tracing::info!(
        n_samples = analysis.n_samples,
        sample_size,
        seed,
        parallel = config.parallel,
        "bootstrapping residence times"
    );

    let bootstrap = if config.parallel {
        let pool = {
            let mut builder = rayon::ThreadPoolBuilder::new();
            if let Some(threads) = analysis.threads {
                builder = builder.num_threads(threads);
            }
            builder
                .build()
                .map_err(|e| TramdError::invalid(format!("thread pool: {}", e)))?
        };
        pool.install(|| {
            bootstrap_residence_times_parallel(
                &times,
                analysis.n_samples,
                Some(sample_size),
                seed,
                cancel,
            )
        })?
    } else {
        bootstrap_residence_times_cancellable(
            &times,
            analysis.n_samples,
            Some(sample_size),
            &mut seeded_rng(seed),
            cancel,
        )?
    };

    let fit = NormalFit::from_samples(&bootstrap)?;
    let summary = ResidenceSummary {
        replicas: times.len(),
        min_time: times.min().unwrap_or(0.0),
        max_time: times.max().unwrap_or(0.0),
        median_time: median(&times).unwrap_or(0.0),
        n_samples: bootstrap.len(),
        sample_size,
        seed: Some(seed),
        residence_time: fit.mean,
        residence_time_std: fit.std,
    };

    let mut outputs = OutputPaths {
        times: with_suffix(&config.output, "_times.dat"),
        bootstrap: with_suffix(&config.output, "_bootstrap.dat"),
        figures: Vec::new(),
    };
    write_column(&outputs.times, &times)?;
    write_column(&outputs.bootstrap, &bootstrap)?;

    if config.plots {
        let times_fig = with_suffix(&config.output, "_times.svg");
        plot::plot_cumulative_histogram(&times_fig, &times)?;
        let bootstrap_fig = with_suffix(&config.output, "_bootstrap.svg");
        plot::plot_bootstrap_distribution(&bootstrap_fig, &bootstrap, &fit)?;
        outputs.figures.push(times_fig);
        outputs.figures.push(bootstrap_fig);

        if !tables.is_empty() {
            let cv_dir = with_suffix(&config.output, "_cv");
            outputs
                .figures
                .extend(plot::plot_cv_timeseries(&tables, &cv_dir)?);
        }
    }

    Ok(PipelineOutcome {
        times,
        bootstrap,
        summary,
        outputs,
    })
}
