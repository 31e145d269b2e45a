use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use tramd::cli::{Cli, OutputFormat};
use tramd::pipeline::{self, InputKind, PipelineConfig};
use tramd::{AnalysisConfig, CancellationToken};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; INFO by default, TRACE with --debug
fn init_tracing(debug: bool) {
    let level = if debug {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

/// Merge the optional config file with command-line overrides
fn analysis_config(args: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    if let Some(timestep) = args.timestep {
        config.timestep = timestep;
    }
    if let Some(n) = args.n_samples {
        config.n_samples = n;
    }
    if args.sample_size.is_some() {
        config.sample_size = args.sample_size;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.r_diss.is_some() {
        config.r_diss = args.r_diss;
    }
    if let Some(column) = &args.r_column {
        config.r_column = column.clone();
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let analysis = analysis_config(&args)?;

    let kind = if args.colvar {
        InputKind::Colvar
    } else {
        InputKind::Ramd(args.mode)
    };

    let config = PipelineConfig {
        inputs: args.inputs.clone(),
        kind,
        output: args.output.clone(),
        analysis,
        parallel: args.parallel,
        plots: !args.no_plots,
    };

    let outcome = pipeline::run(&config, &CancellationToken::new())
        .context("Residence time analysis failed")?;

    match args.format {
        OutputFormat::Text => print!("{}", outcome.summary.to_text()),
        OutputFormat::Json => println!("{}", outcome.summary.to_json()?),
    }

    tracing::info!(
        times = %outcome.outputs.times.display(),
        bootstrap = %outcome.outputs.bootstrap.display(),
        figures = outcome.outputs.figures.len(),
        "outputs written"
    );

    Ok(())
}
