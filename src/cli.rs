//! CLI argument parsing for tramd

use crate::source::ReadMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the residence-time summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "tramd")]
#[command(version)]
#[command(about = "Effective residence times from τRAMD simulations", long_about = None)]
pub struct Cli {
    /// RAMD output file(s), or COLVAR tables with --colvar
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Basename for the written data and figures
    #[arg(short, long, value_name = "BASENAME", default_value = "tramd")]
    pub output: PathBuf,

    /// Input kind: "log" (one file per replica) or "out" (single collected file)
    #[arg(short, long, value_parser = parse_mode, default_value = "out")]
    pub mode: ReadMode,

    /// MD timestep in ns
    #[arg(long, value_name = "NS")]
    pub timestep: Option<f64>,

    /// Number of bootstrap samples
    #[arg(short = 'n', long = "n-samples", value_name = "N")]
    pub n_samples: Option<usize>,

    /// Replicas per bootstrap sample (default: 80% of all replicas)
    #[arg(long = "sample-size", value_name = "N")]
    pub sample_size: Option<usize>,

    /// Seed for reproducible bootstrap runs
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Treat inputs as PLUMED COLVAR tables and detect dissociation from a distance CV
    #[arg(long)]
    pub colvar: bool,

    /// Dissociation threshold for the distance CV (requires --colvar)
    #[arg(long = "r-diss", value_name = "R", requires = "colvar")]
    pub r_diss: Option<f64>,

    /// Distance column in COLVAR tables
    #[arg(long = "r-column", value_name = "NAME", requires = "colvar")]
    pub r_column: Option<String>,

    /// Run the bootstrap on all cores
    #[arg(long)]
    pub parallel: bool,

    /// Worker threads for --parallel
    #[arg(long, value_name = "N", requires = "parallel")]
    pub threads: Option<usize>,

    /// TOML configuration file (flags take precedence)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Summary format on stdout
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Skip writing figures
    #[arg(long = "no-plots")]
    pub no_plots: bool,

    /// Enable debug tracing output
    #[arg(long)]
    pub debug: bool,
}

fn parse_mode(s: &str) -> Result<ReadMode, String> {
    s.parse().map_err(|e: crate::TramdError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_single_input_defaults() {
        let cli = Cli::parse_from(["tramd", "ramd.out"]);
        assert_eq!(cli.inputs, vec![PathBuf::from("ramd.out")]);
        assert_eq!(cli.output, PathBuf::from("tramd"));
        assert_eq!(cli.mode, ReadMode::Out);
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(cli.timestep.is_none());
        assert!(!cli.parallel);
        assert!(!cli.colvar);
    }

    #[test]
    fn test_cli_requires_input() {
        assert!(Cli::try_parse_from(["tramd"]).is_err());
    }

    #[test]
    fn test_cli_log_mode_many_inputs() {
        let cli = Cli::parse_from(["tramd", "-m", "log", "a.log", "b.log", "-o", "run1"]);
        assert_eq!(cli.mode, ReadMode::Log);
        assert_eq!(cli.inputs.len(), 2);
        assert_eq!(cli.output, PathBuf::from("run1"));
    }

    #[test]
    fn test_cli_invalid_mode_names_allowed_values() {
        let err = Cli::try_parse_from(["tramd", "-m", "xvg", "a.out"]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("\"log\""));
        assert!(msg.contains("\"out\""));
    }

    #[test]
    fn test_cli_bootstrap_options() {
        let cli = Cli::parse_from([
            "tramd",
            "a.out",
            "-n",
            "1000",
            "--sample-size",
            "10",
            "--seed",
            "42",
            "--timestep",
            "4e-6",
        ]);
        assert_eq!(cli.n_samples, Some(1000));
        assert_eq!(cli.sample_size, Some(10));
        assert_eq!(cli.seed, Some(42));
        assert_eq!(cli.timestep, Some(4e-6));
    }

    #[test]
    fn test_cli_r_diss_requires_colvar() {
        assert!(Cli::try_parse_from(["tramd", "a.dat", "--r-diss", "2.0"]).is_err());
        let cli = Cli::parse_from(["tramd", "--colvar", "--r-diss", "2.0", "COLVAR"]);
        assert_eq!(cli.r_diss, Some(2.0));
    }

    #[test]
    fn test_cli_threads_requires_parallel() {
        assert!(Cli::try_parse_from(["tramd", "a.out", "--threads", "2"]).is_err());
        let cli = Cli::parse_from(["tramd", "a.out", "--parallel", "--threads", "2"]);
        assert_eq!(cli.threads, Some(2));
    }

    #[test]
    fn test_cli_json_format() {
        let cli = Cli::parse_from(["tramd", "a.out", "--format", "json"]);
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
