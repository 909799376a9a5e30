//! Command-line interface for the crossbar accelerator estimator.
//!
//! Provides `xbar plan` to print the chip floor plan of a network and
//! `xbar estimate` to run the full latency, energy and area estimate.

#![warn(missing_docs)]

mod estimate;
mod pipeline;
mod plan;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Latency, energy and area estimates for crossbar inference accelerators.
#[derive(Parser, Debug)]
#[command(name = "xbar", version, about = "Crossbar accelerator estimator")]
pub struct Cli {
    /// Suppress all output except errors and the report.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also print notes and the resolved parameters.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `xbar.toml` parameter file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the floor plan of a network.
    Plan(PlanArgs),
    /// Estimate latency, energy and area of a network.
    Estimate(EstimateArgs),
}

/// Weight and input precision shared by every command.
#[derive(Args, Debug, Clone, Copy)]
pub struct PrecisionArgs {
    /// Bits per synaptic weight.
    #[arg(long, default_value_t = 8)]
    pub weight_bits: u32,

    /// Bits per input activation.
    #[arg(long, default_value_t = 8)]
    pub input_bits: u32,
}

/// Arguments for the `xbar plan` subcommand.
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Network description CSV.
    pub network: PathBuf,

    /// Precision of the network.
    #[command(flatten)]
    pub precision: PrecisionArgs,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `xbar estimate` subcommand.
#[derive(Parser, Debug)]
pub struct EstimateArgs {
    /// Network description CSV.
    pub network: PathBuf,

    /// Precision of the network.
    #[command(flatten)]
    pub precision: PrecisionArgs,

    /// Weight and input trace files, one pair per layer in network order.
    #[arg(
        long,
        num_args = 2,
        value_names = ["WEIGHTS", "INPUTS"],
        action = clap::ArgAction::Append
    )]
    pub layer: Vec<PathBuf>,

    /// Seed for synthetic traces of layers without trace files.
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Cap on output positions per synthetic layer; 0 keeps them all.
    #[arg(long, default_value_t = 0)]
    pub max_positions: usize,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

impl EstimateArgs {
    /// Trace file pairs in layer order.
    pub fn trace_pairs(&self) -> Vec<(PathBuf, PathBuf)> {
        self.layer
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect()
    }
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print notes and resolved parameters.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom parameter file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::env::var("TERM").is_ok_and(|t| t != "dumb"),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Plan(ref args) => plan::run(args, &global),
        Command::Estimate(ref args) => estimate::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plan_defaults() {
        let cli = Cli::parse_from(["xbar", "plan", "vgg8.csv"]);
        match cli.command {
            Command::Plan(ref args) => {
                assert_eq!(args.network, PathBuf::from("vgg8.csv"));
                assert_eq!(args.precision.weight_bits, 8);
                assert_eq!(args.precision.input_bits, 8);
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Plan command"),
        }
    }

    #[test]
    fn parse_estimate_with_precision() {
        let cli = Cli::parse_from([
            "xbar",
            "estimate",
            "net.csv",
            "--weight-bits",
            "4",
            "--input-bits",
            "2",
            "--seed",
            "9",
            "--max-positions",
            "16",
            "--format",
            "json",
        ]);
        match cli.command {
            Command::Estimate(ref args) => {
                assert_eq!(args.precision.weight_bits, 4);
                assert_eq!(args.precision.input_bits, 2);
                assert_eq!(args.seed, 9);
                assert_eq!(args.max_positions, 16);
                assert_eq!(args.format, ReportFormat::Json);
                assert!(args.trace_pairs().is_empty());
            }
            _ => panic!("expected Estimate command"),
        }
    }

    #[test]
    fn parse_layer_pairs_in_order() {
        let cli = Cli::parse_from([
            "xbar", "estimate", "net.csv", "--layer", "w1.csv", "in1.csv", "--layer", "w2.csv",
            "in2.csv",
        ]);
        match cli.command {
            Command::Estimate(ref args) => {
                let pairs = args.trace_pairs();
                assert_eq!(pairs.len(), 2);
                assert_eq!(pairs[0], (PathBuf::from("w1.csv"), PathBuf::from("in1.csv")));
                assert_eq!(pairs[1].1, PathBuf::from("in2.csv"));
            }
            _ => panic!("expected Estimate command"),
        }
    }

    #[test]
    fn layer_needs_two_files() {
        assert!(Cli::try_parse_from(["xbar", "estimate", "net.csv", "--layer", "w1.csv"]).is_err());
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from([
            "xbar", "--quiet", "--color", "never", "--config", "x.toml", "plan", "n.csv",
        ]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.config.as_deref(), Some("x.toml"));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["xbar", "estimate", "n.csv", "--verbose"]);
        assert!(cli.verbose);
    }
}
