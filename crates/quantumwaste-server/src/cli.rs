use clap::{Args, Parser, Subcommand};
use quantumwaste::core::models::polymer::CompositionMode;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "QuantumWaste Developers",
    version,
    about = "QuantumWaste - Polymer recycling-difficulty simulation service with a variational quantum optimizer and a random-forest difficulty predictor.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used for random-forest training.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bootstrap the difficulty predictor and serve the HTTP API.
    Serve(ServeArgs),
    /// Train the difficulty predictor on synthetic data and write its artifacts.
    Train(TrainArgs),
    /// Run a single simulation locally and print the JSON result.
    Simulate(SimulateArgs),
}

/// Options shared by every subcommand that needs a resolved configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the directory holding the model and scaler artifacts.
    #[arg(long, value_name = "DIR")]
    pub artifacts_dir: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S model.trees=50
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Override the interface to bind.
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Override the port to listen on.
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,
}

/// Arguments for the `train` subcommand.
#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Retrain and overwrite existing artifacts.
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the `simulate` subcommand.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Number of monomers in the generated polymer.
    #[arg(short, long, value_name = "INT")]
    pub length: Option<usize>,

    /// Monomer assignment: 'random' or 'uniform'.
    #[arg(long, value_name = "MODE")]
    pub composition: Option<CompositionMode>,

    /// Environmental temperature fed to the predictor.
    #[arg(short, long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub temperature: Option<f64>,

    /// Environmental pressure fed to the predictor.
    #[arg(long, value_name = "FLOAT")]
    pub pressure: Option<f64>,

    /// Seed the simulation for a reproducible result.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_accepts_overrides_and_repeated_set_values() {
        let cli = Cli::parse_from([
            "quantumwaste",
            "-vv",
            "serve",
            "--port",
            "8080",
            "--artifacts-dir",
            "/tmp/models",
            "-S",
            "model.trees=50",
            "-S",
            "server.max-length=500",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Serve(args) = cli.command else {
            panic!("expected the serve subcommand");
        };
        assert_eq!(args.port, Some(8080));
        assert_eq!(args.config.artifacts_dir, Some(PathBuf::from("/tmp/models")));
        assert_eq!(
            args.config.set_values,
            vec!["model.trees=50", "server.max-length=500"]
        );
    }

    #[test]
    fn simulate_parses_composition_mode() {
        let cli = Cli::parse_from([
            "quantumwaste",
            "simulate",
            "--length",
            "12",
            "--composition",
            "uniform",
            "--seed",
            "7",
        ]);
        let Commands::Simulate(args) = cli.command else {
            panic!("expected the simulate subcommand");
        };
        assert_eq!(args.length, Some(12));
        assert_eq!(args.composition, Some(CompositionMode::Uniform));
        assert_eq!(args.seed, Some(7));
    }

    #[test]
    fn unknown_composition_mode_is_rejected() {
        assert!(
            Cli::try_parse_from(["quantumwaste", "simulate", "--composition", "mixed"]).is_err()
        );
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["quantumwaste", "-q", "-v", "train"]).is_err());
    }
}
