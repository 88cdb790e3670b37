use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "molreward - reward functions for generative molecular design, scored in-process or across a pool of worker processes.",
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
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a file of SMILES strings with one of the registered oracles.
    Score(ScoreArgs),
    /// Serve an oracle over stdin/stdout, one response line per SMILES line.
    #[command(hide = true)]
    Worker(WorkerArgs),
    /// List the registered oracles, their override keys and the reference catalog.
    Oracles,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    Process,
    Threads,
}

/// Arguments for the `score` subcommand.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Input file with one SMILES per line, or '-' for stdin.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Output CSV file. Scores are written to stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Name of the oracle to score with, overriding the config file.
    #[arg(long, value_name = "NAME")]
    pub oracle: Option<String>,

    /// Number of workers; 0 scores in-process on the calling thread.
    #[arg(short = 'n', long, value_name = "INT")]
    pub num_processes: Option<usize>,

    /// Execution backend used when the number of workers is positive.
    #[arg(long, value_enum, value_name = "BACKEND")]
    pub backend: Option<BackendArg>,

    /// Seconds to wait for a worker response before scoring the molecule 0.0.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<f64>,

    /// Set an oracle override, taking precedence over the config file.
    /// Can be used multiple times. Example: -S k=0.5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the hidden `worker` subcommand spawned by the process pool.
#[derive(Args, Debug)]
pub struct WorkerArgs {
    /// Registered oracle name.
    #[arg(required = true, value_name = "ORACLE")]
    pub oracle: String,

    /// Oracle override in KEY=VALUE form. Can be used multiple times.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_arguments_parse() {
        let cli = Cli::parse_from([
            "molreward", "-vv", "score", "-i", "in.smi", "--oracle", "tanimoto", "-n", "4",
            "--backend", "threads", "-S", "k=0.5", "-S", "query_structure=Zaleplon",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Score(args) = cli.command else {
            panic!("expected score subcommand");
        };
        assert_eq!(args.input, PathBuf::from("in.smi"));
        assert_eq!(args.oracle.as_deref(), Some("tanimoto"));
        assert_eq!(args.num_processes, Some(4));
        assert_eq!(args.backend, Some(BackendArg::Threads));
        assert_eq!(args.set_values, vec!["k=0.5", "query_structure=Zaleplon"]);
    }

    #[test]
    fn worker_arguments_parse_in_spawn_order() {
        let cli = Cli::parse_from([
            "molreward", "worker", "tanimoto", "-S", "k=0.5", "-S", "query_structure=Celebrex",
        ]);
        let Commands::Worker(args) = cli.command else {
            panic!("expected worker subcommand");
        };
        assert_eq!(args.oracle, "tanimoto");
        assert_eq!(args.set_values, vec!["k=0.5", "query_structure=Celebrex"]);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["molreward", "-q", "-v", "oracles"]);
        assert!(result.is_err());
    }
}
