use crate::cli::WorkerArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use molreward::engine::config::{OracleConfig, OracleKind};
use molreward::engine::error::EngineError;
use molreward::workflows::{scoring, serve};
use tracing::info;

/// Builds the oracle named on the command line and serves it on stdin/stdout.
pub fn run(args: WorkerArgs) -> Result<()> {
    let kind: OracleKind = args.oracle.parse()?;
    let overrides = args
        .set_values
        .iter()
        .map(|pair| parser::parse_key_value(pair))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| CliError::Argument(e.to_string()))?;
    let config = OracleConfig::from_overrides(kind, &overrides)?;
    let oracle = scoring::build_oracle(&config).map_err(EngineError::from)?;

    info!(oracle = %kind, pid = std::process::id(), "Worker starting.");
    let served = serve::run_stdio(oracle.as_ref())?;
    info!(served, "Worker finished.");
    Ok(())
}
