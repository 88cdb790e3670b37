use crate::core::oracles::activity::ActivityOracle;
use crate::core::oracles::property::LogPOracle;
use crate::core::oracles::similarity::TanimotoOracle;
use crate::core::oracles::{Oracle, OracleError};
use crate::engine::config::{
    Backend, OracleConfig, OracleKind, ScoringConfig, ScoringConfigBuilder, WorkerCommand,
};
use crate::engine::dispatch::{
    Dispatcher, ParallelDispatcher, SingleProcessDispatcher, ThreadedDispatcher,
};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

/// Constructs the adapter described by `config`.
pub fn build_oracle(config: &OracleConfig) -> Result<Box<dyn Oracle>, OracleError> {
    let oracle: Box<dyn Oracle> = match config {
        OracleConfig::Tanimoto(cfg) => Box::new(TanimotoOracle::new(cfg.k, &cfg.query_structure)?),
        OracleConfig::LogP => Box::new(LogPOracle::new()),
        OracleConfig::ActivityModel(cfg) => Box::new(ActivityOracle::load(&cfg.clf_path)?),
    };
    Ok(oracle)
}

/// Builds the dispatcher selected by `config.execution`.
///
/// The oracle is always constructed once in this process first, so artifact and
/// reference errors surface before any worker subprocess is started.
#[instrument(skip_all, name = "build_dispatcher", fields(oracle = %config.oracle.kind(), processes = config.execution.num_processes))]
pub fn build_dispatcher(config: &ScoringConfig) -> Result<Box<dyn Dispatcher>, EngineError> {
    let execution = &config.execution;
    let oracle = build_oracle(&config.oracle)?;

    let dispatcher: Box<dyn Dispatcher> = match (execution.num_processes, execution.backend) {
        (0, _) => {
            info!("Scoring in-process on a single thread.");
            Box::new(SingleProcessDispatcher::new(oracle))
        }
        (threads, Backend::Threads) => {
            info!(threads, "Scoring in-process on a thread pool.");
            Box::new(ThreadedDispatcher::new(oracle, threads)?)
        }
        (_, Backend::Process) => {
            drop(oracle);
            Box::new(ParallelDispatcher::spawn(&config.oracle, execution)?)
        }
    };
    Ok(dispatcher)
}

/// Returns a dispatcher for the oracle registered as `name`.
///
/// With `num_processes > 0` the pool re-invokes the running executable with its
/// `worker` subcommand, so this is meant to be called from a binary that provides one.
pub fn get_scoring_function<K, V>(
    name: &str,
    num_processes: usize,
    overrides: &[(K, V)],
) -> Result<Box<dyn Dispatcher>, EngineError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let kind: OracleKind = name.parse()?;
    let mut builder = ScoringConfigBuilder::new()
        .oracle(kind)
        .num_processes(num_processes);
    for (key, value) in overrides {
        builder = builder.set(key.as_ref(), value.as_ref());
    }
    if num_processes > 0 {
        let command = WorkerCommand::current_exe().map_err(|e| {
            EngineError::Internal(format!("cannot locate the running executable: {e}"))
        })?;
        builder = builder.worker_command(command);
    }
    build_dispatcher(&builder.build()?)
}

/// Builds the configured dispatcher and scores one batch with it.
#[instrument(skip_all, name = "scoring_workflow", fields(batch = descriptors.len()))]
pub fn run(
    config: &ScoringConfig,
    descriptors: &[String],
    reporter: &ProgressReporter,
) -> Result<Vec<f64>, EngineError> {
    reporter.report(Progress::PhaseStart { name: "Setup" });
    let mut dispatcher = build_dispatcher(config)?;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart { name: "Scoring" });
    let scores = dispatcher.score_with_progress(descriptors, reporter)?;
    reporter.report(Progress::PhaseFinish);

    info!(scored = scores.len(), "Scoring workflow finished.");
    Ok(scores)
}
