use crate::cli::{BackendArg, ScoreArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use molreward::engine::config::{
    self as core_config, Backend, OracleKind, ScoringConfigBuilder, WorkerCommand,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialExecutionConfig {
    #[serde(rename = "num-processes")]
    num_processes: Option<usize>,
    backend: Option<String>,
    #[serde(rename = "worker-timeout-secs")]
    worker_timeout_secs: Option<f64>,
    #[serde(rename = "poll-interval-ms")]
    poll_interval_ms: Option<u64>,
}

/// The `score` configuration file: an oracle name, an `[execution]` table and an
/// `[overrides]` table of oracle-specific settings.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialScoringConfig {
    oracle: Option<String>,
    execution: Option<PartialExecutionConfig>,
    overrides: Option<BTreeMap<String, toml::Value>>,
}

impl PartialScoringConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Resolves the final configuration. Command-line flags beat the file, and `-S`
    /// overrides are applied after the file's `[overrides]` table.
    pub fn merge_with_cli(
        mut self,
        args: &ScoreArgs,
        worker_command: WorkerCommand,
    ) -> Result<core_config::ScoringConfig> {
        self.apply_set_values(&args.set_values)?;
        let execution = self.execution.take().unwrap_or_default();

        let oracle_name = args.oracle.as_ref().or(self.oracle.as_ref()).ok_or_else(|| {
            CliError::Config(
                "An oracle name is required either in the config file or via --oracle."
                    .to_string(),
            )
        })?;
        let kind: OracleKind = oracle_name.parse()?;

        let mut builder = ScoringConfigBuilder::new()
            .oracle(kind)
            .num_processes(args.num_processes.or(execution.num_processes).unwrap_or(0))
            .worker_command(worker_command);

        builder = builder.backend(match (args.backend, execution.backend.as_deref()) {
            (Some(BackendArg::Process), _) => Backend::Process,
            (Some(BackendArg::Threads), _) => Backend::Threads,
            (None, Some(name)) => name.parse()?,
            (None, None) => Backend::default(),
        });

        if let Some(secs) = args.timeout_secs.or(execution.worker_timeout_secs) {
            let timeout = Duration::try_from_secs_f64(secs)
                .ok()
                .filter(|t| !t.is_zero())
                .ok_or_else(|| {
                    CliError::Config(format!(
                        "Worker timeout must be a positive number of seconds, got {secs}"
                    ))
                })?;
            builder = builder.response_timeout(timeout);
        }
        if let Some(ms) = execution.poll_interval_ms {
            if ms == 0 {
                return Err(CliError::Config(
                    "execution.poll-interval-ms must be positive".to_string(),
                ));
            }
            builder = builder.poll_interval(Duration::from_millis(ms));
        }

        for (key, value) in self.overrides.take().unwrap_or_default() {
            builder = builder.set(key.clone(), override_value_to_string(&key, value)?);
        }

        Ok(builder.build()?)
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value) =
                parser::parse_key_value(kv_pair).map_err(|e| CliError::Argument(e.to_string()))?;
            self.overrides
                .get_or_insert_with(Default::default)
                .insert(key, toml::Value::String(value));
        }
        Ok(())
    }
}

fn override_value_to_string(key: &str, value: toml::Value) -> Result<String> {
    match value {
        toml::Value::String(s) => Ok(s),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        other => Err(CliError::Config(format!(
            "Override '{key}' must be a string, number or boolean, found {}",
            other.type_str()
        ))),
    }
}
