use crate::core::oracles::{activity, reference, similarity};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Unknown scoring function '{name}'. Must be one of: {available}")]
    UnknownOracle { name: String, available: String },

    #[error("Override '{key}' is not supported by '{oracle}' (allowed: {allowed})")]
    UnsupportedOverride {
        oracle: &'static str,
        key: String,
        allowed: String,
    },

    #[error("Invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Unknown execution backend '{0}'. Must be 'process' or 'threads'")]
    UnknownBackend(String),
}

/// The registered scoring functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OracleKind {
    Tanimoto,
    LogP,
    ActivityModel,
}

impl OracleKind {
    pub const ALL: [OracleKind; 3] = [
        OracleKind::Tanimoto,
        OracleKind::LogP,
        OracleKind::ActivityModel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OracleKind::Tanimoto => "tanimoto",
            OracleKind::LogP => "logp",
            OracleKind::ActivityModel => "activity_model",
        }
    }

    /// Override keys accepted by this scoring function.
    pub fn override_keys(self) -> &'static [&'static str] {
        match self {
            OracleKind::Tanimoto => &["k", "query_structure"],
            OracleKind::LogP => &[],
            OracleKind::ActivityModel => &["clf_path"],
        }
    }

    fn registered_names() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for OracleKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tanimoto" => Ok(OracleKind::Tanimoto),
            "logp" | "logP" => Ok(OracleKind::LogP),
            "activity_model" => Ok(OracleKind::ActivityModel),
            _ => Err(ConfigError::UnknownOracle {
                name: s.to_string(),
                available: Self::registered_names(),
            }),
        }
    }
}

impl fmt::Display for OracleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TanimotoConfig {
    pub k: f64,
    pub query_structure: String,
}

impl Default for TanimotoConfig {
    fn default() -> Self {
        Self {
            k: similarity::DEFAULT_K,
            query_structure: reference::DEFAULT_REFERENCE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityConfig {
    pub clf_path: PathBuf,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            clf_path: PathBuf::from(activity::DEFAULT_CLASSIFIER_PATH),
        }
    }
}

/// Fully resolved configuration of one scoring function.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleConfig {
    Tanimoto(TanimotoConfig),
    LogP,
    ActivityModel(ActivityConfig),
}

impl OracleConfig {
    pub fn defaults(kind: OracleKind) -> Self {
        match kind {
            OracleKind::Tanimoto => OracleConfig::Tanimoto(TanimotoConfig::default()),
            OracleKind::LogP => OracleConfig::LogP,
            OracleKind::ActivityModel => OracleConfig::ActivityModel(ActivityConfig::default()),
        }
    }

    /// Starts from the defaults of `kind` and applies each override in order.
    pub fn from_overrides<K, V>(kind: OracleKind, overrides: &[(K, V)]) -> Result<Self, ConfigError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::defaults(kind);
        for (key, value) in overrides {
            config.apply(key.as_ref(), value.as_ref())?;
        }
        Ok(config)
    }

    pub fn kind(&self) -> OracleKind {
        match self {
            OracleConfig::Tanimoto(_) => OracleKind::Tanimoto,
            OracleConfig::LogP => OracleKind::LogP,
            OracleConfig::ActivityModel(_) => OracleKind::ActivityModel,
        }
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let kind = self.kind();
        match (self, key) {
            (OracleConfig::Tanimoto(cfg), "k") => {
                let k: f64 = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    reason: "expected a number".to_string(),
                })?;
                if !(k > 0.0 && k <= 1.0) {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                        reason: "must lie in (0, 1]".to_string(),
                    });
                }
                cfg.k = k;
            }
            (OracleConfig::Tanimoto(cfg), "query_structure") => {
                if reference::lookup(value).is_none() {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                        reason: format!(
                            "not a catalogued structure (known: {})",
                            reference::names().join(", ")
                        ),
                    });
                }
                cfg.query_structure = value.to_string();
            }
            (OracleConfig::ActivityModel(cfg), "clf_path") => {
                if value.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                        reason: "path cannot be empty".to_string(),
                    });
                }
                cfg.clf_path = PathBuf::from(value);
            }
            _ => {
                let allowed = kind.override_keys();
                return Err(ConfigError::UnsupportedOverride {
                    oracle: kind.name(),
                    key: key.to_string(),
                    allowed: if allowed.is_empty() {
                        "none".to_string()
                    } else {
                        allowed.join(", ")
                    },
                });
            }
        }
        Ok(())
    }

    /// Renders the configuration as `key=value` overrides that reproduce it.
    pub fn to_overrides(&self) -> Vec<(String, String)> {
        match self {
            OracleConfig::Tanimoto(cfg) => vec![
                ("k".to_string(), cfg.k.to_string()),
                ("query_structure".to_string(), cfg.query_structure.clone()),
            ],
            OracleConfig::LogP => Vec::new(),
            OracleConfig::ActivityModel(cfg) => vec![(
                "clf_path".to_string(),
                cfg.clf_path.to_string_lossy().into_owned(),
            )],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// A pool of long-lived worker subprocesses.
    #[default]
    Process,
    /// In-process fan-out across a thread pool.
    Threads,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "process" => Ok(Backend::Process),
            "threads" => Ok(Backend::Threads),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

/// Program and leading arguments used to start a worker subprocess. The oracle
/// name and its overrides are appended at spawn time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// The running executable invoked with its `worker` subcommand.
    pub fn current_exe() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?).arg("worker"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    pub num_processes: usize,
    pub backend: Backend,
    pub worker_command: Option<WorkerCommand>,
    pub response_timeout: Duration,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub oracle: OracleConfig,
    pub execution: ExecutionConfig,
}

#[derive(Default)]
pub struct ScoringConfigBuilder {
    oracle: Option<OracleKind>,
    overrides: Vec<(String, String)>,
    num_processes: Option<usize>,
    backend: Option<Backend>,
    worker_command: Option<WorkerCommand>,
    response_timeout: Option<Duration>,
    poll_interval: Option<Duration>,
}

impl ScoringConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn oracle(mut self, kind: OracleKind) -> Self {
        self.oracle = Some(kind);
        self
    }
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }
    pub fn num_processes(mut self, n: usize) -> Self {
        self.num_processes = Some(n);
        self
    }
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }
    pub fn worker_command(mut self, command: WorkerCommand) -> Self {
        self.worker_command = Some(command);
        self
    }
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = Some(timeout);
        self
    }
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn build(self) -> Result<ScoringConfig, ConfigError> {
        let kind = self.oracle.ok_or(ConfigError::MissingParameter("oracle"))?;
        let oracle = OracleConfig::from_overrides(kind, &self.overrides)?;
        let num_processes = self
            .num_processes
            .ok_or(ConfigError::MissingParameter("num_processes"))?;
        let backend = self.backend.unwrap_or_default();
        if num_processes > 0 && backend == Backend::Process && self.worker_command.is_none() {
            return Err(ConfigError::MissingParameter("worker_command"));
        }
        let response_timeout = self.response_timeout.unwrap_or(DEFAULT_RESPONSE_TIMEOUT);
        if response_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "response_timeout".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(ScoringConfig {
            oracle,
            execution: ExecutionConfig {
                num_processes,
                backend,
                worker_command: self.worker_command,
                response_timeout,
                poll_interval: self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            },
        })
    }
}
