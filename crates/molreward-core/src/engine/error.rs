use thiserror::Error;

use super::config::ConfigError;
use crate::core::oracles::OracleError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Oracle initialization failed: {source}")]
    Oracle {
        #[from]
        source: OracleError,
    },

    #[error("Failed to spawn worker {slot}: {source}")]
    WorkerSpawn {
        slot: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("All workers have died with {remaining} descriptors still unscored")]
    PoolExhausted { remaining: usize },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
