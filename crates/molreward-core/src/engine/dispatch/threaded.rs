use super::Dispatcher;
use crate::core::oracles::Oracle;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Shares one oracle across a dedicated rayon pool inside this process.
///
/// Without the `parallel` feature the batch is scored sequentially.
pub struct ThreadedDispatcher {
    oracle: Box<dyn Oracle>,
    num_threads: usize,
    #[cfg(feature = "parallel")]
    pool: rayon::ThreadPool,
}

impl ThreadedDispatcher {
    pub fn new(oracle: Box<dyn Oracle>, num_threads: usize) -> Result<Self, EngineError> {
        let num_threads = num_threads.max(1);

        #[cfg(feature = "parallel")]
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|index| format!("oracle-thread-{index}"))
            .build()
            .map_err(|e| EngineError::Internal(format!("failed to build thread pool: {e}")))?;

        Ok(Self {
            oracle,
            num_threads,
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }
}

impl Dispatcher for ThreadedDispatcher {
    #[instrument(skip_all, name = "threaded_dispatch", fields(oracle = self.oracle.name(), batch = descriptors.len(), threads = self.num_threads))]
    fn score_with_progress(
        &mut self,
        descriptors: &[String],
        reporter: &ProgressReporter<'_>,
    ) -> Result<Vec<f64>, EngineError> {
        reporter.report(Progress::TaskStart {
            total_steps: descriptors.len() as u64,
        });

        let oracle = self.oracle.as_ref();
        let score_one = |descriptor: &String| {
            let score = oracle.score(descriptor);
            reporter.report(Progress::TaskIncrement);
            score
        };

        #[cfg(not(feature = "parallel"))]
        let scores: Vec<f64> = descriptors.iter().map(score_one).collect();

        #[cfg(feature = "parallel")]
        let scores: Vec<f64> = self
            .pool
            .install(|| descriptors.par_iter().map(score_one).collect());

        reporter.report(Progress::TaskFinish);
        info!(scored = scores.len(), "Batch scored on thread pool.");
        Ok(scores)
    }
}
