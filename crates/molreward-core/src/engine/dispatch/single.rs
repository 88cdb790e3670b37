use super::Dispatcher;
use crate::core::oracles::Oracle;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

/// Calls one oracle instance in-process, once per descriptor, in input order.
pub struct SingleProcessDispatcher {
    oracle: Box<dyn Oracle>,
}

impl SingleProcessDispatcher {
    pub fn new(oracle: Box<dyn Oracle>) -> Self {
        Self { oracle }
    }
}

impl Dispatcher for SingleProcessDispatcher {
    #[instrument(skip_all, name = "single_process_dispatch", fields(oracle = self.oracle.name(), batch = descriptors.len()))]
    fn score_with_progress(
        &mut self,
        descriptors: &[String],
        reporter: &ProgressReporter<'_>,
    ) -> Result<Vec<f64>, EngineError> {
        reporter.report(Progress::TaskStart {
            total_steps: descriptors.len() as u64,
        });
        let scores = descriptors
            .iter()
            .map(|descriptor| {
                let score = self.oracle.score(descriptor);
                reporter.report(Progress::TaskIncrement);
                score
            })
            .collect::<Vec<_>>();
        reporter.report(Progress::TaskFinish);
        info!(scored = scores.len(), "Batch scored in-process.");
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::oracles::property::LogPOracle;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn scores_follow_input_order() {
        let mut dispatcher = SingleProcessDispatcher::new(Box::new(LogPOracle::new()));
        let batch = vec![
            "CCCC".to_string(),
            "not a molecule".to_string(),
            "CCCCCCCCCCCC".to_string(),
            "".to_string(),
        ];
        let scores = dispatcher.score(&batch).unwrap();
        assert_eq!(scores.len(), batch.len());
        assert_eq!(scores, vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn empty_batch_yields_empty_scores() {
        let mut dispatcher = SingleProcessDispatcher::new(Box::new(LogPOracle::new()));
        assert!(dispatcher.score(&[]).unwrap().is_empty());
    }

    #[test]
    fn reports_one_increment_per_descriptor() {
        let increments = AtomicUsize::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if matches!(event, Progress::TaskIncrement) {
                increments.fetch_add(1, Ordering::SeqCst);
            }
        }));
        let mut dispatcher = SingleProcessDispatcher::new(Box::new(LogPOracle::new()));
        let batch: Vec<String> = ["C", "CC", "CCC"].iter().map(|s| s.to_string()).collect();
        dispatcher.score_with_progress(&batch, &reporter).unwrap();
        drop(reporter);
        assert_eq!(increments.load(Ordering::SeqCst), 3);
    }
}
