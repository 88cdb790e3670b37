//! Dispatchers turn a batch of descriptors into an index-aligned batch of scores.
//!
//! - [`single::SingleProcessDispatcher`] calls one in-process oracle sequentially.
//! - [`threaded::ThreadedDispatcher`] fans out over a rayon pool inside this process.
//! - [`parallel::ParallelDispatcher`] drives a fixed pool of [`Worker`](super::worker::Worker)s,
//!   normally worker subprocesses.

pub mod parallel;
pub mod single;
pub mod threaded;

pub use parallel::ParallelDispatcher;
pub use single::SingleProcessDispatcher;
pub use threaded::ThreadedDispatcher;

use super::error::EngineError;
use super::progress::ProgressReporter;

pub trait Dispatcher: Send {
    /// Scores every descriptor, returning one score per input in input order.
    fn score_with_progress(
        &mut self,
        descriptors: &[String],
        reporter: &ProgressReporter<'_>,
    ) -> Result<Vec<f64>, EngineError>;

    fn score(&mut self, descriptors: &[String]) -> Result<Vec<f64>, EngineError> {
        self.score_with_progress(descriptors, &ProgressReporter::new())
    }
}
