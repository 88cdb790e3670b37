use super::Dispatcher;
use crate::engine::config::{ConfigError, ExecutionConfig, OracleConfig};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::worker::{ProcessWorker, Worker};
use std::mem;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Binds one descriptor to its result position and to the worker serving it.
#[derive(Debug, Clone)]
struct Assignment {
    slot: usize,
    result_index: usize,
    descriptor: String,
}

/// Sent back by a scoring unit together with the worker it borrowed.
struct Completion<W> {
    worker: W,
    assignment: Assignment,
    score: f64,
}

struct InFlight {
    assignment: Assignment,
    handle: JoinHandle<()>,
}

enum Slot<W> {
    Idle(W),
    Busy(InFlight),
    Dead,
}

struct WorkQueue<'a> {
    descriptors: &'a [String],
    pending: Vec<usize>,
}

impl<'a> WorkQueue<'a> {
    fn new(descriptors: &'a [String]) -> Self {
        Self {
            descriptors,
            pending: (0..descriptors.len()).collect(),
        }
    }

    fn len(&self) -> usize {
        self.pending.len()
    }

    fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Claims the descriptor at the back of the queue. Its result index equals the
    /// number of descriptors still queued after the pop.
    fn pop(&mut self) -> Option<(usize, &'a str)> {
        let index = self.pending.pop()?;
        debug_assert_eq!(index, self.pending.len());
        Some((index, self.descriptors[index].as_str()))
    }

    fn restore(&mut self, index: usize) {
        self.pending.push(index);
    }
}

/// Fans a batch out over a fixed pool of workers.
///
/// Each slot serves at most one descriptor at a time: launching a scoring unit moves
/// the worker out of its slot and into the unit's thread, and the worker comes back
/// through the completion channel. Only the coordinating thread writes the result
/// array. Dead workers are never respawned; once every slot is dead while work
/// remains, the batch fails with [`EngineError::PoolExhausted`].
pub struct ParallelDispatcher<W: Worker = ProcessWorker> {
    slots: Vec<Slot<W>>,
    poll_interval: Duration,
}

impl ParallelDispatcher<ProcessWorker> {
    /// Starts `execution.num_processes` worker subprocesses serving `oracle`.
    pub fn spawn(oracle: &OracleConfig, execution: &ExecutionConfig) -> Result<Self, EngineError> {
        let command = execution
            .worker_command
            .as_ref()
            .ok_or(ConfigError::MissingParameter("worker_command"))?;

        let mut workers = Vec::with_capacity(execution.num_processes);
        for slot in 0..execution.num_processes {
            let worker = ProcessWorker::spawn(slot, command, oracle, execution.response_timeout)
                .map_err(|source| EngineError::WorkerSpawn { slot, source })?;
            workers.push(worker);
        }
        info!(
            workers = workers.len(),
            oracle = %oracle.kind(),
            "Worker pool started."
        );
        Ok(Self::from_workers(workers, execution.poll_interval))
    }
}

impl<W: Worker> ParallelDispatcher<W> {
    pub fn from_workers(workers: Vec<W>, poll_interval: Duration) -> Self {
        Self {
            slots: workers.into_iter().map(Slot::Idle).collect(),
            poll_interval,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.slots.len()
    }

    /// Slots whose worker is still usable. Idle workers are polled for liveness and
    /// dropped from rotation when their process has gone; busy workers count as alive.
    pub fn alive_workers(&mut self, reporter: &ProgressReporter<'_>) -> Vec<usize> {
        let mut alive = Vec::with_capacity(self.slots.len());
        for (slot, state) in self.slots.iter_mut().enumerate() {
            let died = match state {
                Slot::Idle(worker) => !worker.is_alive(),
                _ => false,
            };
            if died {
                warn!(slot, "Worker died; removing it from rotation.");
                reporter.report(Progress::Message(format!(
                    "Worker {slot} died and was removed from the pool"
                )));
                *state = Slot::Dead;
            }
            if !matches!(state, Slot::Dead) {
                alive.push(slot);
            }
        }
        alive
    }

    fn busy_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|state| matches!(state, Slot::Busy(_)))
            .count()
    }

    fn launch(
        &mut self,
        slot: usize,
        queue: &mut WorkQueue<'_>,
        completions: &Sender<Completion<W>>,
    ) {
        let worker = match mem::replace(&mut self.slots[slot], Slot::Dead) {
            Slot::Idle(worker) => worker,
            other => {
                self.slots[slot] = other;
                return;
            }
        };
        let Some((result_index, descriptor)) = queue.pop() else {
            self.slots[slot] = Slot::Idle(worker);
            return;
        };

        let assignment = Assignment {
            slot,
            result_index,
            descriptor: descriptor.to_string(),
        };
        debug!(slot, result_index, descriptor, "Assigning descriptor.");

        let unit_assignment = assignment.clone();
        let completions = completions.clone();
        let spawned = thread::Builder::new()
            .name(format!("scoring-unit-{slot}"))
            .spawn(move || {
                let mut worker = worker;
                let score = worker.call(&unit_assignment.descriptor);
                let _ = completions.send(Completion {
                    worker,
                    assignment: unit_assignment,
                    score,
                });
            });

        match spawned {
            Ok(handle) => self.slots[slot] = Slot::Busy(InFlight { assignment, handle }),
            Err(e) => {
                warn!(slot, error = %e, "Failed to start scoring unit; worker removed from rotation.");
                queue.restore(result_index);
            }
        }
    }

    fn complete(
        &mut self,
        completion: Completion<W>,
        scores: &mut [f64],
        reporter: &ProgressReporter<'_>,
    ) {
        let Completion {
            worker,
            assignment,
            score,
        } = completion;
        scores[assignment.result_index] = score;
        if !matches!(self.slots[assignment.slot], Slot::Busy(_)) {
            warn!(slot = assignment.slot, "Completion for a slot with no assignment.");
        }
        self.slots[assignment.slot] = Slot::Idle(worker);
        debug!(
            slot = assignment.slot,
            result_index = assignment.result_index,
            score,
            "Descriptor scored."
        );
        reporter.report(Progress::TaskIncrement);
    }

    /// Applies every completion that has arrived. A unit whose thread has ended
    /// without reporting took its worker down with it; that slot is marked dead and
    /// its descriptor keeps the score `0.0`.
    fn collect_finished(
        &mut self,
        completions: &Receiver<Completion<W>>,
        scores: &mut [f64],
        reporter: &ProgressReporter<'_>,
    ) {
        let ended: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot, state)| match state {
                Slot::Busy(in_flight) if in_flight.handle.is_finished() => Some(slot),
                _ => None,
            })
            .collect();

        while let Ok(completion) = completions.try_recv() {
            self.complete(completion, scores, reporter);
        }

        for slot in ended {
            if !matches!(self.slots[slot], Slot::Busy(_)) {
                continue;
            }
            if let Slot::Busy(in_flight) = mem::replace(&mut self.slots[slot], Slot::Dead) {
                let _ = in_flight.handle.join();
                warn!(
                    slot,
                    result_index = in_flight.assignment.result_index,
                    descriptor = %in_flight.assignment.descriptor,
                    "Scoring unit ended without a result; worker removed from rotation."
                );
                reporter.report(Progress::Message(format!(
                    "Worker {slot} failed while scoring '{}' and was removed from the pool",
                    in_flight.assignment.descriptor
                )));
                reporter.report(Progress::TaskIncrement);
            }
        }
    }

    fn wait_for_completion(
        &mut self,
        completions: &Receiver<Completion<W>>,
        scores: &mut [f64],
        reporter: &ProgressReporter<'_>,
    ) {
        match completions.recv_timeout(self.poll_interval) {
            Ok(completion) => self.complete(completion, scores, reporter),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {}
        }
    }
}

impl<W: Worker> Dispatcher for ParallelDispatcher<W> {
    #[instrument(skip_all, name = "parallel_dispatch", fields(batch = descriptors.len(), workers = self.slots.len()))]
    fn score_with_progress(
        &mut self,
        descriptors: &[String],
        reporter: &ProgressReporter<'_>,
    ) -> Result<Vec<f64>, EngineError> {
        reporter.report(Progress::TaskStart {
            total_steps: descriptors.len() as u64,
        });

        let mut scores = vec![0.0; descriptors.len()];
        let mut queue = WorkQueue::new(descriptors);
        let (tx, rx) = mpsc::channel();

        while !queue.is_empty() {
            self.collect_finished(&rx, &mut scores, reporter);

            let alive = self.alive_workers(reporter);
            if alive.is_empty() {
                error!(remaining = queue.len(), "All workers are dead; aborting batch.");
                return Err(EngineError::PoolExhausted {
                    remaining: queue.len(),
                });
            }

            for slot in alive {
                if queue.is_empty() {
                    break;
                }
                self.launch(slot, &mut queue, &tx);
            }

            self.wait_for_completion(&rx, &mut scores, reporter);
        }

        while self.busy_count() > 0 {
            self.collect_finished(&rx, &mut scores, reporter);
            if self.busy_count() == 0 {
                break;
            }
            self.wait_for_completion(&rx, &mut scores, reporter);
        }

        reporter.report(Progress::TaskFinish);
        info!(scored = scores.len(), "Batch scored by worker pool.");
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    type Behavior = Arc<dyn Fn(&str) -> f64 + Send + Sync>;

    struct MockWorker {
        slot: usize,
        behavior: Behavior,
        alive: bool,
        calls_left: Option<usize>,
        served: Arc<Mutex<Vec<usize>>>,
    }

    impl Worker for MockWorker {
        fn slot(&self) -> usize {
            self.slot
        }

        fn call(&mut self, descriptor: &str) -> f64 {
            self.served.lock().unwrap().push(self.slot);
            if let Some(left) = self.calls_left.as_mut() {
                *left = left.saturating_sub(1);
            }
            (self.behavior)(descriptor)
        }

        fn is_alive(&mut self) -> bool {
            self.alive && self.calls_left != Some(0)
        }
    }

    struct Pool {
        workers: Vec<MockWorker>,
        served: Arc<Mutex<Vec<usize>>>,
    }

    fn pool(size: usize, behavior: Behavior) -> Pool {
        let served = Arc::new(Mutex::new(Vec::new()));
        let workers = (0..size)
            .map(|slot| MockWorker {
                slot,
                behavior: behavior.clone(),
                alive: true,
                calls_left: None,
                served: served.clone(),
            })
            .collect();
        Pool { workers, served }
    }

    fn dispatcher(workers: Vec<MockWorker>) -> ParallelDispatcher<MockWorker> {
        ParallelDispatcher::from_workers(workers, Duration::from_millis(2))
    }

    fn batch(n: usize) -> Vec<String> {
        (0..n).map(|i| i.to_string()).collect()
    }

    fn index_score() -> Behavior {
        Arc::new(|descriptor: &str| descriptor.parse::<f64>().unwrap() / 100.0)
    }

    #[test]
    fn scores_stay_aligned_when_completion_order_is_scrambled() {
        let behavior: Behavior = Arc::new(|descriptor: &str| {
            let index: u64 = descriptor.parse().unwrap();
            thread::sleep(Duration::from_millis((index * 7 % 5) * 15));
            index as f64 / 100.0
        });
        let pool = pool(4, behavior);
        let descriptors = batch(12);
        let scores = dispatcher(pool.workers).score(&descriptors).unwrap();
        let expected: Vec<f64> = (0..12).map(|i| i as f64 / 100.0).collect();
        assert_eq!(scores, expected);
    }

    #[test]
    fn later_inputs_finishing_first_do_not_disturb_order() {
        let behavior: Behavior = Arc::new(|descriptor: &str| {
            let index: u64 = descriptor.parse().unwrap();
            thread::sleep(Duration::from_millis(if index < 2 { 80 } else { 1 }));
            index as f64 / 100.0
        });
        let pool = pool(3, behavior);
        let scores = dispatcher(pool.workers).score(&batch(6)).unwrap();
        assert_eq!(scores, vec![0.0, 0.01, 0.02, 0.03, 0.04, 0.05]);
    }

    #[test]
    fn empty_batch_returns_empty_scores() {
        let pool = pool(2, index_score());
        assert!(dispatcher(pool.workers).score(&[]).unwrap().is_empty());
    }

    #[test]
    fn fully_dead_pool_fails_without_partial_results() {
        let mut pool = pool(3, index_score());
        for worker in &mut pool.workers {
            worker.alive = false;
        }
        let result = dispatcher(pool.workers).score(&batch(5));
        assert!(matches!(
            result,
            Err(EngineError::PoolExhausted { remaining: 5 })
        ));
        assert!(pool.served.lock().unwrap().is_empty());
    }

    #[test]
    fn pool_dying_mid_batch_aborts_with_remaining_count() {
        let mut pool = pool(2, index_score());
        for worker in &mut pool.workers {
            worker.calls_left = Some(2);
        }
        let result = dispatcher(pool.workers).score(&batch(10));
        match result {
            Err(EngineError::PoolExhausted { remaining }) => assert_eq!(remaining, 6),
            other => panic!("expected pool exhaustion, got {other:?}"),
        }
        assert_eq!(pool.served.lock().unwrap().len(), 4);
    }

    #[test]
    fn dead_workers_are_skipped_while_survivors_finish_the_batch() {
        let mut pool = pool(3, index_score());
        pool.workers[1].alive = false;
        let scores = dispatcher(pool.workers).score(&batch(9)).unwrap();
        assert_eq!(scores, (0..9).map(|i| i as f64 / 100.0).collect::<Vec<_>>());
        let served = pool.served.lock().unwrap();
        assert_eq!(served.len(), 9);
        assert!(!served.contains(&1));
    }

    #[test]
    fn panicking_unit_marks_its_slot_dead_and_scores_zero() {
        let behavior: Behavior = Arc::new(|descriptor: &str| {
            if descriptor == "3" {
                panic!("oracle crashed");
            }
            descriptor.parse::<f64>().unwrap() / 100.0
        });
        let pool = pool(2, behavior);
        let mut dispatcher = dispatcher(pool.workers);
        let scores = dispatcher.score(&batch(6)).unwrap();
        assert_eq!(scores[3], 0.0);
        for i in [0usize, 1, 2, 4, 5] {
            assert_eq!(scores[i], i as f64 / 100.0);
        }
        assert_eq!(dispatcher.alive_workers(&ProgressReporter::new()).len(), 1);
    }

    #[test]
    fn concurrency_never_exceeds_pool_size() {
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let behavior: Behavior = {
            let current = current.clone();
            let peak = peak.clone();
            Arc::new(move |descriptor: &str| {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(5));
                current.fetch_sub(1, Ordering::SeqCst);
                descriptor.parse::<f64>().unwrap() / 100.0
            })
        };
        let pool = pool(3, behavior);
        dispatcher(pool.workers).score(&batch(20)).unwrap();
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn reports_one_increment_per_descriptor() {
        let increments = AtomicUsize::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if matches!(event, Progress::TaskIncrement) {
                increments.fetch_add(1, Ordering::SeqCst);
            }
        }));
        let pool = pool(3, index_score());
        dispatcher(pool.workers)
            .score_with_progress(&batch(7), &reporter)
            .unwrap();
        drop(reporter);
        assert_eq!(increments.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn dead_and_failed_workers_are_announced_to_the_reporter() {
        let messages = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::Message(msg) = event {
                messages.lock().unwrap().push(msg);
            }
        }));
        let behavior: Behavior = Arc::new(|descriptor: &str| {
            if descriptor == "2" {
                panic!("oracle crashed");
            }
            descriptor.parse::<f64>().unwrap() / 100.0
        });
        let mut pool = pool(3, behavior);
        pool.workers[1].alive = false;
        let scores = dispatcher(pool.workers)
            .score_with_progress(&batch(6), &reporter)
            .unwrap();
        drop(reporter);
        assert_eq!(scores[2], 0.0);

        let messages = messages.into_inner().unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().any(|m| m.starts_with("Worker 1 died")));
        assert!(messages.iter().any(|m| m.contains("while scoring '2'")));
    }

    #[test]
    fn dispatcher_is_reusable_across_batches() {
        let pool = pool(2, index_score());
        let mut dispatcher = dispatcher(pool.workers);
        assert_eq!(dispatcher.score(&batch(3)).unwrap(), vec![0.0, 0.01, 0.02]);
        assert_eq!(dispatcher.score(&batch(2)).unwrap(), vec![0.0, 0.01]);
        assert_eq!(dispatcher.pool_size(), 2);
    }

    #[test]
    fn work_queue_pops_from_the_back_with_matching_indices() {
        let descriptors = batch(3);
        let mut queue = WorkQueue::new(&descriptors);
        assert_eq!(queue.pop(), Some((2, "2")));
        assert_eq!(queue.len(), 2);
        queue.restore(2);
        assert_eq!(queue.pop(), Some((2, "2")));
        assert_eq!(queue.pop(), Some((1, "1")));
        assert_eq!(queue.pop(), Some((0, "0")));
        assert_eq!(queue.pop(), None);
    }

    #[cfg(unix)]
    mod subprocess {
        use super::*;
        use std::process::Command;
        use std::time::Instant;

        fn sh_worker(slot: usize, script: &str) -> ProcessWorker {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(script);
            ProcessWorker::from_command(slot, cmd, Duration::from_secs(5)).unwrap()
        }

        #[test]
        fn process_pool_returns_echoed_scores_in_order() {
            let workers: Vec<ProcessWorker> = (0..3)
                .map(|slot| sh_worker(slot, r#"while read l; do echo "$l 0.$l"; done"#))
                .collect();
            let mut dispatcher = ParallelDispatcher::from_workers(workers, Duration::from_millis(5));
            let scores = dispatcher.score(&batch(8)).unwrap();
            let expected: Vec<f64> = (0..8).map(|i| format!("0.{i}").parse().unwrap()).collect();
            assert_eq!(scores, expected);
        }

        #[test]
        fn exited_processes_exhaust_the_pool() {
            let mut workers: Vec<ProcessWorker> = (0..2).map(|slot| sh_worker(slot, "exit 1")).collect();
            let deadline = Instant::now() + Duration::from_secs(5);
            while workers.iter_mut().any(|w| w.is_alive()) && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            let mut dispatcher = ParallelDispatcher::from_workers(workers, Duration::from_millis(5));
            assert!(matches!(
                dispatcher.score(&batch(4)),
                Err(EngineError::PoolExhausted { remaining: 4 })
            ));
        }
    }
}
