//! The step/result contract shared by every tour optimizer.
//!
//! A host drives an optimizer by calling [`Optimizer::step`] repeatedly. Each
//! call performs one bounded unit of work (one 2-opt trial, one generation,
//! one swarm iteration) and returns a [`StepResult`] describing the best tour
//! found so far. Cancellation is cooperative: a [`CancelToken`] is checked at
//! the start of every step.

use crate::config::StrategyKind;
use crate::error::{TspError, TspResult};
use crate::tour::Tour;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag a host sets to stop a run at its next step.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// What a single call to `step()` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepEvent {
    /// The best-known tour got shorter.
    Improved,
    /// Work was done but the best-known tour is unchanged.
    NoImprovement,
    /// The run had already finished; nothing was done.
    Completed,
    /// The run was cancelled; nothing was done.
    Cancelled,
}

/// Progress report handed to the host after every step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub strategy: StrategyKind,
    /// Number of units of work performed so far, this one included.
    pub step_index: usize,
    /// Best tour found so far; empty when nothing has been evaluated yet.
    pub tour: Vec<usize>,
    /// Length of `tour`, infinite when nothing has been evaluated yet.
    pub length: f64,
    /// Length of the transient search state (current tour, generation best or iteration best).
    pub current_length: f64,
    pub event: StepEvent,
    pub is_terminal: bool,
}

impl StepResult {
    pub(crate) fn new(
        strategy: StrategyKind,
        run: &RunState,
        best: Option<&Tour>,
        current_length: f64,
        event: StepEvent,
    ) -> Self {
        StepResult {
            strategy,
            step_index: run.steps(),
            tour: best.map(|t| t.order.clone()).unwrap_or_default(),
            length: best.map_or(f64::INFINITY, |t| t.length),
            current_length,
            event,
            is_terminal: run.is_terminal(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Status {
    Running,
    Completed,
    Cancelled,
    Failed(TspError),
}

/// Lifecycle bookkeeping embedded in every stepper.
#[derive(Debug)]
pub(crate) struct RunState {
    cancel: CancelToken,
    status: Status,
    steps: usize,
}

impl RunState {
    pub(crate) fn new(cancel: CancelToken) -> Self {
        RunState {
            cancel,
            status: Status::Running,
            steps: 0,
        }
    }

    /// Called at the top of `step()`. Returns the event to report without doing
    /// any work when the run is over, or the stored error when it failed.
    pub(crate) fn enter(&mut self, component: &str) -> TspResult<Option<StepEvent>> {
        match &self.status {
            Status::Failed(err) => return Err(err.clone()),
            Status::Completed => return Ok(Some(StepEvent::Completed)),
            Status::Cancelled => return Ok(Some(StepEvent::Cancelled)),
            Status::Running => {}
        }

        if self.cancel.is_cancelled() {
            log::info!("{}: cancelled after {} steps", component, self.steps);
            self.status = Status::Cancelled;
            return Ok(Some(StepEvent::Cancelled));
        }

        self.steps += 1;
        Ok(None)
    }

    pub(crate) fn complete(&mut self) {
        if self.status == Status::Running {
            self.status = Status::Completed;
        }
    }

    /// Record a fatal error; every later `enter` returns it again.
    pub(crate) fn fail(&mut self, err: TspError) -> TspError {
        self.status = Status::Failed(err.clone());
        err
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.status != Status::Running
    }

    pub(crate) fn steps(&self) -> usize {
        self.steps
    }

    pub(crate) fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

/// The capability set shared by the 2-opt, genetic and particle-swarm optimizers.
pub trait Optimizer {
    fn kind(&self) -> StrategyKind;

    /// Perform one bounded unit of work and report progress.
    fn step(&mut self) -> TspResult<StepResult>;

    fn is_terminal(&self) -> bool;

    /// Best tour found so far.
    fn best_tour(&self) -> Option<&Tour>;

    fn best_length(&self) -> f64 {
        self.best_tour().map_or(f64::INFINITY, |t| t.length)
    }

    /// A clone of the token checked at the start of every step.
    fn cancel_token(&self) -> CancelToken;

    /// Request that the next `step()` stop the run.
    fn cancel(&self) {
        self.cancel_token().cancel();
    }
}

/// Owns one running optimizer of any strategy.
pub struct OptimizerHandle {
    optimizer: Box<dyn Optimizer>,
}

impl OptimizerHandle {
    pub fn new<O: Optimizer + 'static>(optimizer: O) -> Self {
        OptimizerHandle {
            optimizer: Box::new(optimizer),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        self.optimizer.kind()
    }

    pub fn step(&mut self) -> TspResult<StepResult> {
        self.optimizer.step()
    }

    pub fn is_terminal(&self) -> bool {
        self.optimizer.is_terminal()
    }

    pub fn best_tour(&self) -> Option<&Tour> {
        self.optimizer.best_tour()
    }

    pub fn best_length(&self) -> f64 {
        self.optimizer.best_length()
    }

    pub fn cancel(&self) {
        self.optimizer.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.optimizer.cancel_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tour::PermutationDefect;

    fn create_test_failure() -> TspError {
        TspError::InvalidTourState {
            step: 3,
            operation: "order crossover",
            defect: PermutationDefect::Duplicate { city: 4 },
        }
    }

    #[test]
    fn test_failed_run_repeats_its_error() {
        let mut run = RunState::new(CancelToken::new());
        assert_eq!(run.enter("test"), Ok(None));
        assert_eq!(run.enter("test"), Ok(None));

        let err = run.fail(create_test_failure());
        assert_eq!(err, create_test_failure());
        assert!(run.is_terminal());

        for _ in 0..3 {
            assert_eq!(run.enter("test"), Err(create_test_failure()));
        }
        assert_eq!(run.steps(), 2);
    }

    #[test]
    fn test_failure_outranks_cancel_and_complete() {
        let cancel = CancelToken::new();
        let mut run = RunState::new(cancel.clone());
        run.enter("test").unwrap();
        run.fail(create_test_failure());

        cancel.cancel();
        run.complete();

        assert_eq!(run.enter("test"), Err(create_test_failure()));
        assert_eq!(run.steps(), 1);
    }

    #[test]
    fn test_completed_and_cancelled_runs_do_no_work() {
        let mut done = RunState::new(CancelToken::new());
        done.enter("test").unwrap();
        done.complete();
        assert_eq!(done.enter("test"), Ok(Some(StepEvent::Completed)));
        assert_eq!(done.steps(), 1);

        let cancel = CancelToken::new();
        let mut stopped = RunState::new(cancel.clone());
        cancel.cancel();
        assert_eq!(stopped.enter("test"), Ok(Some(StepEvent::Cancelled)));
        assert_eq!(stopped.enter("test"), Ok(Some(StepEvent::Cancelled)));
        assert_eq!(stopped.steps(), 0);
    }
}
