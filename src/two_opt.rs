//! Steepest-improvement 2-opt local search, one segment reversal per step.

use crate::config::{StrategyKind, TwoOptConfig};
use crate::error::TspResult;
use crate::graph::CityGraph;
use crate::optimizer::{CancelToken, Optimizer, RunState, StepEvent, StepResult};
use crate::tour::{random_tour, Tour};
use crate::utils::{require_tour_graph, seeded_rng};
use std::sync::Arc;

/// A reversal must shorten the tour by more than this to be accepted.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Sweeps every segment `i..=k` of a single tour, reversing it whenever that
/// strictly shortens the tour and restarting the sweep after each improvement.
pub struct TwoOptOptimizer {
    graph: Arc<CityGraph>,
    current: Tour,
    i: usize,
    k: usize,
    run: RunState,
}

impl TwoOptOptimizer {
    /// Start from a uniformly random permutation.
    pub fn new(graph: Arc<CityGraph>, config: &TwoOptConfig) -> TspResult<Self> {
        config.validate()?;
        require_tour_graph(&graph)?;

        let mut rng = seeded_rng(config.seed);
        let order = random_tour(graph.len(), &mut rng);
        Self::with_initial_tour(graph, order)
    }

    /// Start from a caller-supplied tour.
    pub fn with_initial_tour(graph: Arc<CityGraph>, order: Vec<usize>) -> TspResult<Self> {
        require_tour_graph(&graph)?;
        let length = graph.tour_length(&order)?;
        let n = order.len();

        let mut run = RunState::new(CancelToken::new());
        // With three or fewer cities every visiting order has the same length.
        if n <= 3 {
            run.complete();
        }

        log::info!("two_opt: start cities={} length={:.2}", n, length);

        Ok(TwoOptOptimizer {
            graph,
            current: Tour::new(order, length),
            i: 1,
            k: 2,
            run,
        })
    }

    /// The segment `(i, k)` the next step will try to reverse.
    pub fn cursor(&self) -> (usize, usize) {
        (self.i, self.k)
    }

    /// Change in length from reversing positions `i..=k`, using only the two
    /// edges that the reversal replaces.
    fn reversal_delta(&self, i: usize, k: usize) -> f64 {
        let order = &self.current.order;
        let n = order.len();
        let before = order[i - 1];
        let after = order[(k + 1) % n];

        // Reversing everything but position 0 yields the same cycle backwards.
        if after == before {
            return 0.0;
        }

        let first = order[i];
        let last = order[k];

        let old_cost = self.graph.distance(before, first) + self.graph.distance(last, after);
        let new_cost = self.graph.distance(before, last) + self.graph.distance(first, after);

        new_cost - old_cost
    }

    /// Reverse `i..=k` when that strictly shortens the tour.
    fn try_reversal(&mut self, i: usize, k: usize) -> bool {
        if self.reversal_delta(i, k) >= 0.0 {
            return false;
        }

        self.current.order[i..=k].reverse();
        let length = self.graph.cycle_length(&self.current.order);

        if length < self.current.length - IMPROVEMENT_EPSILON {
            self.current.length = length;
            true
        } else {
            self.current.order[i..=k].reverse();
            false
        }
    }

    fn advance_cursor(&mut self) {
        self.k += 1;
        if self.k >= self.current.len() {
            self.i += 1;
            self.k = self.i + 1;
        }
    }

    fn report(&self, event: StepEvent) -> StepResult {
        StepResult::new(
            StrategyKind::TwoOpt,
            &self.run,
            Some(&self.current),
            self.current.length,
            event,
        )
    }
}

impl Optimizer for TwoOptOptimizer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TwoOpt
    }

    fn step(&mut self) -> TspResult<StepResult> {
        if let Some(event) = self.run.enter("two_opt")? {
            return Ok(self.report(event));
        }

        let (i, k) = (self.i, self.k);
        let event = if self.try_reversal(i, k) {
            log::debug!(
                "two_opt: improved length={:.2} segment={}..={}",
                self.current.length,
                i,
                k
            );
            self.i = 1;
            self.k = 2;
            StepEvent::Improved
        } else {
            self.advance_cursor();
            StepEvent::NoImprovement
        };

        if self.i >= self.current.len() - 1 {
            self.run.complete();
            log::info!(
                "two_opt: complete steps={} length={:.2}",
                self.run.steps(),
                self.current.length
            );
        }

        Ok(self.report(event))
    }

    fn is_terminal(&self) -> bool {
        self.run.is_terminal()
    }

    fn best_tour(&self) -> Option<&Tour> {
        Some(&self.current)
    }

    fn cancel_token(&self) -> CancelToken {
        self.run.cancel_token().clone()
    }
}
