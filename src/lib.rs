//! # TSP heuristics
//!
//! Resumable heuristics for the Euclidean Traveling Salesman Problem, built
//! to be driven one step at a time by a host that renders progress:
//!
//! - [`two_opt::TwoOptOptimizer`]: exhaustive 2-opt segment-reversal sweep
//! - [`genetic::GeneticOptimizer`]: generational GA with roulette selection and order crossover
//! - [`swarm::ParticleSwarmOptimizer`]: particle swarm adapted (lossily) to permutations
//!
//! All three implement [`optimizer::Optimizer`], so a host can treat them
//! uniformly through an [`optimizer::OptimizerHandle`]. Every step leaves the
//! working tours valid permutations of all cities.
//!
//! Two smaller demos share the same building blocks: a dynamic-programming
//! [`subset_sum::SubsetSumSolver`] and a boolean-genome
//! [`knapsack::KnapsackOptimizer`].

pub mod config;
pub mod error;
pub mod genetic;
pub mod graph;
pub mod individual;
pub mod knapsack;
pub mod optimizer;
pub mod population;
pub mod render;
pub mod subset_sum;
pub mod swarm;
pub mod tour;
pub mod two_opt;
pub mod utils;

use crate::config::{GeneticConfig, Strategy, SwarmConfig, TwoOptConfig};
use crate::error::{TspError, TspResult};
use crate::genetic::GeneticOptimizer;
use crate::graph::{Bounds, CityGraph};
use crate::optimizer::{OptimizerHandle, StepResult};
use crate::render::Renderer;
use crate::swarm::ParticleSwarmOptimizer;
use crate::two_opt::TwoOptOptimizer;
use crate::utils::seeded_rng;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// Place `count` cities uniformly at random within `bounds`.
pub fn generate_cities(count: usize, bounds: Bounds, seed: Option<u64>) -> TspResult<CityGraph> {
    CityGraph::generate(count, bounds, &mut seeded_rng(seed))
}

/// Start a 2-opt run from a random tour.
pub fn start_two_opt(graph: Arc<CityGraph>, config: TwoOptConfig) -> TspResult<OptimizerHandle> {
    Ok(OptimizerHandle::new(TwoOptOptimizer::new(graph, &config)?))
}

/// Start a genetic run.
pub fn start_genetic(graph: Arc<CityGraph>, config: GeneticConfig) -> TspResult<OptimizerHandle> {
    Ok(OptimizerHandle::new(GeneticOptimizer::new(graph, config)?))
}

/// Start a particle-swarm run.
pub fn start_pso(graph: Arc<CityGraph>, config: SwarmConfig) -> TspResult<OptimizerHandle> {
    Ok(OptimizerHandle::new(ParticleSwarmOptimizer::new(graph, config)?))
}

/// Start whichever optimizer `strategy` selects.
pub fn start(graph: Arc<CityGraph>, strategy: Strategy) -> TspResult<OptimizerHandle> {
    match strategy {
        Strategy::TwoOpt(config) => start_two_opt(graph, config),
        Strategy::Genetic(config) => start_genetic(graph, config),
        Strategy::Swarm(config) => start_pso(graph, config),
    }
}

/// Owns the current city layout and at most one active run, and drives that
/// run step by step, forwarding every result to a [`Renderer`].
pub struct OptimizationController {
    graph: Option<Arc<CityGraph>>,
    active: Option<OptimizerHandle>,
    rng: ChaCha8Rng,
}

impl OptimizationController {
    /// A seeded controller derives city layouts and per-run seeds deterministically.
    pub fn new(seed: Option<u64>) -> Self {
        OptimizationController {
            graph: None,
            active: None,
            rng: seeded_rng(seed),
        }
    }

    /// Replace the city layout with freshly generated cities. Any active run is discarded.
    pub fn generate_cities(&mut self, count: usize, bounds: Bounds) -> TspResult<Arc<CityGraph>> {
        let graph = CityGraph::generate(count, bounds, &mut self.rng)?;
        log::info!("controller: generated {} cities", graph.len());
        Ok(self.load_cities(graph))
    }

    /// Replace the city layout. Any active run is discarded.
    pub fn load_cities(&mut self, graph: CityGraph) -> Arc<CityGraph> {
        self.discard_run();
        let graph = Arc::new(graph);
        self.graph = Some(Arc::clone(&graph));
        graph
    }

    pub fn graph(&self) -> Option<&Arc<CityGraph>> {
        self.graph.as_ref()
    }

    /// Start a fresh run on the current cities, discarding any previous run.
    ///
    /// A strategy without a seed receives one derived from the controller's generator.
    /// An invalid strategy leaves the current run in place.
    pub fn start(&mut self, strategy: Strategy) -> TspResult<&mut OptimizerHandle> {
        strategy.validate()?;
        self.discard_run();

        let graph = self
            .graph
            .clone()
            .ok_or_else(|| TspError::InvalidGraph("no cities have been generated".to_string()))?;
        let strategy = strategy.with_default_seed(self.rng.gen());

        log::info!("controller: starting {} on {} cities", strategy.kind(), graph.len());
        Ok(self.active.insert(start(graph, strategy)?))
    }

    pub fn active(&mut self) -> Option<&mut OptimizerHandle> {
        self.active.as_mut()
    }

    /// Ask the active run to stop at its next step.
    pub fn cancel(&self) {
        if let Some(handle) = &self.active {
            handle.cancel();
        }
    }

    fn discard_run(&mut self) {
        if let Some(handle) = self.active.take() {
            if !handle.is_terminal() {
                log::debug!("controller: discarding unfinished {} run", handle.kind());
            }
        }
    }

    /// Step the active run until it is terminal, rendering every result.
    ///
    /// After `max_steps` steps the run is cancelled cooperatively and its
    /// terminal result returned. Any error discards the run.
    pub fn run<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        max_steps: Option<usize>,
    ) -> TspResult<StepResult> {
        let result = self.drive(renderer, max_steps);
        if result.is_err() {
            self.discard_run();
        }
        result
    }

    fn drive<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        max_steps: Option<usize>,
    ) -> TspResult<StepResult> {
        let graph = self
            .graph
            .clone()
            .ok_or_else(|| TspError::InvalidGraph("no cities have been generated".to_string()))?;
        let handle = self
            .active
            .as_mut()
            .ok_or_else(|| TspError::invalid_config("strategy", "no run has been started"))?;

        let mut steps = 0;
        loop {
            if max_steps.map_or(false, |cap| steps >= cap) {
                handle.cancel();
            }

            let result = handle.step()?;
            steps += 1;
            renderer.render(&graph, &result)?;

            if result.is_terminal {
                return Ok(result);
            }
        }
    }
}
