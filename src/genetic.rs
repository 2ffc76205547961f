//! Generational genetic algorithm over tours.
//!
//! One step is one full generation: evaluate, roulette-select, order
//! crossover, swap mutation. The population itself is not elitist; the best
//! tour ever evaluated is tracked separately and is what the run reports.

use crate::config::{GeneticConfig, StrategyKind};
use crate::error::{TspError, TspResult};
use crate::graph::CityGraph;
use crate::optimizer::{CancelToken, Optimizer, RunState, StepEvent, StepResult};
use crate::population::{roulette_select, Population};
use crate::tour::{check_permutation, Tour};
use crate::utils::{require_tour_graph, seeded_rng};
use itertools::Itertools;
use rand::seq::index;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// Build one order-crossover child: `donor[start..=end]` is copied verbatim and
/// the remaining slots, starting after `end` and wrapping, are filled with the
/// genes of `filler` in the cyclic order they appear after `end`, skipping
/// genes already placed.
///
/// Slots that cannot be filled (only possible when the parents are not
/// permutations of the same cities) keep the sentinel `usize::MAX`.
pub fn order_crossover_child(donor: &[usize], filler: &[usize], start: usize, end: usize) -> Vec<usize> {
    let size = donor.len();
    let mut child = vec![usize::MAX; size];
    let mut placed = vec![false; size];

    child[start..=end].copy_from_slice(&donor[start..=end]);
    for &gene in &donor[start..=end] {
        if let Some(flag) = placed.get_mut(gene) {
            *flag = true;
        }
    }

    let mut slot = (end + 1) % size;
    for offset in 1..=filler.len() {
        let gene = filler[(end + offset) % filler.len()];
        if gene < size && !placed[gene] {
            child[slot] = gene;
            placed[gene] = true;
            slot = (slot + 1) % size;
        }
    }

    child
}

/// Order crossover (OX) on a random segment, producing one child per parent.
pub fn order_crossover<R: Rng + ?Sized>(
    parent_a: &[usize],
    parent_b: &[usize],
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let size = parent_a.len();
    if size < 2 {
        return (parent_a.to_vec(), parent_b.to_vec());
    }

    // Two distinct cut points.
    let (start, end) = index::sample(rng, size, 2)
        .into_iter()
        .minmax()
        .into_option()
        .unwrap_or((0, size - 1));

    (
        order_crossover_child(parent_a, parent_b, start, end),
        order_crossover_child(parent_b, parent_a, start, end),
    )
}

/// With probability `rate`, swap two distinct positions. Returns whether a swap happened.
pub fn swap_mutation<R: Rng + ?Sized>(tour: &mut [usize], rate: f64, rng: &mut R) -> bool {
    if tour.len() < 2 || rng.gen::<f64>() >= rate {
        return false;
    }

    let picks = index::sample(rng, tour.len(), 2);
    tour.swap(picks.index(0), picks.index(1));
    true
}

/// Stateful stepper over a population of tours.
pub struct GeneticOptimizer {
    graph: Arc<CityGraph>,
    config: GeneticConfig,
    population: Population,
    global_best: Option<Tour>,
    generation: usize,
    generation_best: f64,
    rng: ChaCha8Rng,
    run: RunState,
}

impl GeneticOptimizer {
    pub fn new(graph: Arc<CityGraph>, config: GeneticConfig) -> TspResult<Self> {
        config.validate()?;
        require_tour_graph(&graph)?;

        let mut rng = seeded_rng(config.seed);
        let population = Population::random(config.population_size, graph.len(), &mut rng);

        log::info!(
            "genetic: start cities={} population={} generations={} mutation_rate={}",
            graph.len(),
            config.population_size,
            config.generations,
            config.mutation_rate
        );

        Ok(GeneticOptimizer {
            graph,
            config,
            population,
            global_best: None,
            generation: 0,
            generation_best: f64::INFINITY,
            rng,
            run: RunState::new(CancelToken::new()),
        })
    }

    /// Number of generations completed.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// The generation that the next step will evaluate.
    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    /// Run one generation. Returns whether the global best improved.
    fn evolve(&mut self) -> TspResult<bool> {
        let size = self.config.population_size;
        let population = std::mem::replace(&mut self.population, Population::from_tours(Vec::new()));

        // Evaluate
        let individuals = population.evaluate(&self.graph);
        let mut improved = false;
        if let Some(best) = individuals.iter().min() {
            self.generation_best = best.length;
            if self.global_best.as_ref().map_or(true, |g| best.length < g.length) {
                self.global_best = Some(best.to_tour());
                improved = true;
            }
        }

        // Select
        let selected = roulette_select(&individuals, size, &mut self.rng);

        // Crossover: consecutive pairs, the odd one out pairs with the first parent.
        let mut offspring = Vec::with_capacity(size + 1);
        for first in (0..size).step_by(2) {
            let parent_a = &selected[first];
            let parent_b = selected.get(first + 1).unwrap_or(&selected[0]);
            let (child_a, child_b) = order_crossover(parent_a, parent_b, &mut self.rng);
            offspring.push(child_a);
            offspring.push(child_b);
        }
        offspring.truncate(size);

        for child in &offspring {
            self.check_tour(child, "order crossover")?;
        }

        // Mutate
        for child in offspring.iter_mut() {
            swap_mutation(child, self.config.mutation_rate, &mut self.rng);
        }

        for child in &offspring {
            self.check_tour(child, "swap mutation")?;
        }

        self.population = Population::from_tours(offspring);
        Ok(improved)
    }

    fn check_tour(&self, tour: &[usize], operation: &'static str) -> TspResult<()> {
        check_permutation(tour, self.graph.len()).map_err(|defect| TspError::InvalidTourState {
            step: self.generation,
            operation,
            defect,
        })
    }

    fn report(&self, event: StepEvent) -> StepResult {
        StepResult::new(
            StrategyKind::Genetic,
            &self.run,
            self.global_best.as_ref(),
            self.generation_best,
            event,
        )
    }
}

impl Optimizer for GeneticOptimizer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Genetic
    }

    fn step(&mut self) -> TspResult<StepResult> {
        if let Some(event) = self.run.enter("genetic")? {
            return Ok(self.report(event));
        }

        let improved = match self.evolve() {
            Ok(improved) => improved,
            Err(err) => {
                log::error!("genetic: {}", err);
                return Err(self.run.fail(err));
            }
        };

        self.generation += 1;

        log::debug!(
            "genetic: generation={} generation_best={:.2} global_best={:.2} distinct={}",
            self.generation,
            self.generation_best,
            self.best_length(),
            self.population.distinct_count()
        );

        if self.generation >= self.config.generations {
            self.run.complete();
            log::info!(
                "genetic: complete generations={} length={:.2}",
                self.generation,
                self.best_length()
            );
        }

        let event = if improved {
            StepEvent::Improved
        } else {
            StepEvent::NoImprovement
        };
        Ok(self.report(event))
    }

    fn is_terminal(&self) -> bool {
        self.run.is_terminal()
    }

    fn best_tour(&self) -> Option<&Tour> {
        self.global_best.as_ref()
    }

    fn cancel_token(&self) -> CancelToken {
        self.run.cancel_token().clone()
    }
}
