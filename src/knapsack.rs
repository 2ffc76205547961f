//! Genetic search for a subset of item values hitting a target sum.
//!
//! The same stepper shape as the tour optimizers, over fixed-length boolean
//! genomes scored by their distance from the target.

use crate::config::KnapsackConfig;
use crate::error::{TspError, TspResult};
use crate::optimizer::{CancelToken, RunState, StepEvent};
use crate::utils::seeded_rng;
use rand::seq::index;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::ops::RangeInclusive;

/// Number of items in a generated instance.
pub const DEFAULT_ITEM_COUNT: usize = 100;
/// Range item values are drawn from.
pub const DEFAULT_VALUE_RANGE: RangeInclusive<u64> = 100..=2000;
/// Share of the items whose values make up a generated target.
pub const DEFAULT_TARGET_RATIO: f64 = 0.75;

/// Item values and the sum a selection should reach.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnapsackInstance {
    values: Vec<u64>,
    target: u64,
}

impl KnapsackInstance {
    pub fn new(values: Vec<u64>, target: u64) -> TspResult<Self> {
        if values.is_empty() {
            return Err(TspError::invalid_config("values", "must contain at least one item"));
        }
        Ok(KnapsackInstance { values, target })
    }

    /// Random item values, with a target that a random `target_ratio` share of the items reaches.
    pub fn generate<R: Rng + ?Sized>(
        item_count: usize,
        value_range: RangeInclusive<u64>,
        target_ratio: f64,
        rng: &mut R,
    ) -> TspResult<Self> {
        if item_count == 0 {
            return Err(TspError::invalid_config("item_count", "must be at least 1"));
        }
        if value_range.is_empty() {
            return Err(TspError::invalid_config("value_range", "must not be empty"));
        }
        if !(0.0..=1.0).contains(&target_ratio) {
            return Err(TspError::invalid_config(
                "target_ratio",
                format!("must lie in [0, 1], got {}", target_ratio),
            ));
        }

        let values: Vec<u64> = (0..item_count)
            .map(|_| rng.gen_range(value_range.clone()))
            .collect();
        let chosen = (item_count as f64 * target_ratio) as usize;
        let target: u64 = index::sample(rng, item_count, chosen)
            .into_iter()
            .map(|i| values[i])
            .sum();

        Self::new(values, target)
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    /// Sum of the values a genome selects.
    pub fn evaluate(&self, genome: &[bool]) -> u64 {
        self.values
            .iter()
            .zip(genome)
            .filter(|(_, &selected)| selected)
            .map(|(&value, _)| value)
            .sum()
    }

    /// How far a genome's sum is from the target.
    pub fn distance(&self, genome: &[bool]) -> u64 {
        self.evaluate(genome).abs_diff(self.target)
    }
}

/// A scored genome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub genome: Vec<bool>,
    pub value: u64,
    pub distance: u64,
}

impl Selection {
    fn new(genome: Vec<bool>, instance: &KnapsackInstance) -> Self {
        let value = instance.evaluate(&genome);
        Selection {
            distance: value.abs_diff(instance.target),
            genome,
            value,
        }
    }

    /// Indices of the selected items.
    pub fn selected_items(&self) -> Vec<usize> {
        self.genome
            .iter()
            .enumerate()
            .filter(|(_, &selected)| selected)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Progress report for one knapsack generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnapsackStep {
    pub generation: usize,
    pub best: Option<Selection>,
    pub event: StepEvent,
    pub is_terminal: bool,
}

/// Stateful stepper over a population of boolean genomes.
pub struct KnapsackOptimizer {
    instance: KnapsackInstance,
    config: KnapsackConfig,
    population: Vec<Vec<bool>>,
    best: Option<Selection>,
    generation: usize,
    rng: ChaCha8Rng,
    run: RunState,
}

impl KnapsackOptimizer {
    pub fn new(instance: KnapsackInstance, config: KnapsackConfig) -> TspResult<Self> {
        config.validate()?;

        let mut rng = seeded_rng(config.seed);
        let genes = instance.values.len();
        let population = (0..config.population_size)
            .map(|_| (0..genes).map(|_| rng.gen_bool(0.5)).collect())
            .collect();

        log::info!(
            "knapsack: start items={} target={} population={}",
            genes,
            instance.target,
            config.population_size
        );

        Ok(KnapsackOptimizer {
            instance,
            config,
            population,
            best: None,
            generation: 0,
            rng,
            run: RunState::new(CancelToken::new()),
        })
    }

    pub fn instance(&self) -> &KnapsackInstance {
        &self.instance
    }

    /// Best selection seen in any generation.
    pub fn best(&self) -> Option<&Selection> {
        self.best.as_ref()
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn is_terminal(&self) -> bool {
        self.run.is_terminal()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.run.cancel_token().clone()
    }

    pub fn cancel(&self) {
        self.run.cancel_token().cancel();
    }

    /// Run one generation.
    pub fn step(&mut self) -> TspResult<KnapsackStep> {
        if let Some(event) = self.run.enter("knapsack")? {
            return Ok(self.report(event));
        }

        let instance = &self.instance;
        self.population
            .sort_by_cached_key(|genome| instance.distance(genome));

        let leader = Selection::new(self.population[0].clone(), &self.instance);
        let improved = self.best.as_ref().map_or(true, |b| leader.distance < b.distance);
        if improved {
            log::debug!(
                "knapsack: generation={} value={} distance={}",
                self.generation + 1,
                leader.value,
                leader.distance
            );
            self.best = Some(leader);
        }

        self.generation += 1;

        let solved = self.best.as_ref().map_or(false, |b| b.distance == 0);
        if solved || self.generation >= self.config.generations {
            self.run.complete();
            log::info!(
                "knapsack: complete generations={} solved={}",
                self.generation,
                solved
            );
        } else {
            self.breed();
        }

        let event = if improved {
            StepEvent::Improved
        } else {
            StepEvent::NoImprovement
        };
        Ok(self.report(event))
    }

    /// Replace the (sorted) population with elites plus mutated crossover children.
    fn breed(&mut self) {
        let size = self.config.population_size;
        let elite_count = (self.config.elitism_ratio * size as f64) as usize;
        let pool = self.config.parent_pool.min(size);

        let mut next: Vec<Vec<bool>> = self.population[..elite_count].to_vec();
        while next.len() < size {
            let parent_a = &self.population[self.rng.gen_range(0..pool)];
            let parent_b = &self.population[self.rng.gen_range(0..pool)];

            let split = self.rng.gen_range(0..parent_a.len());
            let mut child: Vec<bool> = parent_a[..split]
                .iter()
                .chain(&parent_b[split..])
                .copied()
                .collect();

            if self.rng.gen::<f64>() < self.config.mutation_rate {
                let gene = self.rng.gen_range(0..child.len());
                child[gene] = !child[gene];
            }
            next.push(child);
        }

        self.population = next;
    }

    fn report(&self, event: StepEvent) -> KnapsackStep {
        KnapsackStep {
            generation: self.generation,
            best: self.best.clone(),
            event,
            is_terminal: self.run.is_terminal(),
        }
    }
}
