//! Configuration parameters for the optimizers and the command-line driver.

use crate::error::{TspError, TspResult};
use crate::graph::Bounds;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Configuration for the 2-opt local search. Only the initial shuffle is random.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoOptConfig {
    /// Seed for the initial shuffle; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl TwoOptConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        TwoOptConfig::default()
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> TspResult<()> {
        Ok(())
    }
}

/// Configuration settings for the generational genetic algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    /// Number of tours in every generation (P)
    pub population_size: usize,
    /// Number of generations before the run terminates (G)
    pub generations: usize,
    /// Probability that an individual receives one swap mutation (m)
    pub mutation_rate: f64,
    /// Seed for all random draws; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        GeneticConfig {
            population_size: 100,
            generations: 500,
            mutation_rate: 0.01,
            seed: None,
        }
    }
}

impl GeneticConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        GeneticConfig::default()
    }

    /// Set the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Set the generation cap.
    pub fn with_generations(mut self, generations: usize) -> Self {
        self.generations = generations;
        self
    }

    /// Set the per-individual mutation probability.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> TspResult<()> {
        if self.population_size < 2 {
            return Err(TspError::invalid_config(
                "population_size",
                format!("must be at least 2, got {}", self.population_size),
            ));
        }
        if self.generations < 1 {
            return Err(TspError::invalid_config("generations", "must be at least 1"));
        }
        check_probability("mutation_rate", self.mutation_rate)
    }
}

/// Configuration settings for the permutation-adapted particle swarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    /// Number of particles (N)
    pub particle_count: usize,
    /// Number of iterations before the run terminates (I)
    pub iterations: usize,
    /// Weight on the prior velocity
    pub inertia: f64,
    /// Weight on the pull toward the particle's personal best (c1)
    pub cognitive: f64,
    /// Weight on the pull toward the swarm's global best (c2)
    pub social: f64,
    /// Seed for all random draws; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        SwarmConfig {
            particle_count: 30,
            iterations: 100,
            inertia: 1.0,
            cognitive: 1.0,
            social: 1.0,
            seed: None,
        }
    }
}

impl SwarmConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        SwarmConfig::default()
    }

    /// Set the number of particles.
    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count;
        self
    }

    /// Set the iteration cap.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the inertia, cognitive and social weights.
    pub fn with_weights(mut self, inertia: f64, cognitive: f64, social: f64) -> Self {
        self.inertia = inertia;
        self.cognitive = cognitive;
        self.social = social;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> TspResult<()> {
        if self.particle_count < 1 {
            return Err(TspError::invalid_config("particle_count", "must be at least 1"));
        }
        if self.iterations < 1 {
            return Err(TspError::invalid_config("iterations", "must be at least 1"));
        }
        check_weight("inertia", self.inertia)?;
        check_weight("cognitive", self.cognitive)?;
        check_weight("social", self.social)
    }
}

/// Configuration settings for the knapsack genetic demo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnapsackConfig {
    /// Number of genomes in every generation
    pub population_size: usize,
    /// Number of generations before the run terminates
    pub generations: usize,
    /// Probability that a child receives one bit flip
    pub mutation_rate: f64,
    /// Share of the sorted population copied unchanged into the next generation
    pub elitism_ratio: f64,
    /// Parents are drawn from this many of the closest genomes
    pub parent_pool: usize,
    /// Seed for all random draws; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for KnapsackConfig {
    fn default() -> Self {
        KnapsackConfig {
            population_size: 50,
            generations: 50,
            mutation_rate: 0.05,
            elitism_ratio: 0.1,
            parent_pool: 20,
            seed: None,
        }
    }
}

impl KnapsackConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        KnapsackConfig::default()
    }

    /// Set the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Set the generation cap.
    pub fn with_generations(mut self, generations: usize) -> Self {
        self.generations = generations;
        self
    }

    /// Set the per-child mutation probability.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Set the elite share.
    pub fn with_elitism_ratio(mut self, ratio: f64) -> Self {
        self.elitism_ratio = ratio;
        self
    }

    /// Set the parent pool size.
    pub fn with_parent_pool(mut self, pool: usize) -> Self {
        self.parent_pool = pool;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> TspResult<()> {
        if self.population_size < 2 {
            return Err(TspError::invalid_config(
                "population_size",
                format!("must be at least 2, got {}", self.population_size),
            ));
        }
        if self.generations < 1 {
            return Err(TspError::invalid_config("generations", "must be at least 1"));
        }
        if self.parent_pool < 1 {
            return Err(TspError::invalid_config("parent_pool", "must be at least 1"));
        }
        check_probability("mutation_rate", self.mutation_rate)?;
        if !(0.0..1.0).contains(&self.elitism_ratio) {
            return Err(TspError::invalid_config(
                "elitism_ratio",
                format!("must lie in [0, 1), got {}", self.elitism_ratio),
            ));
        }
        Ok(())
    }
}

fn check_probability(parameter: &'static str, value: f64) -> TspResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TspError::invalid_config(
            parameter,
            format!("must lie in [0, 1], got {}", value),
        ))
    }
}

fn check_weight(parameter: &'static str, value: f64) -> TspResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TspError::invalid_config(
            parameter,
            format!("must be finite and non-negative, got {}", value),
        ))
    }
}

/// Identifies one of the three tour optimizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    TwoOpt,
    Genetic,
    #[value(alias = "pso")]
    Swarm,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::TwoOpt => "2-opt",
            StrategyKind::Genetic => "genetic",
            StrategyKind::Swarm => "particle swarm",
        };
        f.write_str(name)
    }
}

/// An optimizer selection together with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Strategy {
    TwoOpt(TwoOptConfig),
    Genetic(GeneticConfig),
    Swarm(SwarmConfig),
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::TwoOpt(TwoOptConfig::default())
    }
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::TwoOpt(_) => StrategyKind::TwoOpt,
            Strategy::Genetic(_) => StrategyKind::Genetic,
            Strategy::Swarm(_) => StrategyKind::Swarm,
        }
    }

    pub fn seed(&self) -> Option<u64> {
        match self {
            Strategy::TwoOpt(c) => c.seed,
            Strategy::Genetic(c) => c.seed,
            Strategy::Swarm(c) => c.seed,
        }
    }

    /// Fill in `seed` unless the configuration already pins one.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        let slot = match &mut self {
            Strategy::TwoOpt(c) => &mut c.seed,
            Strategy::Genetic(c) => &mut c.seed,
            Strategy::Swarm(c) => &mut c.seed,
        };
        slot.get_or_insert(seed);
        self
    }

    pub fn validate(&self) -> TspResult<()> {
        match self {
            Strategy::TwoOpt(c) => c.validate(),
            Strategy::Genetic(c) => c.validate(),
            Strategy::Swarm(c) => c.validate(),
        }
    }
}

/// A complete run description: city layout parameters plus the optimizer to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of cities to generate
    pub city_count: usize,
    /// Rectangle the cities are sampled from
    pub bounds: Bounds,
    /// Seed for city generation and per-run seeds
    pub seed: Option<u64>,
    /// Optimizer selection
    pub strategy: Strategy,
    /// Cancel the run after this many steps
    pub max_steps: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            city_count: 25,
            bounds: Bounds::default(),
            seed: None,
            strategy: Strategy::default(),
            max_steps: None,
        }
    }
}

impl RunConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        RunConfig::default()
    }

    /// Set the number of cities.
    pub fn with_city_count(mut self, count: usize) -> Self {
        self.city_count = count;
        self
    }

    /// Set the sampling rectangle.
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the optimizer.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the step cap.
    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.max_steps = Some(steps);
        self
    }

    pub fn validate(&self) -> TspResult<()> {
        if self.city_count < 1 {
            return Err(TspError::invalid_config("city_count", "must be at least 1"));
        }
        self.bounds.validate()?;
        self.strategy.validate()
    }

    /// Load a run description from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> TspResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: RunConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}
