//! Particle swarm optimization adapted to permutations.
//!
//! Each particle's position is a tour whose slots are treated as real
//! numbers for the velocity update, then rounded back to city indices and
//! repaired into a permutation. The repair is lossy: it throws away whatever
//! locality the velocity step encoded.

use crate::config::{StrategyKind, SwarmConfig};
use crate::error::{TspError, TspResult};
use crate::graph::CityGraph;
use crate::optimizer::{CancelToken, Optimizer, RunState, StepEvent, StepResult};
use crate::tour::{check_permutation, random_tour, Tour};
use crate::utils::{require_tour_graph, seeded_rng};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// Turn `slots` back into a permutation of `0..city_count`: keep the first
/// occurrence of every in-range city, then append the absent cities in random order.
pub fn repair_permutation<R: Rng + ?Sized>(slots: &mut Vec<usize>, city_count: usize, rng: &mut R) {
    let mut seen = vec![false; city_count];
    slots.retain(|&city| city < city_count && !std::mem::replace(&mut seen[city], true));
    slots.truncate(city_count);

    let mut missing: Vec<usize> = (0..city_count).filter(|&city| !seen[city]).collect();
    missing.shuffle(rng);
    slots.extend(missing);
}

/// One member of the swarm.
#[derive(Debug, Clone)]
pub struct Particle {
    position: Vec<usize>,
    velocity: Vec<f64>,
    best: Option<Tour>,
}

impl Particle {
    fn random<R: Rng + ?Sized>(city_count: usize, rng: &mut R) -> Self {
        Particle {
            position: random_tour(city_count, rng),
            velocity: (0..city_count).map(|_| rng.gen_range(-1.0..=1.0)).collect(),
            best: None,
        }
    }

    /// Current position, always a valid tour between steps.
    pub fn position(&self) -> &[usize] {
        &self.position
    }

    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    /// Best tour this particle has visited.
    pub fn personal_best(&self) -> Option<&Tour> {
        self.best.as_ref()
    }
}

/// Stateful stepper over a swarm of permutation-valued particles.
pub struct ParticleSwarmOptimizer {
    graph: Arc<CityGraph>,
    config: SwarmConfig,
    particles: Vec<Particle>,
    global_best: Option<Tour>,
    iteration: usize,
    iteration_best: f64,
    rng: ChaCha8Rng,
    run: RunState,
}

impl ParticleSwarmOptimizer {
    pub fn new(graph: Arc<CityGraph>, config: SwarmConfig) -> TspResult<Self> {
        config.validate()?;
        require_tour_graph(&graph)?;

        let mut rng = seeded_rng(config.seed);
        let particles = (0..config.particle_count)
            .map(|_| Particle::random(graph.len(), &mut rng))
            .collect();

        log::info!(
            "swarm: start cities={} particles={} iterations={}",
            graph.len(),
            config.particle_count,
            config.iterations
        );

        Ok(ParticleSwarmOptimizer {
            graph,
            config,
            particles,
            global_best: None,
            iteration: 0,
            iteration_best: f64::INFINITY,
            rng,
            run: RunState::new(CancelToken::new()),
        })
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of iterations completed.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    /// Run one iteration over every particle. Returns whether the global best improved.
    fn fly(&mut self) -> TspResult<bool> {
        let n = self.graph.len();
        let max_index = (n - 1) as f64;
        let SwarmConfig {
            inertia,
            cognitive,
            social,
            ..
        } = self.config;

        let mut improved = false;
        self.iteration_best = f64::INFINITY;

        for particle in self.particles.iter_mut() {
            let length = self.graph.cycle_length(&particle.position);
            self.iteration_best = self.iteration_best.min(length);

            if particle.best.as_ref().map_or(true, |b| length < b.length) {
                particle.best = Some(Tour::new(particle.position.clone(), length));
            }
            if self.global_best.as_ref().map_or(true, |g| length < g.length) {
                self.global_best = Some(Tour::new(particle.position.clone(), length));
                improved = true;
            }

            let (personal, global) = match (&particle.best, &self.global_best) {
                (Some(p), Some(g)) => (&p.order, &g.order),
                _ => continue,
            };

            for slot in 0..n {
                let r1: f64 = self.rng.gen();
                let r2: f64 = self.rng.gen();
                let x = particle.position[slot] as f64;

                let v = inertia * particle.velocity[slot]
                    + cognitive * r1 * (personal[slot] as f64 - x)
                    + social * r2 * (global[slot] as f64 - x);
                particle.velocity[slot] = v;

                // NaN casts to 0, which the repair treats like any other index.
                particle.position[slot] = (x + v).clamp(0.0, max_index).round() as usize;
            }

            repair_permutation(&mut particle.position, n, &mut self.rng);

            check_permutation(&particle.position, n).map_err(|defect| TspError::InvalidTourState {
                step: self.iteration,
                operation: "swarm repair",
                defect,
            })?;
        }

        Ok(improved)
    }

    fn report(&self, event: StepEvent) -> StepResult {
        StepResult::new(
            StrategyKind::Swarm,
            &self.run,
            self.global_best.as_ref(),
            self.iteration_best,
            event,
        )
    }
}

impl Optimizer for ParticleSwarmOptimizer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Swarm
    }

    fn step(&mut self) -> TspResult<StepResult> {
        if let Some(event) = self.run.enter("swarm")? {
            return Ok(self.report(event));
        }

        let improved = match self.fly() {
            Ok(improved) => improved,
            Err(err) => {
                log::error!("swarm: {}", err);
                return Err(self.run.fail(err));
            }
        };

        self.iteration += 1;

        log::debug!(
            "swarm: iteration={} iteration_best={:.2} global_best={:.2}",
            self.iteration,
            self.iteration_best,
            self.best_length()
        );

        if self.iteration >= self.config.iterations {
            self.run.complete();
            log::info!(
                "swarm: complete iterations={} length={:.2}",
                self.iteration,
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
