//! Population management and fitness-proportional selection.

use crate::graph::CityGraph;
use crate::individual::Individual;
use crate::tour::random_tour;
use rand::Rng;

/// A fixed-size generation of tours awaiting evaluation.
#[derive(Debug, Clone)]
pub struct Population {
    tours: Vec<Vec<usize>>,
}

impl Population {
    /// `size` independent uniformly random tours over `city_count` cities.
    pub fn random<R: Rng + ?Sized>(size: usize, city_count: usize, rng: &mut R) -> Self {
        Population {
            tours: (0..size).map(|_| random_tour(city_count, rng)).collect(),
        }
    }

    pub fn from_tours(tours: Vec<Vec<usize>>) -> Self {
        Population { tours }
    }

    pub fn len(&self) -> usize {
        self.tours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tours.is_empty()
    }

    pub fn tours(&self) -> &[Vec<usize>] {
        &self.tours
    }

    /// Score every tour, consuming the generation.
    pub fn evaluate(self, graph: &CityGraph) -> Vec<Individual> {
        self.tours
            .into_iter()
            .map(|tour| Individual::new(tour, graph))
            .collect()
    }

    /// Number of distinct visiting orders, a cheap diversity measure.
    pub fn distinct_count(&self) -> usize {
        let mut tours: Vec<&Vec<usize>> = self.tours.iter().collect();
        tours.sort_unstable();
        tours.dedup();
        tours.len()
    }
}

/// Cumulative normalised fitness of each individual, in population order.
pub fn cumulative_probabilities(individuals: &[Individual]) -> Vec<f64> {
    let total: f64 = individuals.iter().map(|ind| ind.fitness).sum();

    individuals
        .iter()
        .scan(0.0, |acc, ind| {
            *acc += ind.fitness / total;
            Some(*acc)
        })
        .collect()
}

/// Draw `count` tours with replacement, each with probability proportional to its fitness.
///
/// A draw `r` resolves to the first individual whose cumulative probability is
/// not exceeded by `r`.
pub fn roulette_select<R: Rng + ?Sized>(
    individuals: &[Individual],
    count: usize,
    rng: &mut R,
) -> Vec<Vec<usize>> {
    if individuals.is_empty() {
        return Vec::new();
    }

    // Zero-length tours have infinite fitness and take every draw between them.
    let perfect: Vec<&Individual> = individuals
        .iter()
        .filter(|ind| ind.fitness == f64::INFINITY)
        .collect();
    if !perfect.is_empty() {
        return (0..count)
            .map(|_| perfect[rng.gen_range(0..perfect.len())].tour.clone())
            .collect();
    }

    let total: f64 = individuals.iter().map(|ind| ind.fitness).sum();
    if !total.is_finite() || total <= 0.0 {
        log::warn!("population: degenerate total fitness {}, selecting uniformly", total);
        return (0..count)
            .map(|_| individuals[rng.gen_range(0..individuals.len())].tour.clone())
            .collect();
    }

    let cumulative = cumulative_probabilities(individuals);
    let last = individuals.len() - 1;

    (0..count)
        .map(|_| {
            let r: f64 = rng.gen();
            // Rounding can leave the final cumulative value just below 1.0.
            let index = cumulative.partition_point(|&c| c < r).min(last);
            individuals[index].tour.clone()
        })
        .collect()
}
