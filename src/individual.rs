//! Individual representation for the genetic algorithm population.

use crate::graph::CityGraph;
use crate::tour::Tour;
use std::cmp::Ordering;

/// An evaluated member of a genetic population.
#[derive(Debug, Clone)]
pub struct Individual {
    /// The tour this individual encodes
    pub tour: Vec<usize>,
    /// Cyclic length of `tour`
    pub length: f64,
    /// Selection weight, the reciprocal of `length`
    pub fitness: f64,
}

impl Individual {
    /// Evaluate a tour. Callers guarantee `tour` is a permutation of the graph's cities.
    pub fn new(tour: Vec<usize>, graph: &CityGraph) -> Self {
        let length = graph.cycle_length(&tour);
        let fitness = if length > 0.0 {
            1.0 / length
        } else {
            f64::INFINITY
        };

        Individual {
            tour,
            length,
            fitness,
        }
    }

    pub fn to_tour(&self) -> Tour {
        Tour::new(self.tour.clone(), self.length)
    }
}

impl PartialEq for Individual {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Individual {}

impl PartialOrd for Individual {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Individual {
    fn cmp(&self, other: &Self) -> Ordering {
        // Shorter tours order first.
        self.length.total_cmp(&other.length)
    }
}
