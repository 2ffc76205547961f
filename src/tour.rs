//! Tour representation and permutation checks.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Describes how a sequence of city indices fails to be a tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermutationDefect {
    /// The sequence does not visit exactly `expected` cities.
    WrongLength { expected: usize, actual: usize },
    /// An entry is not a city index of the graph.
    OutOfRange { city: usize, count: usize },
    /// A city appears more than once.
    Duplicate { city: usize },
    /// A city never appears.
    Missing { city: usize },
}

impl fmt::Display for PermutationDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermutationDefect::WrongLength { expected, actual } => {
                write!(f, "expected {} cities, found {}", expected, actual)
            }
            PermutationDefect::OutOfRange { city, count } => {
                write!(f, "city {} is out of range for {} cities", city, count)
            }
            PermutationDefect::Duplicate { city } => write!(f, "city {} appears twice", city),
            PermutationDefect::Missing { city } => write!(f, "city {} is missing", city),
        }
    }
}

/// Check that `order` is a permutation of `0..count`.
pub fn check_permutation(order: &[usize], count: usize) -> Result<(), PermutationDefect> {
    if order.len() != count {
        return Err(PermutationDefect::WrongLength {
            expected: count,
            actual: order.len(),
        });
    }

    let mut seen = vec![false; count];
    for &city in order {
        match seen.get_mut(city) {
            None => return Err(PermutationDefect::OutOfRange { city, count }),
            Some(true) => return Err(PermutationDefect::Duplicate { city }),
            Some(flag) => *flag = true,
        }
    }

    // Unreachable with equal lengths and no duplicates.
    match seen.iter().position(|&flag| !flag) {
        Some(city) => Err(PermutationDefect::Missing { city }),
        None => Ok(()),
    }
}

/// A uniformly random visiting order over `count` cities.
pub fn random_tour<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..count).collect();
    order.shuffle(rng);
    order
}

/// A cyclic visiting order over every city together with its total length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    /// City indices in visiting order; the last city connects back to the first.
    pub order: Vec<usize>,
    /// Total cyclic length including the wrap-around edge.
    pub length: f64,
}

impl Tour {
    pub(crate) fn new(order: Vec<usize>, length: f64) -> Self {
        Tour { order, length }
    }

    /// Number of cities visited.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the tour visits no city at all.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
