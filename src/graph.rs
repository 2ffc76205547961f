//! City layouts and the Euclidean distance substrate shared by every optimizer.

use crate::error::{TspError, TspResult};
use crate::tour::check_permutation;
use itertools::Itertools;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// A city on the plane. Its id is its position within the [`CityGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: usize,
    pub x: f64,
    pub y: f64,
}

impl City {
    /// Create a new city.
    pub fn new(id: usize, x: f64, y: f64) -> Self {
        City { id, x, y }
    }

    /// Calculate the Euclidean distance between two cities.
    pub fn distance(&self, other: &City) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned rectangle that city coordinates are sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds::padded(1280.0, 720.0, 100.0)
    }
}

impl Bounds {
    /// Create a new rectangle.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Bounds {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// The drawable area of a `width` x `height` canvas keeping `padding` clear on every side.
    pub fn padded(width: f64, height: f64, padding: f64) -> Self {
        Bounds::new(padding, padding, width - padding, height - padding)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check that all corners are finite and the rectangle is not inverted.
    pub fn validate(&self) -> TspResult<()> {
        let corners = [self.min_x, self.min_y, self.max_x, self.max_y];
        if corners.iter().any(|c| !c.is_finite()) {
            return Err(TspError::invalid_config("bounds", "must have finite corners"));
        }
        if self.min_x > self.max_x || self.min_y > self.max_y {
            return Err(TspError::invalid_config(
                "bounds",
                format!(
                    "is inverted: x {}..{}, y {}..{}",
                    self.min_x, self.max_x, self.min_y, self.max_y
                ),
            ));
        }
        Ok(())
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> (f64, f64) {
        (
            rng.gen_range(self.min_x..=self.max_x),
            rng.gen_range(self.min_y..=self.max_y),
        )
    }
}

/// An immutable complete graph over a set of cities.
#[derive(Debug, Clone)]
pub struct CityGraph {
    cities: Vec<City>,
    distance_matrix: Vec<Vec<f64>>,
}

impl CityGraph {
    /// Build a graph from cities whose ids match their positions.
    pub fn new(cities: Vec<City>) -> TspResult<Self> {
        if cities.is_empty() {
            return Err(TspError::InvalidGraph(
                "a city graph needs at least one city".to_string(),
            ));
        }

        for (index, city) in cities.iter().enumerate() {
            if city.id != index {
                return Err(TspError::InvalidGraph(format!(
                    "city at position {} carries id {}",
                    index, city.id
                )));
            }
            if !city.x.is_finite() || !city.y.is_finite() {
                return Err(TspError::InvalidGraph(format!(
                    "city {} has non-finite coordinates ({}, {})",
                    index, city.x, city.y
                )));
            }
        }

        let distance_matrix = Self::compute_distance_matrix(&cities);

        Ok(CityGraph {
            cities,
            distance_matrix,
        })
    }

    /// Build a graph from bare coordinates, numbering cities in order.
    pub fn from_points(points: &[(f64, f64)]) -> TspResult<Self> {
        let cities = points
            .iter()
            .enumerate()
            .map(|(id, &(x, y))| City::new(id, x, y))
            .collect();
        Self::new(cities)
    }

    /// Place `count` cities at independently sampled coordinates within `bounds`.
    pub fn generate<R: Rng + ?Sized>(count: usize, bounds: Bounds, rng: &mut R) -> TspResult<Self> {
        if count == 0 {
            return Err(TspError::invalid_config("count", "must be at least 1"));
        }
        bounds.validate()?;

        let cities = (0..count)
            .map(|id| {
                let (x, y) = bounds.sample(rng);
                City::new(id, x, y)
            })
            .collect();

        Self::new(cities)
    }

    /// Generate the full distance matrix for all cities.
    fn compute_distance_matrix(cities: &[City]) -> Vec<Vec<f64>> {
        let n = cities.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let d = cities[i].distance(&cities[j]);
                matrix[i][j] = d;
                matrix[j][i] = d;
            }
        }

        matrix
    }

    /// Number of cities.
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    /// Always false for a constructed graph; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn city(&self, index: usize) -> Option<&City> {
        self.cities.get(index)
    }

    /// Euclidean distance between two city indices.
    ///
    /// # Panics
    ///
    /// Panics if either index is not below [`CityGraph::len`].
    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.distance_matrix[from][to]
    }

    /// Total cyclic length of `order`, including the edge from the last city back to the first.
    ///
    /// Fails with [`TspError::InvalidTour`] unless `order` is a permutation of all cities.
    pub fn tour_length(&self, order: &[usize]) -> TspResult<f64> {
        self.validate_tour(order)?;
        Ok(self.cycle_length(order))
    }

    /// Check that `order` is a permutation of all city indices.
    pub fn validate_tour(&self, order: &[usize]) -> TspResult<()> {
        check_permutation(order, self.len()).map_err(TspError::InvalidTour)
    }

    /// Cyclic length without validation. Callers guarantee `order` is a tour.
    pub(crate) fn cycle_length(&self, order: &[usize]) -> f64 {
        order
            .iter()
            .circular_tuple_windows()
            .map(|(&a, &b)| self.distance(a, b))
            .sum()
    }

    /// Smallest rectangle containing every city.
    pub fn extent(&self) -> Bounds {
        let (min_x, max_x) = self
            .cities
            .iter()
            .map(|c| c.x)
            .minmax()
            .into_option()
            .unwrap_or((0.0, 0.0));
        let (min_y, max_y) = self
            .cities
            .iter()
            .map(|c| c.y)
            .minmax()
            .into_option()
            .unwrap_or((0.0, 0.0));
        Bounds::new(min_x, min_y, max_x, max_y)
    }

    /// Load a city layout (a JSON array of cities) from a file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> TspResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let cities: Vec<City> = serde_json::from_reader(reader)?;
        Self::new(cities)
    }

    /// Save the city layout as a JSON array.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> TspResult<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &self.cities)?;
        Ok(())
    }
}
