//! Utility functions and structures shared by the optimizers and the driver.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::StrategyKind;
use crate::error::{TspError, TspResult};
use crate::graph::CityGraph;
use crate::tour::Tour;

/// Deterministic generator for `Some(seed)`, OS entropy otherwise.
pub fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Tour optimizers need at least two cities to have anything to order.
pub(crate) fn require_tour_graph(graph: &CityGraph) -> TspResult<()> {
    if graph.len() < 2 {
        return Err(TspError::InvalidGraph(format!(
            "tour optimizers need at least 2 cities, got {}",
            graph.len()
        )));
    }
    Ok(())
}

/// Format a duration as hours, minutes, and seconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let millis = duration.subsec_millis();

    format!("{}h {:02}m {:02}.{:03}s", hours, minutes, seconds, millis)
}

/// Save a tour report to a file.
pub fn save_tour<P: AsRef<Path>>(
    tour: &Tour,
    graph: &CityGraph,
    strategy: StrategyKind,
    path: P,
) -> TspResult<()> {
    let mut file = File::create(path)?;

    writeln!(file, "TSP tour found by {}", strategy)?;
    writeln!(file, "Cities: {}", graph.len())?;
    writeln!(file, "Total Distance: {:.2}", tour.length)?;
    writeln!(file)?;

    for (position, &city_index) in tour.order.iter().enumerate() {
        match graph.city(city_index) {
            Some(city) => writeln!(
                file,
                "{:>4}: city {:>4} at ({:.2}, {:.2})",
                position, city_index, city.x, city.y
            )?,
            None => writeln!(file, "{:>4}: city {:>4}", position, city_index)?,
        }
    }

    if let Some(&first) = tour.order.first() {
        writeln!(file, "back to city {}", first)?;
    }

    Ok(())
}

/// Statistics about a finished search.
pub struct SearchStatistics {
    pub strategy: StrategyKind,
    pub steps: usize,
    pub runtime: Duration,
    pub initial_length: f64,
    pub best_length: f64,
    pub cancelled: bool,
}

impl SearchStatistics {
    /// Relative improvement over the first reported length, in percent.
    pub fn improvement_percent(&self) -> f64 {
        if self.initial_length.is_finite() && self.initial_length > 0.0 {
            100.0 * (self.initial_length - self.best_length) / self.initial_length
        } else {
            0.0
        }
    }

    /// Format the statistics as a string.
    pub fn format(&self) -> String {
        format!(
            "Search Statistics:
- Strategy: {}
- Steps: {}
- Runtime: {}
- First Reported Length: {:.2}
- Best Length: {:.2}
- Improvement: {:.1}%
- Cancelled: {}",
            self.strategy,
            self.steps,
            format_duration(self.runtime),
            self.initial_length,
            self.best_length,
            self.improvement_percent(),
            self.cancelled
        )
    }
}

/// Plot cities and tour edges on a `width` x `height` character grid.
///
/// Cities are drawn as `o` (the tour start as `S`) and edges as `.`. An empty
/// tour plots the cities alone; anything else must be a tour of `graph`.
pub fn render_ascii(
    graph: &CityGraph,
    tour: &[usize],
    width: usize,
    height: usize,
) -> TspResult<String> {
    if !tour.is_empty() {
        graph.validate_tour(tour)?;
    }

    let width = width.max(2);
    let height = height.max(2);
    let extent = graph.extent();

    let project = |index: usize| -> (usize, usize) {
        let city = &graph.cities()[index];
        let scale = |value: f64, min: f64, span: f64, cells: usize| -> usize {
            if span > 0.0 {
                ((value - min) / span * (cells as f64 - 1.0)).round() as usize
            } else {
                0
            }
        };
        (
            scale(city.x, extent.min_x, extent.width(), width),
            scale(city.y, extent.min_y, extent.height(), height),
        )
    };

    let mut grid = vec![vec![' '; width]; height];

    // Edges first so cities are drawn on top.
    for (position, &from) in tour.iter().enumerate() {
        let to = tour[(position + 1) % tour.len()];
        let (x0, y0) = project(from);
        let (x1, y1) = project(to);
        let dx = x1 as f64 - x0 as f64;
        let dy = y1 as f64 - y0 as f64;
        let samples = dx.abs().max(dy.abs()).ceil() as usize;

        for s in 1..samples {
            let t = s as f64 / samples as f64;
            let x = (x0 as f64 + t * dx).round() as usize;
            let y = (y0 as f64 + t * dy).round() as usize;
            grid[y][x] = '.';
        }
    }

    for index in 0..graph.len() {
        let (x, y) = project(index);
        grid[y][x] = 'o';
    }
    if let Some(&start) = tour.first() {
        let (x, y) = project(start);
        grid[y][x] = 'S';
    }

    let mut out = String::with_capacity((width + 1) * height);
    for row in &grid {
        out.extend(row.iter());
        out.push('\n');
    }
    Ok(out)
}
