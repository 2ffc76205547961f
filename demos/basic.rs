//! Basic example of driving the TSP optimizers step by step.

use std::env;
use std::sync::Arc;
use std::time::Instant;
use tsp_heuristics::config::{GeneticConfig, SwarmConfig, TwoOptConfig};
use tsp_heuristics::graph::Bounds;
use tsp_heuristics::optimizer::{OptimizerHandle, StepEvent};
use tsp_heuristics::utils::{format_duration, render_ascii, save_tour};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // City count from the command line, or the demo default
    let args: Vec<String> = env::args().collect();
    let city_count = match args.get(1) {
        Some(arg) => arg.parse()?,
        None => 25,
    };

    println!("Generating {} cities", city_count);
    let graph = Arc::new(tsp_heuristics::generate_cities(
        city_count,
        Bounds::default(),
        Some(7),
    )?);

    let runs: Vec<(&str, OptimizerHandle)> = vec![
        (
            "2-opt",
            tsp_heuristics::start_two_opt(Arc::clone(&graph), TwoOptConfig::new().with_seed(7))?,
        ),
        (
            "genetic",
            tsp_heuristics::start_genetic(
                Arc::clone(&graph),
                GeneticConfig::new().with_generations(200).with_seed(7),
            )?,
        ),
        (
            "swarm",
            tsp_heuristics::start_pso(Arc::clone(&graph), SwarmConfig::new().with_seed(7))?,
        ),
    ];

    for (name, mut handle) in runs {
        let start_time = Instant::now();
        let mut improvements = 0;

        loop {
            let result = handle.step()?;
            if result.event == StepEvent::Improved {
                improvements += 1;
            }
            if result.is_terminal {
                println!(
                    "{}: length {:.2} after {} steps ({} improvements) in {}",
                    name,
                    result.length,
                    result.step_index,
                    improvements,
                    format_duration(start_time.elapsed())
                );
                break;
            }
        }

        if let Some(tour) = handle.best_tour() {
            let output_path = format!("{}.tour", name);
            save_tour(tour, &graph, handle.kind(), &output_path)?;
            println!("Saved tour to: {}", output_path);
            print!("{}", render_ascii(&graph, &tour.order, 60, 20)?);
        }
    }

    Ok(())
}
