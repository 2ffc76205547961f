use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

use tsp_heuristics::config::{
    GeneticConfig, KnapsackConfig, RunConfig, Strategy, StrategyKind, SwarmConfig, TwoOptConfig,
};
use tsp_heuristics::error::TspResult;
use tsp_heuristics::graph::{Bounds, CityGraph};
use tsp_heuristics::knapsack::{
    KnapsackInstance, KnapsackOptimizer, DEFAULT_TARGET_RATIO, DEFAULT_VALUE_RANGE,
};
use tsp_heuristics::optimizer::{StepEvent, StepResult};
use tsp_heuristics::render::{AsciiRenderer, JsonLinesRenderer, LogRenderer, Renderer};
use tsp_heuristics::subset_sum::SubsetSumSolver;
use tsp_heuristics::utils::{format_duration, save_tour, seeded_rng, SearchStatistics};
use tsp_heuristics::OptimizationController;

#[derive(Parser)]
#[command(
    name = "tsp-heuristics",
    version,
    about = "Step-by-step TSP heuristics, plus subset-sum and knapsack demos"
)]
struct Cli {
    /// Log at debug level (RUST_LOG still takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Improve a tour over random or loaded cities with one heuristic.
    Solve(SolveArgs),
    /// Find items summing exactly to a target.
    SubsetSum {
        #[arg(long)]
        target: usize,
        /// Non-negative item values.
        #[arg(required = true)]
        items: Vec<usize>,
    },
    /// Evolve a selection of random item values toward a target sum.
    Knapsack {
        #[arg(long, default_value_t = tsp_heuristics::knapsack::DEFAULT_ITEM_COUNT)]
        items: usize,
        #[arg(long)]
        population: Option<usize>,
        #[arg(long)]
        generations: Option<usize>,
        #[arg(long)]
        mutation_rate: Option<f64>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Args)]
struct SolveArgs {
    /// JSON run description; flags below are ignored when given, except --max-steps.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Load the city layout from a JSON file instead of generating one.
    #[arg(long)]
    load_cities: Option<PathBuf>,
    /// Save the city layout used to a JSON file.
    #[arg(long)]
    save_cities: Option<PathBuf>,
    /// Write the best tour to a text file.
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = StrategyKind::TwoOpt)]
    strategy: StrategyKind,
    #[arg(long, default_value_t = 25)]
    cities: usize,
    #[arg(long)]
    seed: Option<u64>,
    /// Cancel the run after this many steps.
    #[arg(long)]
    max_steps: Option<usize>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Log)]
    format: OutputFormat,

    /// Genetic population size.
    #[arg(long)]
    population: Option<usize>,
    /// Genetic generation cap.
    #[arg(long)]
    generations: Option<usize>,
    /// Genetic mutation probability.
    #[arg(long)]
    mutation_rate: Option<f64>,
    /// Swarm particle count.
    #[arg(long)]
    particles: Option<usize>,
    /// Swarm iteration cap.
    #[arg(long)]
    iterations: Option<usize>,
    #[arg(long)]
    inertia: Option<f64>,
    #[arg(long)]
    cognitive: Option<f64>,
    #[arg(long)]
    social: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Log,
    Json,
    Ascii,
}

impl SolveArgs {
    fn run_config(&self) -> TspResult<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_json_file(path)?,
            None => self.flag_config(),
        };
        if self.max_steps.is_some() {
            config.max_steps = self.max_steps;
        }
        config.validate()?;
        Ok(config)
    }

    fn flag_config(&self) -> RunConfig {
        let strategy = match self.strategy {
            StrategyKind::TwoOpt => Strategy::TwoOpt(TwoOptConfig::new()),
            StrategyKind::Genetic => {
                let defaults = GeneticConfig::new();
                Strategy::Genetic(
                    defaults
                        .clone()
                        .with_population_size(self.population.unwrap_or(defaults.population_size))
                        .with_generations(self.generations.unwrap_or(defaults.generations))
                        .with_mutation_rate(self.mutation_rate.unwrap_or(defaults.mutation_rate)),
                )
            }
            StrategyKind::Swarm => {
                let defaults = SwarmConfig::new();
                Strategy::Swarm(
                    defaults
                        .clone()
                        .with_particle_count(self.particles.unwrap_or(defaults.particle_count))
                        .with_iterations(self.iterations.unwrap_or(defaults.iterations))
                        .with_weights(
                            self.inertia.unwrap_or(defaults.inertia),
                            self.cognitive.unwrap_or(defaults.cognitive),
                            self.social.unwrap_or(defaults.social),
                        ),
                )
            }
        };

        let mut config = RunConfig::new()
            .with_city_count(self.cities)
            .with_bounds(Bounds::default())
            .with_strategy(strategy);
        config.seed = self.seed;
        config
    }
}

/// Forwards to the chosen renderer while remembering the first reported length.
struct RecordingRenderer {
    inner: Box<dyn Renderer>,
    initial_length: Option<f64>,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, graph: &CityGraph, result: &StepResult) -> TspResult<()> {
        if self.initial_length.is_none() && result.length.is_finite() {
            self.initial_length = Some(result.length);
        }
        self.inner.render(graph, result)
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let outcome = match cli.command {
        Command::Solve(args) => solve(args),
        Command::SubsetSum { target, items } => {
            subset_sum(items, target);
            Ok(())
        }
        Command::Knapsack {
            items,
            population,
            generations,
            mutation_rate,
            seed,
        } => knapsack(items, population, generations, mutation_rate, seed),
    };

    if let Err(err) = outcome {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

fn solve(args: SolveArgs) -> TspResult<()> {
    let config = args.run_config()?;
    let mut controller = OptimizationController::new(config.seed);

    let graph = match &args.load_cities {
        Some(path) => {
            println!("Loading cities from: {}", path.display());
            controller.load_cities(CityGraph::from_json_file(path)?)
        }
        None => controller.generate_cities(config.city_count, config.bounds)?,
    };
    if let Some(path) = &args.save_cities {
        graph.save_json(path)?;
        println!("Saved {} cities to: {}", graph.len(), path.display());
    }

    let strategy = config.strategy.kind();
    controller.start(config.strategy)?;

    let inner: Box<dyn Renderer> = match args.format {
        OutputFormat::Log => Box::new(LogRenderer),
        OutputFormat::Json => Box::new(JsonLinesRenderer::new(io::stdout(), true)),
        OutputFormat::Ascii => Box::new(AsciiRenderer::new(io::stdout(), 64, 24)),
    };
    let mut renderer = RecordingRenderer {
        inner,
        initial_length: None,
    };

    println!("Starting {} on {} cities", strategy, graph.len());
    let start_time = Instant::now();
    let last = controller.run(&mut renderer, config.max_steps)?;
    let runtime = start_time.elapsed();

    let stats = SearchStatistics {
        strategy,
        steps: last.step_index,
        runtime,
        initial_length: renderer.initial_length.unwrap_or(last.length),
        best_length: last.length,
        cancelled: last.event == StepEvent::Cancelled,
    };
    println!("{}", stats.format());

    if let Some(path) = &args.output {
        if let Some(tour) = controller.active().and_then(|handle| handle.best_tour().cloned()) {
            save_tour(&tour, &graph, strategy, path)?;
            println!("Saved tour to: {}", path.display());
        }
    }

    Ok(())
}

fn subset_sum(items: Vec<usize>, target: usize) {
    match SubsetSumSolver::new(items, target).solve() {
        Some(chosen) => println!("Subset summing to {}: {:?}", target, chosen),
        None => println!("No subset sums to {}", target),
    }
}

fn knapsack(
    items: usize,
    population: Option<usize>,
    generations: Option<usize>,
    mutation_rate: Option<f64>,
    seed: Option<u64>,
) -> TspResult<()> {
    let mut rng = seeded_rng(seed);
    let instance =
        KnapsackInstance::generate(items, DEFAULT_VALUE_RANGE, DEFAULT_TARGET_RATIO, &mut rng)?;

    let defaults = KnapsackConfig::new();
    let mut config = defaults
        .clone()
        .with_population_size(population.unwrap_or(defaults.population_size))
        .with_generations(generations.unwrap_or(defaults.generations))
        .with_mutation_rate(mutation_rate.unwrap_or(defaults.mutation_rate));
    config.seed = seed;

    println!("Target sum: {} over {} items", instance.target(), items);
    let mut optimizer = KnapsackOptimizer::new(instance, config)?;
    let start_time = Instant::now();

    loop {
        let step = optimizer.step()?;
        if let Some(best) = &step.best {
            log::info!(
                "knapsack: generation={} value={} distance={}",
                step.generation,
                best.value,
                best.distance
            );
        }
        if step.is_terminal {
            break;
        }
    }

    println!("Finished in {}", format_duration(start_time.elapsed()));
    if let Some(best) = optimizer.best() {
        println!(
            "Best selection: {} items, value {}, distance {}",
            best.selected_items().len(),
            best.value,
            best.distance
        );
    }
    Ok(())
}
