//! Tests for the genetic operators and the generational stepper.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tsp_heuristics::config::GeneticConfig;
use tsp_heuristics::error::TspError;
use tsp_heuristics::genetic::{order_crossover, order_crossover_child, swap_mutation, GeneticOptimizer};
use tsp_heuristics::graph::{Bounds, CityGraph};
use tsp_heuristics::individual::Individual;
use tsp_heuristics::optimizer::{Optimizer, StepEvent};
use tsp_heuristics::population::{cumulative_probabilities, roulette_select, Population};
use tsp_heuristics::tour::{check_permutation, random_tour};

fn create_test_graph(count: usize, seed: u64) -> Arc<CityGraph> {
    Arc::new(tsp_heuristics::generate_cities(count, Bounds::default(), Some(seed)).unwrap())
}

fn create_test_config() -> GeneticConfig {
    GeneticConfig::new()
        .with_population_size(20)
        .with_generations(30)
        .with_mutation_rate(0.1)
        .with_seed(17)
}

#[test]
fn test_order_crossover_child_fills_after_segment() {
    let donor = [0, 1, 2, 3, 4, 5, 6, 7];
    let filler = [7, 6, 5, 4, 3, 2, 1, 0];

    let child = order_crossover_child(&donor, &filler, 2, 4);

    assert_eq!(child, vec![6, 5, 2, 3, 4, 1, 0, 7]);
}

#[test]
fn test_order_crossover_child_with_full_segment_copies_donor() {
    let donor = [3, 1, 0, 2];
    let filler = [0, 1, 2, 3];
    assert_eq!(order_crossover_child(&donor, &filler, 0, 3), donor.to_vec());
}

#[test]
fn test_order_crossover_of_identical_parents() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let parent = vec![4, 2, 0, 3, 1];

    let (a, b) = order_crossover(&parent, &parent, &mut rng);

    assert_eq!(a, parent);
    assert_eq!(b, parent);
}

#[test]
fn test_swap_mutation_rates() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let original: Vec<usize> = (0..10).collect();

    let mut never = original.clone();
    assert!(!swap_mutation(&mut never, 0.0, &mut rng));
    assert_eq!(never, original);

    let mut always = original.clone();
    assert!(swap_mutation(&mut always, 1.0, &mut rng));
    let moved = always.iter().zip(&original).filter(|(a, b)| a != b).count();
    assert_eq!(moved, 2);
    assert_eq!(check_permutation(&always, 10), Ok(()));
}

#[test]
fn test_roulette_favours_short_tours() {
    let graph = CityGraph::from_points(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]).unwrap();
    let individuals = vec![
        Individual::new(vec![0, 1, 2, 3], &graph),
        Individual::new(vec![0, 2, 1, 3], &graph),
    ];

    let cumulative = cumulative_probabilities(&individuals);
    assert_eq!(cumulative.len(), 2);
    assert!(cumulative[0] > 0.5);
    assert!((cumulative[1] - 1.0).abs() < 1e-12);

    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let selected = roulette_select(&individuals, 2000, &mut rng);
    let short = selected.iter().filter(|t| **t == vec![0, 1, 2, 3]).count();
    assert_eq!(selected.len(), 2000);
    assert!(short > 1000, "short tour picked {} times", short);
}

#[test]
fn test_roulette_with_zero_length_tours_selects_uniformly() {
    let graph = CityGraph::from_points(&[(1.0, 1.0), (1.0, 1.0), (1.0, 1.0)]).unwrap();
    let individuals = vec![
        Individual::new(vec![0, 1, 2], &graph),
        Individual::new(vec![2, 1, 0], &graph),
    ];

    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let selected = roulette_select(&individuals, 50, &mut rng);
    assert_eq!(selected.len(), 50);
    assert!(selected.iter().all(|t| check_permutation(t, 3).is_ok()));
}

#[test]
fn test_roulette_picks_only_zero_length_tours_when_present() {
    let individuals = vec![
        Individual {
            tour: vec![0, 1, 2],
            length: 12.0,
            fitness: 1.0 / 12.0,
        },
        Individual {
            tour: vec![2, 1, 0],
            length: 0.0,
            fitness: f64::INFINITY,
        },
        Individual {
            tour: vec![1, 0, 2],
            length: 30.0,
            fitness: 1.0 / 30.0,
        },
    ];

    let mut rng = ChaCha8Rng::seed_from_u64(13);
    let selected = roulette_select(&individuals, 40, &mut rng);

    assert_eq!(selected.len(), 40);
    assert!(selected.iter().all(|t| *t == vec![2, 1, 0]));
}

#[test]
fn test_population_diversity() {
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let population = Population::random(30, 12, &mut rng);

    assert_eq!(population.len(), 30);
    assert!(population.distinct_count() > 1);

    let clones = Population::from_tours(vec![vec![0, 1, 2]; 4]);
    assert_eq!(clones.distinct_count(), 1);
}

#[test]
fn test_invalid_configs_are_rejected() {
    let graph = create_test_graph(10, 1);

    let too_small = create_test_config().with_population_size(1);
    assert!(matches!(
        GeneticOptimizer::new(Arc::clone(&graph), too_small),
        Err(TspError::InvalidConfig { parameter: "population_size", .. })
    ));

    let no_generations = create_test_config().with_generations(0);
    assert!(matches!(
        GeneticOptimizer::new(Arc::clone(&graph), no_generations),
        Err(TspError::InvalidConfig { parameter: "generations", .. })
    ));

    let bad_rate = create_test_config().with_mutation_rate(1.5);
    assert!(matches!(
        GeneticOptimizer::new(graph, bad_rate),
        Err(TspError::InvalidConfig { parameter: "mutation_rate", .. })
    ));
}

#[test]
fn test_config_is_checked_before_graph() {
    let graph = create_test_graph(1, 1);

    assert!(matches!(
        GeneticOptimizer::new(Arc::clone(&graph), create_test_config().with_population_size(0)),
        Err(TspError::InvalidConfig { .. })
    ));
    assert!(matches!(
        GeneticOptimizer::new(graph, create_test_config()),
        Err(TspError::InvalidGraph(_))
    ));
}

#[test]
fn test_runs_exactly_the_configured_generations() {
    let graph = create_test_graph(12, 2);
    let mut optimizer = GeneticOptimizer::new(graph, create_test_config()).unwrap();

    let mut steps = 0;
    while !optimizer.is_terminal() {
        let result = optimizer.step().unwrap();
        steps += 1;
        assert_eq!(result.step_index, steps);
    }

    assert_eq!(steps, 30);
    assert_eq!(optimizer.generation(), 30);
    assert_eq!(optimizer.step().unwrap().event, StepEvent::Completed);
}

#[test]
fn test_global_best_never_worsens() {
    let graph = create_test_graph(15, 4);
    let mut optimizer = GeneticOptimizer::new(Arc::clone(&graph), create_test_config()).unwrap();

    let first = optimizer.step().unwrap();
    assert_eq!(first.event, StepEvent::Improved);

    let mut previous = first.length;
    while !optimizer.is_terminal() {
        let result = optimizer.step().unwrap();
        assert!(result.length <= previous);
        assert!(result.current_length >= result.length - 1e-9);
        assert_eq!(result.event == StepEvent::Improved, result.length < previous);
        previous = result.length;
    }

    let best = optimizer.best_tour().unwrap();
    assert_eq!(check_permutation(&best.order, graph.len()), Ok(()));
    assert!((graph.tour_length(&best.order).unwrap() - best.length).abs() < 1e-6);
}

#[test]
fn test_population_stays_valid_every_generation() {
    let graph = create_test_graph(9, 5);
    // Odd population exercises the wrap-around pairing.
    let config = create_test_config().with_population_size(7).with_mutation_rate(1.0);
    let mut optimizer = GeneticOptimizer::new(Arc::clone(&graph), config).unwrap();

    while !optimizer.is_terminal() {
        optimizer.step().unwrap();
        assert_eq!(optimizer.population().len(), 7);
        for tour in optimizer.population().tours() {
            assert_eq!(check_permutation(tour, graph.len()), Ok(()));
        }
    }
}

#[test]
fn test_two_city_graph_runs() {
    let graph = create_test_graph(2, 7);
    let mut optimizer = GeneticOptimizer::new(graph, create_test_config().with_generations(3)).unwrap();

    while !optimizer.is_terminal() {
        let result = optimizer.step().unwrap();
        assert_eq!(result.tour.len(), 2);
    }
}

#[test]
fn test_cancel_keeps_best_tour() {
    let graph = create_test_graph(12, 9);
    let mut optimizer = GeneticOptimizer::new(graph, create_test_config()).unwrap();

    let before = optimizer.step().unwrap();
    optimizer.cancel();
    let after = optimizer.step().unwrap();

    assert_eq!(after.event, StepEvent::Cancelled);
    assert!(after.is_terminal);
    assert_eq!(after.step_index, before.step_index);
    assert_eq!(after.tour, before.tour);
    assert_eq!(optimizer.generation(), 1);
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let graph = create_test_graph(14, 10);

    let run = |graph: Arc<CityGraph>| {
        let mut optimizer = GeneticOptimizer::new(graph, create_test_config()).unwrap();
        while !optimizer.is_terminal() {
            optimizer.step().unwrap();
        }
        optimizer.best_tour().cloned()
    };

    assert_eq!(run(Arc::clone(&graph)), run(graph));
}

proptest! {
    #[test]
    fn test_order_crossover_yields_permutations(size in 2usize..40, seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let a = random_tour(size, &mut rng);
        let b = random_tour(size, &mut rng);

        let (child_a, child_b) = order_crossover(&a, &b, &mut rng);

        prop_assert_eq!(check_permutation(&child_a, size), Ok(()));
        prop_assert_eq!(check_permutation(&child_b, size), Ok(()));
    }

    #[test]
    fn test_order_crossover_keeps_donor_segment(
        size in 2usize..30,
        cut_a in 0usize..30,
        cut_b in 0usize..30,
        seed in any::<u64>(),
    ) {
        let (start, end) = (cut_a.min(cut_b) % size, cut_a.max(cut_b) % size);
        prop_assume!(start <= end);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let donor = random_tour(size, &mut rng);
        let filler = random_tour(size, &mut rng);

        let child = order_crossover_child(&donor, &filler, start, end);
        prop_assert_eq!(&child[start..=end], &donor[start..=end]);
        prop_assert_eq!(check_permutation(&child, size), Ok(()));
    }
}
