//! Tests for the knapsack genetic demo.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tsp_heuristics::config::KnapsackConfig;
use tsp_heuristics::error::TspError;
use tsp_heuristics::knapsack::{
    KnapsackInstance, KnapsackOptimizer, DEFAULT_ITEM_COUNT, DEFAULT_TARGET_RATIO,
    DEFAULT_VALUE_RANGE,
};
use tsp_heuristics::optimizer::StepEvent;

fn create_test_instance() -> KnapsackInstance {
    KnapsackInstance::new(vec![1, 2, 3, 4], 5).unwrap()
}

fn create_test_config() -> KnapsackConfig {
    KnapsackConfig::new().with_seed(31)
}

#[test]
fn test_instance_scoring() {
    let instance = create_test_instance();

    assert_eq!(instance.evaluate(&[true, false, false, true]), 5);
    assert_eq!(instance.distance(&[true, false, false, true]), 0);
    assert_eq!(instance.distance(&[true, true, true, true]), 5);
    assert_eq!(instance.distance(&[false; 4]), 5);
}

#[test]
fn test_generated_target_is_reachable_sum() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let instance = KnapsackInstance::generate(
        DEFAULT_ITEM_COUNT,
        DEFAULT_VALUE_RANGE,
        DEFAULT_TARGET_RATIO,
        &mut rng,
    )
    .unwrap();

    assert_eq!(instance.values().len(), DEFAULT_ITEM_COUNT);
    assert!(instance.values().iter().all(|v| DEFAULT_VALUE_RANGE.contains(v)));

    let total: u64 = instance.values().iter().sum();
    assert!(instance.target() > 0);
    assert!(instance.target() < total);
}

#[test]
fn test_instance_errors() {
    assert!(matches!(
        KnapsackInstance::new(Vec::new(), 3),
        Err(TspError::InvalidConfig { parameter: "values", .. })
    ));

    let mut rng = ChaCha8Rng::seed_from_u64(4);
    assert!(matches!(
        KnapsackInstance::generate(0, DEFAULT_VALUE_RANGE, 0.5, &mut rng),
        Err(TspError::InvalidConfig { parameter: "item_count", .. })
    ));
    assert!(matches!(
        KnapsackInstance::generate(10, DEFAULT_VALUE_RANGE, 1.5, &mut rng),
        Err(TspError::InvalidConfig { parameter: "target_ratio", .. })
    ));
}

#[test]
fn test_invalid_configs_are_rejected() {
    let cases = [
        (create_test_config().with_population_size(1), "population_size"),
        (create_test_config().with_generations(0), "generations"),
        (create_test_config().with_parent_pool(0), "parent_pool"),
        (create_test_config().with_mutation_rate(-0.1), "mutation_rate"),
        (create_test_config().with_elitism_ratio(1.0), "elitism_ratio"),
    ];

    for (config, expected) in cases {
        match KnapsackOptimizer::new(create_test_instance(), config) {
            Err(TspError::InvalidConfig { parameter, .. }) => assert_eq!(parameter, expected),
            other => panic!("expected InvalidConfig for {}, got {:?}", expected, other.err()),
        }
    }
}

#[test]
fn test_small_instance_is_solved() {
    let mut optimizer = KnapsackOptimizer::new(create_test_instance(), create_test_config()).unwrap();

    let mut last = optimizer.step().unwrap();
    while !last.is_terminal {
        last = optimizer.step().unwrap();
    }

    let best = optimizer.best().unwrap();
    assert_eq!(best.distance, 0);
    assert_eq!(best.value, 5);
    let items: u64 = best.selected_items().iter().map(|&i| [1, 2, 3, 4][i]).sum();
    assert_eq!(items, 5);
    assert!(optimizer.generation() < 50);
}

#[test]
fn test_best_distance_never_worsens() {
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    let instance = KnapsackInstance::generate(40, DEFAULT_VALUE_RANGE, 0.5, &mut rng).unwrap();
    let mut optimizer = KnapsackOptimizer::new(instance, create_test_config().with_generations(20)).unwrap();

    let mut previous = u64::MAX;
    loop {
        let step = optimizer.step().unwrap();
        let distance = step.best.as_ref().unwrap().distance;
        assert!(distance <= previous);
        assert_eq!(step.event == StepEvent::Improved, distance < previous);
        previous = distance;
        if step.is_terminal {
            break;
        }
    }

    assert!(optimizer.generation() <= 20);
    assert_eq!(optimizer.step().unwrap().event, StepEvent::Completed);
}

#[test]
fn test_cancel() {
    let mut optimizer = KnapsackOptimizer::new(create_test_instance(), create_test_config()).unwrap();
    optimizer.cancel();

    let step = optimizer.step().unwrap();
    assert_eq!(step.event, StepEvent::Cancelled);
    assert!(step.is_terminal);
    assert_eq!(step.generation, 0);
    assert!(step.best.is_none());
}
