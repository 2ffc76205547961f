//! Tests for city layouts, distances and tour validation.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tsp_heuristics::error::TspError;
use tsp_heuristics::graph::{Bounds, City, CityGraph};
use tsp_heuristics::tour::{check_permutation, random_tour, PermutationDefect};

/// The corners of a 10x10 square, in perimeter order.
fn create_test_square() -> CityGraph {
    CityGraph::from_points(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]).unwrap()
}

#[test]
fn test_distance_matrix_is_symmetric() {
    let graph = create_test_square();

    assert_eq!(graph.distance(0, 1), 10.0);
    assert_eq!(graph.distance(1, 0), 10.0);
    assert_eq!(graph.distance(2, 2), 0.0);
    assert!((graph.distance(0, 2) - 200f64.sqrt()).abs() < 1e-12);
}

#[test]
fn test_tour_length_includes_wrap_edge() {
    let graph = create_test_square();

    assert!((graph.tour_length(&[0, 1, 2, 3]).unwrap() - 40.0).abs() < 1e-9);

    let crossing = 20.0 + 2.0 * 200f64.sqrt();
    assert!((graph.tour_length(&[0, 2, 1, 3]).unwrap() - crossing).abs() < 1e-9);
}

#[test]
fn test_tour_length_rejects_non_permutations() {
    let graph = create_test_square();

    assert_eq!(
        graph.tour_length(&[0, 1, 2]),
        Err(TspError::InvalidTour(PermutationDefect::WrongLength {
            expected: 4,
            actual: 3
        }))
    );
    assert_eq!(
        graph.tour_length(&[0, 1, 1, 3]),
        Err(TspError::InvalidTour(PermutationDefect::Duplicate { city: 1 }))
    );
    assert_eq!(
        graph.tour_length(&[0, 1, 2, 9]),
        Err(TspError::InvalidTour(PermutationDefect::OutOfRange {
            city: 9,
            count: 4
        }))
    );
}

#[test]
fn test_single_city_tour_has_zero_length() {
    let graph = CityGraph::from_points(&[(3.0, 4.0)]).unwrap();
    assert_eq!(graph.tour_length(&[0]).unwrap(), 0.0);
}

#[test]
fn test_graph_construction_errors() {
    assert!(matches!(
        CityGraph::new(Vec::new()),
        Err(TspError::InvalidGraph(_))
    ));
    assert!(matches!(
        CityGraph::new(vec![City::new(1, 0.0, 0.0)]),
        Err(TspError::InvalidGraph(_))
    ));
    assert!(matches!(
        CityGraph::from_points(&[(0.0, f64::NAN)]),
        Err(TspError::InvalidGraph(_))
    ));
}

#[test]
fn test_generate_stays_within_bounds() {
    let bounds = Bounds::default();
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let graph = CityGraph::generate(200, bounds, &mut rng).unwrap();

    assert_eq!(graph.len(), 200);
    for (index, city) in graph.cities().iter().enumerate() {
        assert_eq!(city.id, index);
        assert!(city.x >= bounds.min_x && city.x <= bounds.max_x);
        assert!(city.y >= bounds.min_y && city.y <= bounds.max_y);
    }
}

#[test]
fn test_generate_is_deterministic_for_a_seed() {
    let a = tsp_heuristics::generate_cities(30, Bounds::default(), Some(5)).unwrap();
    let b = tsp_heuristics::generate_cities(30, Bounds::default(), Some(5)).unwrap();
    assert_eq!(a.cities(), b.cities());
}

#[test]
fn test_generate_rejects_bad_parameters() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    assert!(matches!(
        CityGraph::generate(0, Bounds::default(), &mut rng),
        Err(TspError::InvalidConfig { parameter: "count", .. })
    ));
    assert!(matches!(
        CityGraph::generate(5, Bounds::new(10.0, 0.0, 0.0, 10.0), &mut rng),
        Err(TspError::InvalidConfig { parameter: "bounds", .. })
    ));
}

#[test]
fn test_padded_bounds_and_extent() {
    let bounds = Bounds::padded(1280.0, 720.0, 100.0);
    assert_eq!(bounds, Bounds::new(100.0, 100.0, 1180.0, 620.0));

    let extent = create_test_square().extent();
    assert_eq!(extent, Bounds::new(0.0, 0.0, 10.0, 10.0));
    assert_eq!(extent.width(), 10.0);
}

#[test]
fn test_city_layout_json_round_trip() {
    let graph = create_test_square();
    let path = std::env::temp_dir().join(format!("tsp_cities_{}.json", std::process::id()));

    graph.save_json(&path).unwrap();
    let loaded = CityGraph::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.cities(), graph.cities());
}

#[test]
fn test_missing_layout_file_is_io_error() {
    let result = CityGraph::from_json_file("/nonexistent/cities.json");
    assert!(matches!(result, Err(TspError::Io(_))));
}

proptest! {
    #[test]
    fn test_random_tours_are_permutations(count in 1usize..60, seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let tour = random_tour(count, &mut rng);
        prop_assert_eq!(check_permutation(&tour, count), Ok(()));
    }

    #[test]
    fn test_tour_length_is_rotation_invariant(seed in any::<u64>(), shift in 0usize..12) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let graph = CityGraph::generate(12, Bounds::default(), &mut rng).unwrap();
        let tour = random_tour(12, &mut rng);

        let mut rotated = tour.clone();
        rotated.rotate_left(shift);

        let a = graph.tour_length(&tour).unwrap();
        let b = graph.tour_length(&rotated).unwrap();
        prop_assert!((a - b).abs() < 1e-6);
    }
}
