//! Property tests over randomly generated instances.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use u_grouping::ga::{GaConfig, GeneticOptimizer};
use u_grouping::greedy::GreedyConstructor;
use u_grouping::local::{LocalSearchConfig, LocalSearchOptimizer};
use u_grouping::model::{Instance, Move, PairMatrix, Partition};
use u_grouping::sa::{AnnealingOptimizer, SaConfig};
use u_grouping::score::ScoreEngine;
use u_grouping::validation::validate_solution;

/// Random symmetric instance; `tightness` scales the budget from very tight
/// (0) to effectively unconstrained (1).
fn random_instance(n: usize, k: usize, seed: u64, tightness: f64) -> Instance {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut h = PairMatrix::zeros(n);
    let mut s = PairMatrix::zeros(n);
    let mut total_stress = 0.0;
    for i in 0..n {
        for j in i + 1..n {
            h.set(i, j, rng.random_range(0.0..10.0));
            let stress = rng.random_range(0.0..10.0);
            s.set(i, j, stress);
            total_stress += stress;
        }
    }
    Instance::from_matrices(k, h, s, total_stress * tightness).unwrap()
}

fn instance_params() -> impl Strategy<Value = (usize, usize, u64, f64)> {
    (2usize..=10).prop_flat_map(|n| (Just(n), 1..=n, any::<u64>(), 0.0f64..=1.0))
}

fn assert_caches_exact(instance: &Instance, partition: &Partition) -> Result<(), TestCaseError> {
    let assignment = partition.assignment().to_vec();
    let fresh = Partition::from_assignment(instance, assignment).unwrap();
    for g in 0..partition.k() {
        prop_assert!((fresh.group_happiness(g) - partition.group_happiness(g)).abs() < 1e-6);
        prop_assert!((fresh.group_stress(g) - partition.group_stress(g)).abs() < 1e-6);
        prop_assert_eq!(fresh.group_size(g), partition.group_size(g));
    }
    Ok(())
}

proptest! {
    #[test]
    fn greedy_covers_every_student_and_group((n, k, seed, tightness) in instance_params()) {
        let instance = random_instance(n, k, seed, tightness);
        let partition = GreedyConstructor::build(&instance);

        prop_assert_eq!(partition.n(), n);
        prop_assert!(partition.assignment().iter().all(|&g| g < k));
        prop_assert_eq!(partition.used_groups(), k);
        assert_caches_exact(&instance, &partition)?;
    }

    #[test]
    fn caches_survive_random_moves(
        (n, k, seed, tightness) in instance_params(),
        moves in prop::collection::vec((any::<bool>(), 0usize..10, 0usize..10), 1..60),
    ) {
        let instance = random_instance(n, k, seed, tightness);
        let engine = ScoreEngine::new(&instance);
        let mut partition = GreedyConstructor::build(&instance);

        for (swap, x, y) in moves {
            let mv = if swap {
                Move::Swap { a: x % n, b: y % n }
            } else {
                Move::Relocate { student: x % n, to: y % k }
            };
            let before = engine.total_happiness(&partition);
            match engine.delta_for_move(&partition, mv) {
                Ok(delta) => {
                    prop_assert!(engine.apply_move(&mut partition, &delta).is_ok());
                    let after = engine.total_happiness(&partition);
                    prop_assert!((after - (before + delta.happiness())).abs() < 1e-6);
                }
                Err(_) => prop_assert!((engine.total_happiness(&partition) - before).abs() < 1e-12),
            }
        }

        assert_caches_exact(&instance, &partition)?;
        prop_assert_eq!(partition.used_groups(), k);
        let recomputed = engine.recompute_happiness(partition.assignment());
        prop_assert!((engine.total_happiness(&partition) - recomputed).abs() < 1e-6);
    }

    #[test]
    fn feasibility_matches_brute_force(
        (n, k, seed, tightness) in instance_params(),
        labels in prop::collection::vec(0usize..10, 10),
    ) {
        let instance = random_instance(n, k, seed, tightness);
        let assignment: Vec<usize> = labels[..n].iter().map(|&g| g % k).collect();
        let partition = Partition::from_assignment(&instance, assignment.clone()).unwrap();
        let engine = ScoreEngine::new(&instance);
        let report = validate_solution(&instance, &assignment);

        prop_assert_eq!(engine.is_feasible(&partition), report.feasible);
        prop_assert!((engine.total_happiness(&partition) - report.total_happiness).abs() < 1e-6);
    }

    #[test]
    fn local_search_never_worsens((n, k, seed, tightness) in instance_params()) {
        let instance = random_instance(n, k, seed, tightness);
        let engine = ScoreEngine::new(&instance);
        let mut partition = GreedyConstructor::build(&instance);
        let was_feasible = engine.is_feasible(&partition);

        let local = LocalSearchOptimizer::new(LocalSearchConfig::default()).unwrap();
        let result = local.improve(&instance, &mut partition);

        prop_assert!(result.final_happiness >= result.initial_happiness - 1e-9);
        for window in result.happiness_history.windows(2) {
            prop_assert!(window[1] >= window[0] - 1e-9);
        }
        if was_feasible {
            prop_assert!(engine.is_feasible(&partition));
        }
        assert_caches_exact(&instance, &partition)?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn annealing_never_ranks_below_its_seed((n, k, seed, tightness) in instance_params()) {
        let instance = random_instance(n, k, seed, tightness);
        let engine = ScoreEngine::new(&instance);
        let greedy = GreedyConstructor::build(&instance);
        let greedy_happiness = engine.total_happiness(&greedy);
        let greedy_feasible = engine.is_feasible(&greedy);

        let config = SaConfig::default().with_max_iterations(2_000);
        let mut sa = AnnealingOptimizer::new(config, StdRng::seed_from_u64(seed)).unwrap();
        let result = sa.run(&instance);
        let sol = &result.solution;

        prop_assert_eq!(sol.group_of.len(), n);
        // Ranked by (feasible, happiness): feasibility is never lost, and
        // happiness only drops when an infeasible seed was traded for a
        // feasible partition.
        prop_assert!(sol.feasible || !greedy_feasible);
        if sol.feasible == greedy_feasible {
            prop_assert!(sol.total_happiness >= greedy_happiness - 1e-9);
        }
        let report = validate_solution(&instance, &sol.group_of);
        prop_assert!((report.total_happiness - sol.total_happiness).abs() < 1e-6);
        prop_assert_eq!(report.feasible, sol.feasible);
    }

    #[test]
    fn genetic_best_fitness_is_monotone((n, k, seed, tightness) in instance_params()) {
        let instance = random_instance(n, k, seed, tightness);
        let config = GaConfig::default()
            .with_population_size(10)
            .with_max_generations(15)
            .with_mutation_rate(0.2);
        let mut ga = GeneticOptimizer::new(config, StdRng::seed_from_u64(seed)).unwrap();
        let result = ga.run(&instance);

        for window in result.fitness_history.windows(2) {
            prop_assert!(window[1] >= window[0]);
        }
        prop_assert_eq!(result.solution.group_of.len(), n);
        prop_assert!(result.solution.group_of.iter().all(|&g| g < k));
        let report = validate_solution(&instance, &result.solution.group_of);
        prop_assert_eq!(report.feasible, result.solution.feasible);
    }
}

#[cfg(feature = "serde")]
mod serde_support {
    use u_grouping::model::{Instance, Solution};

    #[test]
    fn instance_json_round_trip() {
        let h = vec![vec![0.0, 5.0], vec![5.0, 0.0]];
        let s = vec![vec![0.0, 3.0], vec![3.0, 0.0]];
        let instance = Instance::new(1, h, s, 10.0).unwrap();
        let json = serde_json::to_string(&instance).unwrap();
        let back: Instance = serde_json::from_str(&json).unwrap();
        assert_eq!(instance, back);
    }

    #[test]
    fn instance_json_is_checked() {
        let diagonal = r#"{"k":1,
            "happiness":{"n":2,"values":[0.0,1.0,1.0,5.0]},
            "stress":{"n":2,"values":[0.0,1.0,1.0,0.0]},
            "stress_budget":4.0}"#;
        let err = serde_json::from_str::<Instance>(diagonal).unwrap_err();
        assert!(err.to_string().contains("diagonal"), "{err}");

        let asymmetric = r#"{"k":1,
            "happiness":{"n":2,"values":[0.0,1.0,2.0,0.0]},
            "stress":{"n":2,"values":[0.0,1.0,1.0,0.0]},
            "stress_budget":4.0}"#;
        assert!(serde_json::from_str::<Instance>(asymmetric).is_err());

        let short = r#"{"k":1,
            "happiness":{"n":2,"values":[0.0,1.0,1.0]},
            "stress":{"n":2,"values":[0.0,1.0,1.0,0.0]},
            "stress_budget":4.0}"#;
        assert!(serde_json::from_str::<Instance>(short).is_err());

        let too_many_groups = r#"{"k":3,
            "happiness":{"n":2,"values":[0.0,1.0,1.0,0.0]},
            "stress":{"n":2,"values":[0.0,1.0,1.0,0.0]},
            "stress_budget":4.0}"#;
        assert!(serde_json::from_str::<Instance>(too_many_groups).is_err());
    }

    #[test]
    fn solution_json_round_trip() {
        let solution = Solution {
            group_of: vec![0, 0, 1, 2, 1],
            total_happiness: 12.5,
            feasible: true,
        };
        let json = serde_json::to_string(&solution).unwrap();
        let back: Solution = serde_json::from_str(&json).unwrap();
        assert_eq!(solution, back);
    }
}
