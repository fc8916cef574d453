//! Local search execution loop.

use super::config::LocalSearchConfig;
use crate::error::GroupingError;
use crate::model::{Instance, Move, Partition};
use crate::score::{MoveDelta, ScoreEngine};

/// Outcome of a local search run.
#[derive(Debug, Clone)]
pub struct LocalSearchResult {
    /// Passes executed, including the final pass that found nothing.
    pub passes: usize,

    /// Total moves applied.
    pub moves_applied: usize,

    /// True if the last pass applied no move (local optimum reached).
    pub converged: bool,

    /// Happiness before the first pass.
    pub initial_happiness: f64,

    /// Happiness after the last pass.
    pub final_happiness: f64,

    /// Happiness after each pass.
    pub happiness_history: Vec<f64>,
}

/// Best-improvement-per-student hill climber.
#[derive(Debug, Clone)]
pub struct LocalSearchOptimizer {
    config: LocalSearchConfig,
}

impl LocalSearchOptimizer {
    /// Creates an optimizer, rejecting an invalid configuration.
    pub fn new(config: LocalSearchConfig) -> Result<Self, GroupingError> {
        config.validate().map_err(GroupingError::InvalidConfig)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LocalSearchConfig {
        &self.config
    }

    /// Improves `partition` in place until a local optimum or the pass budget.
    ///
    /// Happiness never decreases. An infeasible starting partition stays
    /// infeasible unless some feasible improving move repairs it.
    pub fn improve(&self, instance: &Instance, partition: &mut Partition) -> LocalSearchResult {
        let engine = ScoreEngine::new(instance);
        let initial_happiness = engine.total_happiness(partition);
        let mut happiness_history = Vec::new();
        let mut moves_applied = 0;
        let mut passes = 0;
        let mut converged = false;

        while passes < self.config.max_passes {
            let applied = self.pass(&engine, partition);
            passes += 1;
            moves_applied += applied;
            happiness_history.push(engine.total_happiness(partition));

            tracing::debug!(
                pass = passes,
                applied,
                happiness = engine.total_happiness(partition),
                "local search pass"
            );

            if applied == 0 {
                converged = true;
                break;
            }
        }

        let final_happiness = engine.total_happiness(partition);
        tracing::info!(
            passes,
            moves_applied,
            converged,
            initial_happiness,
            final_happiness,
            "local search finished"
        );

        LocalSearchResult {
            passes,
            moves_applied,
            converged,
            initial_happiness,
            final_happiness,
            happiness_history,
        }
    }

    /// One scan over all students. Returns the number of moves applied.
    pub fn pass(&self, engine: &ScoreEngine<'_>, partition: &mut Partition) -> usize {
        let mut applied = 0;
        for student in 0..partition.n() {
            let Some(delta) = self.best_move_for(engine, partition, student) else {
                continue;
            };
            if engine.apply_move(partition, &delta).is_ok() {
                applied += 1;
            }
        }
        applied
    }

    /// The best strictly improving feasible relocation or swap for `student`.
    pub fn best_move_for(
        &self,
        engine: &ScoreEngine<'_>,
        partition: &Partition,
        student: usize,
    ) -> Option<MoveDelta> {
        let from = partition.group_of(student);
        let mut best: Option<MoveDelta> = None;
        let mut best_gain = self.config.min_improvement;

        let relocations = (0..partition.k())
            .filter(|&to| to != from)
            .map(|to| Move::Relocate { student, to });
        let swaps = (0..partition.n())
            .filter(|&other| partition.group_of(other) != from)
            .map(|other| Move::Swap { a: student, b: other });

        for mv in relocations.chain(swaps) {
            let Ok(delta) = engine.delta_for_move(partition, mv) else {
                continue;
            };
            if delta.happiness() > best_gain && engine.is_move_feasible(partition, &delta) {
                best_gain = delta.happiness();
                best = Some(delta);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::greedy::GreedyConstructor;

    fn two_pairs() -> Instance {
        let mut h = vec![vec![0.0; 4]; 4];
        let mut s = vec![vec![0.0; 4]; 4];
        for (i, j) in [(0, 1), (2, 3)] {
            h[i][j] = 5.0;
            h[j][i] = 5.0;
            s[i][j] = 3.0;
            s[j][i] = 3.0;
        }
        Instance::new(2, h, s, 10.0).unwrap()
    }

    #[test]
    fn test_greedy_example_is_local_optimum() {
        let inst = two_pairs();
        let mut p = GreedyConstructor::build(&inst);
        let ls = LocalSearchOptimizer::new(LocalSearchConfig::default()).unwrap();
        let result = ls.improve(&inst, &mut p);

        assert_eq!(result.moves_applied, 0);
        assert_eq!(result.passes, 1);
        assert!(result.converged);
        assert!((result.final_happiness - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_repairs_crossed_pairs() {
        let inst = two_pairs();
        let mut p = Partition::from_assignment(&inst, vec![0, 1, 0, 1]).unwrap();
        let ls = LocalSearchOptimizer::new(LocalSearchConfig::default()).unwrap();
        let result = ls.improve(&inst, &mut p);

        assert!((result.initial_happiness - 0.0).abs() < 1e-12);
        assert!((result.final_happiness - 10.0).abs() < 1e-12);
        assert_eq!(p.assignment()[0], p.assignment()[1]);
        assert_eq!(p.assignment()[2], p.assignment()[3]);
        assert!(ScoreEngine::new(&inst).is_feasible(&p));
    }

    #[test]
    fn test_respects_stress_cap() {
        // Joining 0 and 1 is happy but over the cap of 2.
        let mut h = vec![vec![0.0; 4]; 4];
        let mut s = vec![vec![0.0; 4]; 4];
        h[0][1] = 10.0;
        h[1][0] = 10.0;
        s[0][1] = 3.0;
        s[1][0] = 3.0;
        let inst = Instance::new(2, h, s, 4.0).unwrap();
        let mut p = Partition::from_assignment(&inst, vec![0, 1, 0, 1]).unwrap();
        let ls = LocalSearchOptimizer::new(LocalSearchConfig::default()).unwrap();
        ls.improve(&inst, &mut p);

        assert_ne!(p.group_of(0), p.group_of(1));
        assert!(ScoreEngine::new(&inst).is_feasible(&p));
    }

    #[test]
    fn test_history_non_decreasing() {
        let n = 8;
        let mut h = vec![vec![0.0; n]; n];
        let mut s = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    h[i][j] = ((i * 7 + j * 7) % 5) as f64;
                    s[i][j] = ((i + j) % 3) as f64;
                }
            }
        }
        let inst = Instance::new(3, h, s, 30.0).unwrap();
        let mut p = Partition::from_assignment(&inst, vec![0, 1, 2, 0, 1, 2, 0, 1]).unwrap();
        let ls = LocalSearchOptimizer::new(LocalSearchConfig::default()).unwrap();
        let result = ls.improve(&inst, &mut p);

        let mut prev = result.initial_happiness;
        for &h in &result.happiness_history {
            assert!(h >= prev - 1e-9);
            prev = h;
        }
        assert_eq!(p.used_groups(), 3);
    }

    #[test]
    fn test_pass_budget() {
        let inst = two_pairs();
        let mut p = Partition::from_assignment(&inst, vec![0, 1, 0, 1]).unwrap();
        let config = LocalSearchConfig::default().with_max_passes(1);
        let ls = LocalSearchOptimizer::new(config).unwrap();
        let result = ls.improve(&inst, &mut p);
        assert_eq!(result.passes, 1);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let err = LocalSearchOptimizer::new(LocalSearchConfig::default().with_max_passes(0));
        assert!(matches!(err, Err(GroupingError::InvalidConfig(_))));
    }
}
