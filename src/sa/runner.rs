//! SA execution loop.

use super::config::{CoolingSchedule, SaConfig};
use crate::error::GroupingError;
use crate::greedy::GreedyConstructor;
use crate::model::{Instance, Move, Partition, Solution};
use crate::score::ScoreEngine;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of a Simulated Annealing run.
#[derive(Debug, Clone)]
pub struct SaResult {
    /// The best partition found (never worse than the seed).
    pub best: Partition,

    /// `best` packaged for the caller.
    pub solution: Solution,

    /// Happiness of the starting partition.
    pub initial_happiness: f64,

    /// Total sampled moves, valid or not.
    pub iterations: usize,

    /// Temperature when the run stopped.
    pub final_temperature: f64,

    /// Accepted moves (including improvements).
    pub accepted_moves: usize,

    /// Accepted moves with non-negative happiness change.
    pub improving_moves: usize,

    /// Valid moves rejected because they broke the stress cap.
    pub infeasible_rejections: usize,

    /// Number of reheats performed.
    pub reheats: usize,

    /// Whether cancelled externally or by the time limit.
    pub cancelled: bool,

    /// Best happiness sampled at regular intervals.
    pub happiness_history: Vec<f64>,
}

/// Simulated annealing over relocations and swaps, seeded by
/// [`GreedyConstructor`].
///
/// The generator is owned by the optimizer, so a run is a pure function of
/// the instance, the configuration and the generator's seed.
///
/// # Examples
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use u_grouping::model::Instance;
/// use u_grouping::sa::{AnnealingOptimizer, SaConfig};
///
/// let h = vec![vec![0.0, 1.0, 0.0], vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 0.0]];
/// let s = vec![vec![0.0; 3]; 3];
/// let instance = Instance::new(2, h, s, 1.0).unwrap();
///
/// let mut sa = AnnealingOptimizer::new(
///     SaConfig::default().with_max_iterations(1_000),
///     StdRng::seed_from_u64(42),
/// )
/// .unwrap();
/// let result = sa.run(&instance);
/// assert!(result.solution.feasible);
/// ```
pub struct AnnealingOptimizer<R: Rng> {
    config: SaConfig,
    rng: R,
}

impl<R: Rng> AnnealingOptimizer<R> {
    /// Creates an optimizer, rejecting an invalid configuration.
    pub fn new(config: SaConfig, rng: R) -> Result<Self, GroupingError> {
        config.validate().map_err(GroupingError::InvalidConfig)?;
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &SaConfig {
        &self.config
    }

    /// Runs SA from the greedy construction.
    pub fn run(&mut self, instance: &Instance) -> SaResult {
        self.run_with_cancel(instance, None)
    }

    /// Runs SA from the greedy construction with an optional cancellation
    /// token, checked once per temperature level.
    pub fn run_with_cancel(
        &mut self,
        instance: &Instance,
        cancel: Option<Arc<AtomicBool>>,
    ) -> SaResult {
        let seed = GreedyConstructor::build(instance);
        self.run_from(instance, seed, cancel)
    }

    /// Runs SA from an arbitrary starting partition.
    pub fn run_from(
        &mut self,
        instance: &Instance,
        initial: Partition,
        cancel: Option<Arc<AtomicBool>>,
    ) -> SaResult {
        let config = &self.config;
        let engine = ScoreEngine::new(instance);
        let started = Instant::now();
        let deadline = config.time_limit_ms.map(Duration::from_millis);

        let mut current = initial;
        let mut current_happiness = engine.total_happiness(&current);
        let mut current_feasible = engine.is_feasible(&current);
        let initial_happiness = current_happiness;

        let mut best = current.clone();
        let mut best_happiness = current_happiness;
        let mut best_feasible = current_feasible;

        let mut temperature = config.initial_temperature;
        let mut total_iterations = 0usize;
        let mut accepted_moves = 0usize;
        let mut improving_moves = 0usize;
        let mut infeasible_rejections = 0usize;
        let mut reheats = 0usize;
        let mut since_best = 0usize;
        let mut cancelled = false;

        let linear_max_steps = compute_linear_steps(config);

        let history_interval = 100.max(config.iterations_per_temperature);
        let mut happiness_history = vec![best_happiness];

        let mut step = 0usize;

        // With a single group there is nothing to move.
        let movable = current.k() > 1;

        while movable && temperature > config.min_temperature {
            let stop_requested = cancel
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::Relaxed));
            if stop_requested || deadline.is_some_and(|limit| started.elapsed() >= limit) {
                cancelled = true;
                break;
            }

            let inner_iters = match config.cooling {
                CoolingSchedule::LundyMees { .. } => 1,
                _ => config.iterations_per_temperature,
            };

            for _ in 0..inner_iters {
                if config.max_iterations > 0 && total_iterations >= config.max_iterations {
                    break;
                }
                total_iterations += 1;
                since_best += 1;

                let mv = sample_move(&current, config.swap_probability, &mut self.rng);
                if let Ok(delta) = engine.delta_for_move(&current, mv) {
                    if !engine.is_move_feasible(&current, &delta) {
                        infeasible_rejections += 1;
                    } else {
                        // Metropolis acceptance criterion (maximization)
                        let dh = delta.happiness();
                        let accept = if dh >= 0.0 {
                            true
                        } else {
                            let probability = (dh / temperature).exp();
                            self.rng.random_range(0.0..1.0) < probability
                        };

                        if accept && engine.apply_move(&mut current, &delta).is_ok() {
                            if dh >= 0.0 {
                                improving_moves += 1;
                            }
                            current_happiness += dh;
                            accepted_moves += 1;
                            if !current_feasible {
                                current_feasible = engine.is_feasible(&current);
                            }

                            let better = (current_feasible && !best_feasible)
                                || (current_feasible == best_feasible
                                    && current_happiness > best_happiness + 1e-12);
                            if better {
                                best = current.clone();
                                best_happiness = current_happiness;
                                best_feasible = current_feasible;
                                since_best = 0;
                            }
                        }
                    }
                }

                if total_iterations.is_multiple_of(history_interval) {
                    happiness_history.push(best_happiness);
                }
            }

            if config.max_iterations > 0 && total_iterations >= config.max_iterations {
                break;
            }

            temperature = cool(temperature, config, step, linear_max_steps);
            step += 1;

            if config.reheat_after > 0 && since_best >= config.reheat_after {
                temperature =
                    (temperature * config.reheat_factor).min(config.initial_temperature / 2.0);
                reheats += 1;
                since_best = 0;
                tracing::debug!(temperature, best_happiness, "SA: reheat");
            }

            if step.is_multiple_of(100) {
                tracing::debug!(
                    step,
                    temperature,
                    current_happiness,
                    best_happiness,
                    "SA: temperature level"
                );
            }
        }

        if happiness_history
            .last()
            .is_none_or(|&last| (last - best_happiness).abs() > 1e-15)
        {
            happiness_history.push(best_happiness);
        }

        let solution = engine.solution(&best);
        tracing::info!(
            iterations = total_iterations,
            accepted_moves,
            reheats,
            initial_happiness,
            best_happiness = solution.total_happiness,
            feasible = solution.feasible,
            cancelled,
            "SA finished"
        );

        SaResult {
            best,
            solution,
            initial_happiness,
            iterations: total_iterations,
            final_temperature: temperature,
            accepted_moves,
            improving_moves,
            infeasible_rejections,
            reheats,
            cancelled,
            happiness_history,
        }
    }
}

/// Draws a relocation or swap uniformly over students and target groups.
///
/// The sample may be invalid (same group, emptying a group); the caller
/// lets the score engine reject it.
fn sample_move<R: Rng>(partition: &Partition, swap_probability: f64, rng: &mut R) -> Move {
    let n = partition.n();
    if rng.random_bool(swap_probability) {
        Move::Swap {
            a: rng.random_range(0..n),
            b: rng.random_range(0..n),
        }
    } else {
        let student = rng.random_range(0..n);
        let mut to = rng.random_range(0..partition.k() - 1);
        if to >= partition.group_of(student) {
            to += 1;
        }
        Move::Relocate { student, to }
    }
}

/// Apply the cooling schedule to compute the next temperature.
fn cool(temperature: f64, config: &SaConfig, step: usize, linear_max_steps: usize) -> f64 {
    match config.cooling {
        CoolingSchedule::Geometric { alpha } => temperature * alpha,

        CoolingSchedule::Linear => {
            if linear_max_steps == 0 {
                config.min_temperature
            } else {
                let t = config.initial_temperature
                    - (step + 1) as f64 * (config.initial_temperature - config.min_temperature)
                        / linear_max_steps as f64;
                t.max(config.min_temperature)
            }
        }

        CoolingSchedule::LundyMees { beta } => temperature / (1.0 + beta * temperature),
    }
}

/// Estimate the number of temperature steps for linear cooling.
fn compute_linear_steps(config: &SaConfig) -> usize {
    match config.cooling {
        CoolingSchedule::Linear => {
            if config.max_iterations > 0 {
                config.max_iterations / config.iterations_per_temperature
            } else {
                1000
            }
        }
        _ => 0,
    }
}
