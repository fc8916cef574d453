//! GA evolutionary loop execution.
//!
//! [`GeneticOptimizer`] orchestrates the complete evolutionary process:
//! initialization → evaluation → selection → crossover → repair → mutation → repeat.

use super::config::GaConfig;
use super::operators::{multi_point_crossover, mutate, random_chromosome, repair_labels};
use crate::error::GroupingError;
use crate::greedy::GreedyConstructor;
use crate::model::{Instance, Partition, Solution};
use crate::score::ScoreEngine;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A population member: a partition with its evaluated fitness.
#[derive(Debug, Clone)]
pub struct Individual {
    pub partition: Partition,
    /// Total happiness of the partition.
    pub happiness: f64,
    /// Happiness minus `penalty × total stress excess`.
    pub fitness: f64,
    pub feasible: bool,
}

impl Individual {
    fn evaluate(engine: &ScoreEngine<'_>, partition: Partition, penalty: f64) -> Self {
        let happiness = engine.total_happiness(&partition);
        let feasible = engine.is_feasible(&partition);
        let fitness = if feasible {
            happiness
        } else {
            happiness - penalty * engine.violation(&partition)
        };
        Self {
            partition,
            happiness,
            fitness,
            feasible,
        }
    }
}

/// Result of a GA optimization run.
#[derive(Debug, Clone)]
pub struct GaResult {
    /// Best feasible individual ever seen, or the fittest one if no feasible
    /// individual appeared.
    pub best: Individual,

    /// `best` packaged for the caller.
    pub solution: Solution,

    /// Total number of generations executed.
    pub generations: usize,

    /// Whether any feasible individual was seen.
    pub feasible_found: bool,

    /// Whether the run was terminated due to stagnation.
    pub stagnated: bool,

    /// Whether the run was cancelled externally or by the time limit.
    pub cancelled: bool,

    /// Best population fitness: initial population, then each generation.
    pub fitness_history: Vec<f64>,
}

/// Population-based search over group assignments.
///
/// Owns its random generator; a run is reproducible given the generator's
/// seed.
///
/// # Usage
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use u_grouping::ga::{GaConfig, GeneticOptimizer};
/// use u_grouping::model::Instance;
///
/// let h = vec![vec![0.0, 4.0, 0.0], vec![4.0, 0.0, 0.0], vec![0.0, 0.0, 0.0]];
/// let s = vec![vec![0.0; 3]; 3];
/// let instance = Instance::new(2, h, s, 2.0).unwrap();
///
/// let config = GaConfig::default().with_population_size(10).with_max_generations(20);
/// let mut ga = GeneticOptimizer::new(config, StdRng::seed_from_u64(42)).unwrap();
/// let result = ga.run(&instance);
/// assert!((result.solution.total_happiness - 4.0).abs() < 1e-9);
/// ```
pub struct GeneticOptimizer<R: Rng> {
    config: GaConfig,
    rng: R,
}

impl<R: Rng> GeneticOptimizer<R> {
    /// Creates an optimizer, rejecting an invalid configuration.
    pub fn new(config: GaConfig, rng: R) -> Result<Self, GroupingError> {
        config.validate().map_err(GroupingError::InvalidConfig)?;
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Runs the GA optimization.
    pub fn run(&mut self, instance: &Instance) -> GaResult {
        self.run_with_cancel(instance, None)
    }

    /// Runs the GA with an optional cancellation token.
    ///
    /// If `cancel` is `Some` and the flag is set to `true`, the GA stops
    /// before the next generation and returns the best solution found so far.
    pub fn run_with_cancel(
        &mut self,
        instance: &Instance,
        cancel: Option<Arc<AtomicBool>>,
    ) -> GaResult {
        let config = &self.config;
        let rng = &mut self.rng;
        let engine = ScoreEngine::new(instance);
        let n = instance.n();
        let k = instance.k();
        let started = Instant::now();
        let deadline = config.time_limit_ms.map(Duration::from_millis);

        // 1. Initialize population
        let mut population = initial_population(instance, &engine, config, rng);

        // 2. Track best
        let mut best_overall = fittest(&population).clone();
        let mut best_feasible: Option<Individual> = None;
        record_feasible(&population, &mut best_feasible);

        let mut fitness_history = Vec::with_capacity(config.max_generations + 1);
        fitness_history.push(best_overall.fitness);

        let mut stagnation_counter = 0usize;
        let mut stagnated = false;
        let mut cancelled = false;
        let mut generations = 0usize;

        // 3. Evolutionary loop
        for gen in 0..config.max_generations {
            let stop_requested = cancel
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::Relaxed));
            if stop_requested || deadline.is_some_and(|limit| started.elapsed() >= limit) {
                cancelled = true;
                break;
            }

            // Best first
            population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
            let fitness: Vec<f64> = population.iter().map(|ind| ind.fitness).collect();

            // Elite preservation
            let mut next_gen: Vec<Individual> = population[..config.elite_count].to_vec();

            // Offspring
            while next_gen.len() < config.population_size {
                let p1 = config.selection.select(&fitness, rng);
                let p2 = config.selection.select(&fitness, rng);

                let (c1, c2) = multi_point_crossover(
                    population[p1].partition.assignment(),
                    population[p2].partition.assignment(),
                    config.crossover_points,
                    rng,
                );

                for mut chromosome in [c1, c2] {
                    if next_gen.len() >= config.population_size {
                        break;
                    }
                    repair_labels(&mut chromosome, k, rng);
                    let mut child = Partition::from_valid_assignment(instance, chromosome);
                    mutate(&engine, &mut child, config.mutation_rate, rng);
                    child.canonicalize();
                    next_gen.push(Individual::evaluate(&engine, child, config.penalty));
                }
            }

            population = next_gen;
            generations = gen + 1;

            let gen_best = fittest(&population);
            fitness_history.push(gen_best.fitness);
            let improved_feasible = record_feasible(&population, &mut best_feasible);
            if gen_best.fitness > best_overall.fitness || improved_feasible {
                if gen_best.fitness > best_overall.fitness {
                    best_overall = gen_best.clone();
                }
                stagnation_counter = 0;
            } else {
                stagnation_counter += 1;
            }

            if generations.is_multiple_of(10) {
                tracing::debug!(
                    generation = generations,
                    best_fitness = best_overall.fitness,
                    feasible_found = best_feasible.is_some(),
                    "GA generation"
                );
            }

            if config.stagnation_limit > 0 && stagnation_counter >= config.stagnation_limit {
                stagnated = true;
                break;
            }
        }

        let feasible_found = best_feasible.is_some();
        let best = best_feasible.unwrap_or(best_overall);
        let solution = engine.solution(&best.partition);

        tracing::info!(
            generations,
            population = config.population_size,
            students = n,
            happiness = solution.total_happiness,
            feasible = solution.feasible,
            stagnated,
            cancelled,
            "GA finished"
        );

        GaResult {
            best,
            solution,
            generations,
            feasible_found,
            stagnated,
            cancelled,
            fitness_history,
        }
    }
}

/// Deterministic greedy, randomized greedy variants, then uniform random
/// assignments.
fn initial_population<R: Rng>(
    instance: &Instance,
    engine: &ScoreEngine<'_>,
    config: &GaConfig,
    rng: &mut R,
) -> Vec<Individual> {
    let size = config.population_size;
    let greedy_count = ((size as f64 * config.greedy_fraction).round() as usize).min(size);

    let mut population = Vec::with_capacity(size);
    for i in 0..greedy_count {
        let mut partition = if i == 0 {
            GreedyConstructor::build(instance)
        } else {
            GreedyConstructor::randomized(instance, rng)
        };
        partition.canonicalize();
        population.push(Individual::evaluate(engine, partition, config.penalty));
    }
    while population.len() < size {
        let chromosome = random_chromosome(instance.n(), instance.k(), rng);
        let mut partition = Partition::from_valid_assignment(instance, chromosome);
        partition.canonicalize();
        population.push(Individual::evaluate(engine, partition, config.penalty));
    }
    population
}

/// The individual with the highest fitness. `population` is never empty.
fn fittest(population: &[Individual]) -> &Individual {
    let mut best = &population[0];
    for ind in &population[1..] {
        if ind.fitness > best.fitness {
            best = ind;
        }
    }
    best
}

/// Updates `best` with the happiest feasible individual; returns whether it
/// changed.
fn record_feasible(population: &[Individual], best: &mut Option<Individual>) -> bool {
    let mut changed = false;
    for ind in population.iter().filter(|ind| ind.feasible) {
        if best.as_ref().is_none_or(|b| ind.happiness > b.happiness) {
            *best = Some(ind.clone());
            changed = true;
        }
    }
    changed
}
