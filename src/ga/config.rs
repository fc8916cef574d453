//! GA configuration.
//!
//! [`GaConfig`] holds all parameters that control the evolutionary loop.

use super::selection::Selection;

/// Configuration for [`GeneticOptimizer`](super::GeneticOptimizer).
///
/// # Defaults
///
/// ```
/// use u_grouping::ga::GaConfig;
///
/// let config = GaConfig::default();
/// assert_eq!(config.population_size, 50);
/// assert_eq!(config.max_generations, 200);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_grouping::ga::{GaConfig, Selection};
///
/// let config = GaConfig::default()
///     .with_population_size(80)
///     .with_selection(Selection::Rank)
///     .with_elite_count(4)
///     .with_mutation_rate(0.02);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaConfig {
    /// Number of individuals, constant across generations.
    pub population_size: usize,

    /// Number of generations to run.
    pub max_generations: usize,

    /// Selection strategy for choosing parents.
    pub selection: Selection,

    /// Individuals copied unchanged into the next generation. At least one,
    /// so the best fitness never drops between generations.
    pub elite_count: usize,

    /// Per-student probability of being reassigned to a random group
    /// (`p_mut`).
    pub mutation_rate: f64,

    /// Multiplier on total stress excess subtracted from infeasible
    /// individuals' happiness.
    pub penalty: f64,

    /// Cut points used by multi-point crossover.
    pub crossover_points: usize,

    /// Share of the initial population built by randomized greedy; the rest
    /// is uniformly random.
    pub greedy_fraction: f64,

    /// Generations without a new best before stopping. 0 disables.
    pub stagnation_limit: usize,

    /// Optional wall-clock limit, checked at the start of each generation.
    pub time_limit_ms: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_generations: 200,
            selection: Selection::default(),
            elite_count: 2,
            mutation_rate: 0.05,
            penalty: 10.0,
            crossover_points: 2,
            greedy_fraction: 0.25,
            stagnation_limit: 0,
            time_limit_ms: None,
        }
    }
}

impl GaConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    pub fn with_selection(mut self, sel: Selection) -> Self {
        self.selection = sel;
        self
    }

    pub fn with_elite_count(mut self, n: usize) -> Self {
        self.elite_count = n;
        self
    }

    /// Sets the per-student mutation rate, clamped to [0, 1].
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }

    pub fn with_crossover_points(mut self, n: usize) -> Self {
        self.crossover_points = n;
        self
    }

    /// Sets the greedy-seeded share of the initial population, clamped to [0, 1].
    pub fn with_greedy_fraction(mut self, fraction: f64) -> Self {
        self.greedy_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    pub fn with_stagnation_limit(mut self, limit: usize) -> Self {
        self.stagnation_limit = limit;
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Convenience builder for setting tournament size.
    pub fn with_tournament_size(self, k: usize) -> Self {
        self.with_selection(Selection::Tournament(k))
    }

    /// Validates the configuration.
    ///
    /// Returns `Err` with a description if any parameter is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size < 2 {
            return Err("population_size must be at least 2".into());
        }
        if self.max_generations == 0 {
            return Err("max_generations must be at least 1".into());
        }
        if self.elite_count == 0 {
            return Err("elite_count must be at least 1".into());
        }
        if self.elite_count >= self.population_size {
            return Err("elite_count too high: elites fill entire population".into());
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(format!(
                "mutation_rate must be in [0, 1], got {}",
                self.mutation_rate
            ));
        }
        if !(self.penalty >= 0.0) || !self.penalty.is_finite() {
            return Err(format!(
                "penalty must be finite and non-negative, got {}",
                self.penalty
            ));
        }
        if self.crossover_points == 0 {
            return Err("crossover_points must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.greedy_fraction) {
            return Err(format!(
                "greedy_fraction must be in [0, 1], got {}",
                self.greedy_fraction
            ));
        }
        if self.time_limit_ms == Some(0) {
            return Err("time_limit_ms must be positive or None".into());
        }
        Ok(())
    }
}
