//! SA configuration and cooling schedules.

/// Cooling schedule for temperature reduction.
///
/// # References
///
/// - Geometric: standard textbook approach
/// - Linear: fixed-duration cooling
/// - LundyMees: Lundy & Mees (1986), with convergence proof
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoolingSchedule {
    /// Geometric (exponential) cooling: `T_{k+1} = alpha * T_k`.
    ///
    /// Typical `alpha`: 0.95–0.99.
    Geometric {
        /// Cooling factor in (0, 1). Higher = slower cooling.
        alpha: f64,
    },

    /// Linear cooling: `T_k = T_0 - k * (T_0 - T_min) / max_steps`.
    ///
    /// Needs `max_iterations` to size the schedule.
    Linear,

    /// Lundy-Mees cooling: `T_{k+1} = T_k / (1 + beta * T_k)`.
    ///
    /// One iteration per temperature step.
    LundyMees {
        /// Cooling parameter. Typically `(T_0 - T_min) / (max_iter * T_0 * T_min)`.
        beta: f64,
    },
}

impl Default for CoolingSchedule {
    fn default() -> Self {
        CoolingSchedule::Geometric { alpha: 0.99 }
    }
}

/// Configuration for [`AnnealingOptimizer`](super::AnnealingOptimizer).
///
/// # Examples
///
/// ```
/// use u_grouping::sa::{SaConfig, CoolingSchedule};
///
/// let config = SaConfig::default()
///     .with_initial_temperature(20.0)
///     .with_min_temperature(0.01)
///     .with_cooling(CoolingSchedule::Geometric { alpha: 0.98 })
///     .with_max_iterations(50_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SaConfig {
    /// Initial temperature `T0`. Higher values accept more worsening moves.
    pub initial_temperature: f64,

    /// The run stops once the temperature drops to or below this.
    pub min_temperature: f64,

    /// Cooling schedule.
    pub cooling: CoolingSchedule,

    /// Sampled moves per temperature level.
    ///
    /// For `LundyMees`, this is ignored (1 iteration per temperature).
    pub iterations_per_temperature: usize,

    /// Hard budget on sampled moves. 0 = no limit.
    pub max_iterations: usize,

    /// Probability that a sampled move is a swap rather than a relocation.
    pub swap_probability: f64,

    /// Reheat after this many consecutive iterations without a new best.
    /// 0 disables reheating.
    pub reheat_after: usize,

    /// On reheat, `T ← min(T * reheat_factor, T0 / 2)`.
    pub reheat_factor: f64,

    /// Optional wall-clock limit, checked once per temperature level.
    pub time_limit_ms: Option<u64>,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 50.0,
            min_temperature: 0.05,
            cooling: CoolingSchedule::default(),
            iterations_per_temperature: 100,
            max_iterations: 0,
            swap_probability: 0.4,
            reheat_after: 0,
            reheat_factor: 2.0,
            time_limit_ms: None,
        }
    }
}

impl SaConfig {
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    pub fn with_cooling(mut self, cooling: CoolingSchedule) -> Self {
        self.cooling = cooling;
        self
    }

    pub fn with_iterations_per_temperature(mut self, n: usize) -> Self {
        self.iterations_per_temperature = n;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_swap_probability(mut self, p: f64) -> Self {
        self.swap_probability = p;
        self
    }

    /// Enables reheating after `after` non-improving iterations.
    pub fn with_reheat(mut self, after: usize, factor: f64) -> Self {
        self.reheat_after = after;
        self.reheat_factor = factor;
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.initial_temperature > 0.0) {
            return Err("initial_temperature must be positive".into());
        }
        if !(self.min_temperature > 0.0) {
            return Err("min_temperature must be positive".into());
        }
        if self.min_temperature >= self.initial_temperature {
            return Err("min_temperature must be less than initial_temperature".into());
        }
        if self.iterations_per_temperature == 0 {
            return Err("iterations_per_temperature must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.swap_probability) {
            return Err(format!(
                "swap_probability must be in [0, 1], got {}",
                self.swap_probability
            ));
        }
        match self.cooling {
            CoolingSchedule::Geometric { alpha } => {
                if !(alpha > 0.0 && alpha < 1.0) {
                    return Err(format!("geometric alpha must be in (0, 1), got {alpha}"));
                }
            }
            CoolingSchedule::LundyMees { beta } => {
                if !(beta > 0.0) {
                    return Err(format!("lundy-mees beta must be positive, got {beta}"));
                }
            }
            CoolingSchedule::Linear => {}
        }
        if self.reheat_after > 0 {
            if !(self.reheat_factor > 1.0) {
                return Err(format!(
                    "reheat_factor must be greater than 1, got {}",
                    self.reheat_factor
                ));
            }
            if self.max_iterations == 0 && self.time_limit_ms.is_none() {
                return Err("reheating requires max_iterations or time_limit_ms".into());
            }
            if self.cooling == CoolingSchedule::Linear {
                return Err("reheating is not supported with linear cooling".into());
            }
        }
        if self.time_limit_ms == Some(0) {
            return Err("time_limit_ms must be positive or None".into());
        }
        Ok(())
    }
}
