//! Local search configuration.

/// Configuration for [`LocalSearchOptimizer`](super::LocalSearchOptimizer).
///
/// # Examples
///
/// ```
/// use u_grouping::local::LocalSearchConfig;
///
/// let config = LocalSearchConfig::default().with_max_passes(50);
/// assert_eq!(config.max_passes, 50);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalSearchConfig {
    /// Maximum number of full passes over the students.
    pub max_passes: usize,

    /// A move must raise happiness by more than this to count as improving.
    pub min_improvement: f64,
}

impl Default for LocalSearchConfig {
    fn default() -> Self {
        Self {
            max_passes: 1000,
            min_improvement: 1e-9,
        }
    }
}

impl LocalSearchConfig {
    pub fn with_max_passes(mut self, n: usize) -> Self {
        self.max_passes = n;
        self
    }

    pub fn with_min_improvement(mut self, eps: f64) -> Self {
        self.min_improvement = eps;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_passes == 0 {
            return Err("max_passes must be at least 1".into());
        }
        if !(self.min_improvement >= 0.0) {
            return Err(format!(
                "min_improvement must be non-negative, got {}",
                self.min_improvement
            ));
        }
        Ok(())
    }
}
