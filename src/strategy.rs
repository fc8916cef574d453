//! Strategy selection and dispatch.
//!
//! A [`Strategy`] names an optimizer together with its configuration.
//! [`solve`] runs one of them with a seeded generator; [`solve_portfolio`]
//! runs several on the same instance and picks the best answer.

use crate::error::GroupingError;
use crate::ga::{GaConfig, GeneticOptimizer};
use crate::greedy::GreedyConstructor;
use crate::local::{LocalSearchConfig, LocalSearchOptimizer};
use crate::model::{Instance, Solution};
use crate::sa::{AnnealingOptimizer, SaConfig};
use crate::score::ScoreEngine;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::str::FromStr;

/// Optimizer family, parsed from a driver argument.
///
/// # Examples
///
/// ```
/// use u_grouping::strategy::StrategyKind;
///
/// assert_eq!("sim_annealing".parse::<StrategyKind>().unwrap(), StrategyKind::Annealing);
/// assert_eq!("GA".parse::<StrategyKind>().unwrap(), StrategyKind::Genetic);
/// assert!("tabu".parse::<StrategyKind>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StrategyKind {
    /// Greedy construction followed by local search.
    Greedy,
    /// Simulated annealing seeded by greedy.
    Annealing,
    /// Genetic algorithm.
    Genetic,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Greedy,
        StrategyKind::Annealing,
        StrategyKind::Genetic,
    ];

    /// This kind with default configuration.
    pub fn default_strategy(self) -> Strategy {
        match self {
            StrategyKind::Greedy => Strategy::Greedy(LocalSearchConfig::default()),
            StrategyKind::Annealing => Strategy::Annealing(SaConfig::default()),
            StrategyKind::Genetic => Strategy::Genetic(GaConfig::default()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Greedy => "greedy",
            StrategyKind::Annealing => "sim_annealing",
            StrategyKind::Genetic => "genetic",
        };
        f.write_str(name)
    }
}

impl FromStr for StrategyKind {
    type Err = GroupingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(StrategyKind::Greedy),
            "sim_annealing" | "annealing" | "sa" => Ok(StrategyKind::Annealing),
            "genetic" | "ga" => Ok(StrategyKind::Genetic),
            other => Err(GroupingError::InvalidConfig(format!(
                "unknown strategy `{other}` (expected greedy, sim_annealing or genetic)"
            ))),
        }
    }
}

/// An optimizer with its configuration.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    /// Greedy construction, then local search with this configuration.
    Greedy(LocalSearchConfig),
    Annealing(SaConfig),
    Genetic(GaConfig),
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Greedy(_) => StrategyKind::Greedy,
            Strategy::Annealing(_) => StrategyKind::Annealing,
            Strategy::Genetic(_) => StrategyKind::Genetic,
        }
    }
}

impl From<StrategyKind> for Strategy {
    fn from(kind: StrategyKind) -> Self {
        kind.default_strategy()
    }
}

/// Runs `strategy` on `instance` with a generator seeded from `seed`.
///
/// The greedy strategy is deterministic and ignores the seed. Configuration
/// errors surface before any search starts; an infeasible result is returned
/// with `feasible == false`.
///
/// # Examples
///
/// ```
/// use u_grouping::model::Instance;
/// use u_grouping::strategy::{solve, StrategyKind};
///
/// let h = vec![
///     vec![0.0, 5.0, 0.0, 0.0],
///     vec![5.0, 0.0, 0.0, 0.0],
///     vec![0.0, 0.0, 0.0, 5.0],
///     vec![0.0, 0.0, 5.0, 0.0],
/// ];
/// let mut s = vec![vec![0.0; 4]; 4];
/// s[0][1] = 3.0;
/// s[1][0] = 3.0;
/// s[2][3] = 3.0;
/// s[3][2] = 3.0;
/// let instance = Instance::new(2, h, s, 10.0).unwrap();
///
/// let solution = solve(&instance, &StrategyKind::Greedy.into(), 0).unwrap();
/// assert_eq!(solution.group_of, vec![0, 0, 1, 1]);
/// assert!((solution.total_happiness - 10.0).abs() < 1e-9);
/// ```
pub fn solve(
    instance: &Instance,
    strategy: &Strategy,
    seed: u64,
) -> Result<Solution, GroupingError> {
    let solution = match strategy {
        Strategy::Greedy(config) => {
            let local = LocalSearchOptimizer::new(config.clone())?;
            let mut partition = GreedyConstructor::build(instance);
            local.improve(instance, &mut partition);
            ScoreEngine::new(instance).solution(&partition)
        }
        Strategy::Annealing(config) => {
            let rng = StdRng::seed_from_u64(seed);
            let mut sa = AnnealingOptimizer::new(config.clone(), rng)?;
            sa.run(instance).solution
        }
        Strategy::Genetic(config) => {
            let rng = StdRng::seed_from_u64(seed);
            let mut ga = GeneticOptimizer::new(config.clone(), rng)?;
            ga.run(instance).solution
        }
    };

    tracing::info!(
        strategy = %strategy.kind(),
        seed,
        happiness = solution.total_happiness,
        feasible = solution.feasible,
        "strategy finished"
    );
    Ok(solution)
}

/// Results of [`solve_portfolio`], in the order the strategies were given.
#[derive(Debug, Clone)]
pub struct PortfolioResult {
    pub solutions: Vec<(StrategyKind, Solution)>,
    /// Index of the best entry: feasible before infeasible, then highest
    /// happiness, then earliest.
    pub best: usize,
}

impl PortfolioResult {
    pub fn best_solution(&self) -> &Solution {
        &self.solutions[self.best].1
    }
}

/// Runs every strategy on `instance`; strategy `i` is seeded with `seed + i`.
///
/// With the `parallel` feature the strategies run on the rayon thread pool,
/// otherwise one after another. Either way the result is the same.
pub fn solve_portfolio(
    instance: &Instance,
    strategies: &[Strategy],
    seed: u64,
) -> Result<PortfolioResult, GroupingError> {
    if strategies.is_empty() {
        return Err(GroupingError::InvalidConfig(
            "portfolio needs at least one strategy".into(),
        ));
    }

    let run = |(i, strategy): (usize, &Strategy)| {
        solve(instance, strategy, seed.wrapping_add(i as u64))
            .map(|sol| (strategy.kind(), sol))
    };

    #[cfg(feature = "parallel")]
    let solutions: Vec<(StrategyKind, Solution)> = {
        use rayon::prelude::*;
        strategies
            .par_iter()
            .enumerate()
            .map(run)
            .collect::<Result<_, _>>()?
    };

    #[cfg(not(feature = "parallel"))]
    let solutions: Vec<(StrategyKind, Solution)> = strategies
        .iter()
        .enumerate()
        .map(run)
        .collect::<Result<_, _>>()?;

    let mut best = 0;
    for (i, (_, sol)) in solutions.iter().enumerate().skip(1) {
        let incumbent = &solutions[best].1;
        if (sol.feasible, sol.total_happiness) > (incumbent.feasible, incumbent.total_happiness) {
            best = i;
        }
    }

    Ok(PortfolioResult { solutions, best })
}
