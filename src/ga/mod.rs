//! Genetic Algorithm (GA).
//!
//! Chromosomes are `group_of` vectors. Each generation keeps the elites,
//! selects parents on penalized fitness, recombines them with multi-point
//! crossover, repairs unused group labels, and mutates students with a
//! per-student probability. The initial population mixes greedy seeds with
//! uniformly random assignments.
//!
//! # Key Types
//!
//! - [`GaConfig`]: Algorithm parameters (population size, selection, penalty)
//! - [`GeneticOptimizer`]: Executes the evolutionary loop
//! - [`GaResult`]: Final optimization result with statistics
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - Falkenauer (1998), *Genetic Algorithms and Grouping Problems*

mod config;
pub mod operators;
mod runner;
mod selection;

pub use config::GaConfig;
pub use runner::{GaResult, GeneticOptimizer, Individual};
pub use selection::Selection;
