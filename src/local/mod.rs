//! Hill-climbing local search over relocations and swaps.
//!
//! Each pass visits every student once and applies the best strictly
//! improving feasible move available to that student. Passes repeat until
//! one applies nothing (a local optimum) or the pass budget runs out.
//!
//! The move vocabulary defined here is also the neighbourhood sampled by
//! [`sa`](crate::sa).

mod config;
mod runner;

pub use config::LocalSearchConfig;
pub use runner::{LocalSearchOptimizer, LocalSearchResult};
