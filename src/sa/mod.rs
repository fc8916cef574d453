//! Simulated Annealing (SA).
//!
//! A single-solution trajectory search seeded by the greedy construction.
//! Each iteration samples one relocation or swap; infeasible moves are
//! rejected outright, improving moves are always taken, and worsening moves
//! are taken with probability `exp(Δh / T)`.
//!
//! The best partition seen is returned, ranked by `(feasible, happiness)`:
//! any feasible partition beats any infeasible one, and happiness only breaks
//! ties within the same feasibility. A feasible seed is therefore never
//! regressed. An infeasible seed may be replaced by a feasible partition with
//! lower happiness.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Lundy & Mees (1986), "Convergence of an Annealing Algorithm"

mod config;
mod runner;

pub use config::{CoolingSchedule, SaConfig};
pub use runner::{AnnealingOptimizer, SaResult};
