//! Partitioning students into groups to maximize pairwise happiness under a
//! per-group stress cap.
//!
//! Given `n` students, `k` groups, symmetric happiness and stress matrices
//! and a global stress budget `S_max`, find an assignment of every student to
//! one group so that every group's stress stays within `S_max / k` and total
//! happiness is as high as possible.
//!
//! - **Model** ([`model`]): immutable [`Instance`](model::Instance) data and
//!   the mutable [`Partition`](model::Partition) with cached per-group sums.
//! - **Scoring** ([`score`]): O(k) totals and O(group size) move deltas.
//! - **Greedy** ([`greedy`]): deterministic construction, also the seed of the
//!   other optimizers.
//! - **Local Search** ([`local`]): best-improvement hill climbing over
//!   relocations and swaps.
//! - **Simulated Annealing** ([`sa`]): Metropolis acceptance with pluggable
//!   cooling schedules.
//! - **Genetic Algorithm** ([`ga`]): elitist GA with multi-point crossover and
//!   label repair.
//! - **Driver support** ([`strategy`], [`io`], [`validation`]): strategy
//!   dispatch, text formats and an independent solution checker.
//!
//! All randomness comes from a generator the caller seeds, so every run is
//! reproducible. The crate logs through `tracing` and installs no subscriber.
//!
//! # Examples
//!
//! ```
//! use u_grouping::model::Instance;
//! use u_grouping::strategy::{solve, StrategyKind};
//!
//! let h = vec![vec![0.0, 2.0, 0.0], vec![2.0, 0.0, 1.0], vec![0.0, 1.0, 0.0]];
//! let s = vec![vec![0.0; 3]; 3];
//! let instance = Instance::new(2, h, s, 4.0).unwrap();
//!
//! let solution = solve(&instance, &StrategyKind::Annealing.into(), 42).unwrap();
//! assert!(solution.feasible);
//! assert!((solution.total_happiness - 2.0).abs() < 1e-9);
//! ```

pub mod error;
pub mod ga;
pub mod greedy;
pub mod io;
pub mod local;
pub mod model;
pub mod sa;
pub mod score;
pub mod strategy;
pub mod validation;

pub use error::{GroupingError, InstanceError, MoveError};
