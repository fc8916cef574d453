//! Problem and solution data.
//!
//! - [`Instance`]: immutable problem data (`n`, `k`, happiness, stress, `S_max`)
//! - [`Partition`]: mutable assignment with cached per-group sums
//! - [`Move`]: a relocation or swap proposal
//! - [`Solution`]: what optimizers return

mod instance;
mod partition;

pub use instance::{Instance, PairMatrix};
pub use partition::{Move, Partition, Solution};
