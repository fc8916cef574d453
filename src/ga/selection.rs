//! Parent selection.
//!
//! Selection determines which individuals are chosen as parents for
//! crossover. Fitness is maximized: higher is better.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Baker (1985), "Adaptive Selection Methods for Genetic Algorithms"

use rand::Rng;

/// Selection strategy for choosing parents.
///
/// # Examples
///
/// ```
/// use u_grouping::ga::Selection;
///
/// let sel = Selection::Tournament(3);
/// assert_eq!(sel, Selection::default());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Selection {
    /// Pick `k` individuals uniformly with replacement, keep the fittest.
    ///
    /// Higher `k` = stronger selection pressure.
    Tournament(usize),

    /// Fitness-proportionate selection on `fitness - min + ε`, so negative
    /// (penalized) fitness values still get a weight.
    Roulette,

    /// Linear ranking: the best of `n` gets weight `n`, the worst weight 1.
    Rank,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Tournament(3)
    }
}

impl Selection {
    /// Select a parent index given the population's fitness values.
    ///
    /// # Panics
    /// Panics if `fitness` is empty.
    pub fn select<R: Rng>(&self, fitness: &[f64], rng: &mut R) -> usize {
        assert!(!fitness.is_empty(), "cannot select from empty population");

        match self {
            Selection::Tournament(k) => tournament(fitness, *k, rng),
            Selection::Roulette => roulette(fitness, rng),
            Selection::Rank => rank(fitness, rng),
        }
    }
}

fn tournament<R: Rng>(fitness: &[f64], k: usize, rng: &mut R) -> usize {
    let k = k.max(1);
    let n = fitness.len();

    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k {
        let idx = rng.random_range(0..n);
        if fitness[idx] > fitness[best_idx] {
            best_idx = idx;
        }
    }
    best_idx
}

fn roulette<R: Rng>(fitness: &[f64], rng: &mut R) -> usize {
    let n = fitness.len();
    if n == 1 {
        return 0;
    }

    let min_fitness = fitness.iter().cloned().fold(f64::INFINITY, f64::min);
    let epsilon = 1e-10;
    let weights: Vec<f64> = fitness.iter().map(|&f| f - min_fitness + epsilon).collect();

    let total: f64 = weights.iter().sum();
    if !(total > 0.0) || !total.is_finite() {
        return rng.random_range(0..n);
    }

    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > threshold {
            return i;
        }
    }

    n - 1 // floating-point fallback
}

fn rank<R: Rng>(fitness: &[f64], rng: &mut R) -> usize {
    let n = fitness.len();
    if n == 1 {
        return 0;
    }

    // Best first
    let mut indexed: Vec<usize> = (0..n).collect();
    indexed.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]));

    let total: f64 = (n * (n + 1)) as f64 / 2.0;
    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;

    for (rank, &idx) in indexed.iter().enumerate() {
        cumulative += (n - rank) as f64;
        if cumulative > threshold {
            return idx;
        }
    }

    indexed[n - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn counts(selection: Selection, fitness: &[f64]) -> Vec<u32> {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = vec![0u32; fitness.len()];
        for _ in 0..10_000 {
            counts[selection.select(fitness, &mut rng)] += 1;
        }
        counts
    }

    #[test]
    fn test_tournament_favors_best() {
        let c = counts(Selection::Tournament(4), &[1.0, 5.0, 10.0, 8.0]);
        assert!(c[2] > 6000, "expected best selected >60%, got {c:?}");
    }

    #[test]
    fn test_tournament_size_1_is_random() {
        let c = counts(Selection::Tournament(1), &[1.0, 5.0, 10.0, 8.0]);
        for &x in &c {
            assert!(x > 1500, "expected uniform, got counts: {c:?}");
        }
    }

    #[test]
    fn test_roulette_favors_best() {
        let c = counts(Selection::Roulette, &[1.0, 50.0, 100.0, 80.0]);
        assert!(c[2] > c[0], "best should beat worst: {c:?}");
    }

    #[test]
    fn test_roulette_handles_negative_fitness() {
        let c = counts(Selection::Roulette, &[-50.0, -10.0, -30.0]);
        assert!(c[1] > c[0], "least penalized should win: {c:?}");
    }

    #[test]
    fn test_rank_favors_best() {
        let c = counts(Selection::Rank, &[1.0, 50.0, 100.0, 80.0]);
        assert!(c[2] > c[0], "best should beat worst: {c:?}");
    }

    #[test]
    fn test_single_individual() {
        let mut rng = StdRng::seed_from_u64(42);
        assert_eq!(Selection::Tournament(3).select(&[5.0], &mut rng), 0);
        assert_eq!(Selection::Roulette.select(&[5.0], &mut rng), 0);
        assert_eq!(Selection::Rank.select(&[5.0], &mut rng), 0);
    }

    #[test]
    #[should_panic(expected = "cannot select from empty population")]
    fn test_empty_population_panics() {
        let mut rng = StdRng::seed_from_u64(42);
        Selection::Tournament(3).select(&[], &mut rng);
    }
}
