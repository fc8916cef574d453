//! Genetic operators on group-assignment chromosomes.
//!
//! A chromosome is `group_of`: one group label per student.
//!
//! - [`random_chromosome`]: uniform labels, then label repair
//! - [`multi_point_crossover`]: segments between cut points alternate parents
//! - [`repair_labels`]: reassign students so no group label goes unused
//! - [`mutate`]: per-student random relocation through the score engine

use crate::model::{Move, Partition};
use crate::score::ScoreEngine;
use rand::seq::index;
use rand::Rng;

/// A uniformly random assignment of `n` students to `k` groups with every
/// group used.
pub fn random_chromosome<R: Rng>(n: usize, k: usize, rng: &mut R) -> Vec<usize> {
    let mut chromosome: Vec<usize> = (0..n).map(|_| rng.random_range(0..k)).collect();
    repair_labels(&mut chromosome, k, rng);
    chromosome
}

/// Multi-point crossover.
///
/// Picks `points` distinct cut positions in `1..n` (fewer if `n` is small)
/// and builds two children whose segments alternate between the parents.
///
/// # Panics
/// Panics if parents have different lengths.
pub fn multi_point_crossover<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    points: usize,
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let n = parent1.len();
    assert_eq!(n, parent2.len(), "parents must have equal length");

    if n < 2 || points == 0 {
        return (parent1.to_vec(), parent2.to_vec());
    }

    let mut cuts: Vec<usize> = index::sample(rng, n - 1, points.min(n - 1))
        .into_iter()
        .map(|c| c + 1)
        .collect();
    cuts.sort_unstable();

    let mut child1 = Vec::with_capacity(n);
    let mut child2 = Vec::with_capacity(n);
    let mut from_first = true;
    let mut start = 0;
    for end in cuts.into_iter().chain(std::iter::once(n)) {
        let (a, b) = if from_first {
            (parent1, parent2)
        } else {
            (parent2, parent1)
        };
        child1.extend_from_slice(&a[start..end]);
        child2.extend_from_slice(&b[start..end]);
        from_first = !from_first;
        start = end;
    }
    (child1, child2)
}

/// Ensures all `k` labels appear in `chromosome`.
///
/// For each missing label, one randomly chosen member of the currently
/// largest group is moved to it. Returns the number of students moved.
/// Requires `chromosome.len() >= k`.
pub fn repair_labels<R: Rng>(chromosome: &mut [usize], k: usize, rng: &mut R) -> usize {
    let mut sizes = vec![0usize; k];
    for &g in chromosome.iter() {
        sizes[g] += 1;
    }

    let mut moved = 0;
    for missing in 0..k {
        if sizes[missing] > 0 {
            continue;
        }
        let Some(largest) = (0..k).max_by_key(|&g| (sizes[g], std::cmp::Reverse(g))) else {
            break;
        };
        if sizes[largest] < 2 {
            break;
        }
        let pick = rng.random_range(0..sizes[largest]);
        if let Some(student) = chromosome
            .iter()
            .enumerate()
            .filter(|&(_, &g)| g == largest)
            .map(|(i, _)| i)
            .nth(pick)
        {
            chromosome[student] = missing;
            sizes[largest] -= 1;
            sizes[missing] += 1;
            moved += 1;
        }
    }
    moved
}

/// Reassigns each student to a different random group with probability
/// `rate`, committing through the score engine so caches stay exact.
///
/// Relocations that would empty a group are skipped. Returns the number of
/// students moved.
pub fn mutate<R: Rng>(
    engine: &ScoreEngine<'_>,
    partition: &mut Partition,
    rate: f64,
    rng: &mut R,
) -> usize {
    let k = partition.k();
    if k < 2 || rate <= 0.0 {
        return 0;
    }

    let mut moved = 0;
    for student in 0..partition.n() {
        if !rng.random_bool(rate) {
            continue;
        }
        let mut to = rng.random_range(0..k - 1);
        if to >= partition.group_of(student) {
            to += 1;
        }
        if engine
            .try_move(partition, Move::Relocate { student, to })
            .is_ok()
        {
            moved += 1;
        }
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Instance;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn labels_used(chromosome: &[usize], k: usize) -> bool {
        (0..k).all(|g| chromosome.contains(&g))
    }

    #[test]
    fn test_random_chromosome_uses_all_groups() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let c = random_chromosome(6, 5, &mut rng);
            assert_eq!(c.len(), 6);
            assert!(labels_used(&c, 5));
        }
    }

    #[test]
    fn test_crossover_takes_genes_from_parents() {
        let mut rng = StdRng::seed_from_u64(42);
        let p1 = vec![0; 10];
        let p2 = vec![1; 10];
        for points in 1..4 {
            let (c1, c2) = multi_point_crossover(&p1, &p2, points, &mut rng);
            assert_eq!(c1.len(), 10);
            for i in 0..10 {
                // Complementary children
                assert_ne!(c1[i], c2[i]);
            }
            // First segment always comes from parent1.
            assert_eq!(c1[0], 0);
            // Number of label changes along c1 equals number of cuts.
            let switches = c1.windows(2).filter(|w| w[0] != w[1]).count();
            assert_eq!(switches, points);
        }
    }

    #[test]
    fn test_crossover_small_inputs() {
        let mut rng = StdRng::seed_from_u64(1);
        let (c1, c2) = multi_point_crossover(&[3], &[4], 2, &mut rng);
        assert_eq!((c1, c2), (vec![3], vec![4]));

        // More points than gaps: capped at n - 1.
        let (c1, _) = multi_point_crossover(&[0, 0, 0], &[1, 1, 1], 10, &mut rng);
        assert_eq!(c1, vec![0, 1, 0]);
    }

    #[test]
    fn test_repair_labels() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut c = vec![0, 0, 0, 0, 1, 1];
        let moved = repair_labels(&mut c, 4, &mut rng);
        assert_eq!(moved, 2);
        assert!(labels_used(&c, 4));

        let mut c = vec![0, 1, 2];
        assert_eq!(repair_labels(&mut c, 3, &mut rng), 0);
        assert_eq!(c, vec![0, 1, 2]);
    }

    #[test]
    fn test_mutate_keeps_cache_exact() {
        let n = 8;
        let h: Vec<Vec<f64>> = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 0.0 } else { (i + j) as f64 }).collect())
            .collect();
        let s = h.clone();
        let inst = Instance::new(3, h, s, 100.0).unwrap();
        let engine = ScoreEngine::new(&inst);
        let mut rng = StdRng::seed_from_u64(3);
        let chromosome = random_chromosome(n, 3, &mut rng);
        let mut p = Partition::from_assignment(&inst, chromosome).unwrap();

        let moved = mutate(&engine, &mut p, 0.5, &mut rng);
        assert!(moved > 0);
        assert_eq!(p.used_groups(), 3);
        let fresh = Partition::from_assignment(&inst, p.assignment().to_vec()).unwrap();
        for g in 0..3 {
            assert!((fresh.group_happiness(g) - p.group_happiness(g)).abs() < 1e-9);
            assert!((fresh.group_stress(g) - p.group_stress(g)).abs() < 1e-9);
        }
    }
}
