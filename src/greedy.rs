//! Greedy construction of an initial partition.
//!
//! Students are placed one at a time. Each goes to the feasible group with
//! the largest happiness gain against that group's current members; ties go
//! to the group with the lower resulting stress, then the lower index. When
//! no group can take the student within the stress cap, it is placed where
//! the resulting stress is lowest and the partition is left infeasible.
//!
//! Once the students still to be placed are no more than the empty groups,
//! only empty groups are offered, so every one of the `k` groups ends up
//! populated.
//!
//! The stress tie-break matters for zero-gain placements. With two disjoint
//! friend pairs `{0, 1}` and `{2, 3}` and `k = 2`, student 2 has no gain in
//! either group; by index alone it would join `{0, 1}` and leave student 3
//! alone, while the lower-stress rule sends it to the empty group and yields
//! `{0, 1}, {2, 3}`.

use crate::model::{Instance, Partition};
use crate::score::{ScoreEngine, FEASIBILITY_TOLERANCE};
use rand::seq::SliceRandom;
use rand::Rng;

const TIE_EPSILON: f64 = 1e-12;

/// Builds partitions by greedy insertion.
pub struct GreedyConstructor;

impl GreedyConstructor {
    /// Places students in ascending index order. Deterministic.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_grouping::model::Instance;
    /// use u_grouping::greedy::GreedyConstructor;
    ///
    /// let h = vec![vec![0.0, 2.0], vec![2.0, 0.0]];
    /// let s = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
    /// let instance = Instance::new(1, h, s, 5.0).unwrap();
    /// let partition = GreedyConstructor::build(&instance);
    /// assert_eq!(partition.assignment(), &[0, 0]);
    /// ```
    pub fn build(instance: &Instance) -> Partition {
        let order: Vec<usize> = (0..instance.n()).collect();
        Self::build_in_order(instance, &order)
    }

    /// Same placement rule, with the student order shuffled by `rng`.
    pub fn randomized<R: Rng>(instance: &Instance, rng: &mut R) -> Partition {
        let mut order: Vec<usize> = (0..instance.n()).collect();
        order.shuffle(rng);
        Self::build_in_order(instance, &order)
    }

    fn build_in_order(instance: &Instance, order: &[usize]) -> Partition {
        let engine = ScoreEngine::new(instance);
        let n = instance.n();
        let k = instance.k();
        let cap = instance.stress_cap();

        let mut group_of = vec![0; n];
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); k];
        let mut happiness = vec![0.0; k];
        let mut stress = vec![0.0; k];
        let mut empty_groups = k;
        let mut infeasible_placements = 0usize;

        for (placed, &student) in order.iter().enumerate() {
            let must_fill_empty = n - placed <= empty_groups;

            // (group, gain, stress_after, stress_delta)
            let mut best_feasible: Option<(usize, f64, f64, f64)> = None;
            let mut best_fallback: Option<(usize, f64, f64, f64)> = None;

            for g in 0..k {
                if must_fill_empty && !members[g].is_empty() {
                    continue;
                }
                let (dh, ds) = engine.affinity(student, &members[g]);
                let after = stress[g] + ds;

                if after <= cap + FEASIBILITY_TOLERANCE {
                    let better = match best_feasible {
                        None => true,
                        Some((_, gain, s_after, _)) => {
                            let tied = (dh - gain).abs() <= TIE_EPSILON;
                            dh > gain + TIE_EPSILON || (tied && after < s_after - TIE_EPSILON)
                        }
                    };
                    if better {
                        best_feasible = Some((g, dh, after, ds));
                    }
                } else if best_fallback
                    .is_none_or(|(_, _, s_after, _)| after < s_after - TIE_EPSILON)
                {
                    best_fallback = Some((g, dh, after, ds));
                }
            }

            let Some((g, dh, _, ds)) = best_feasible.or(best_fallback) else {
                // Only reachable with k == 0, which Instance rules out.
                continue;
            };
            if best_feasible.is_none() {
                infeasible_placements += 1;
                tracing::warn!(
                    student,
                    group = g,
                    "greedy: no group can take student within stress cap {cap}"
                );
            }

            if members[g].is_empty() {
                empty_groups -= 1;
            }
            members[g].push(student);
            group_of[student] = g;
            happiness[g] += dh;
            stress[g] += ds;
        }

        tracing::debug!(
            happiness = happiness.iter().sum::<f64>(),
            infeasible_placements,
            "greedy construction finished"
        );

        Partition::from_parts(group_of, members, happiness, stress)
    }
}
