//! Objective and constraint evaluation.
//!
//! [`ScoreEngine`] is the single place where partitions are scored and
//! mutated. Candidate moves are priced by [`ScoreEngine::delta_for_move`] in
//! O(|source group| + |target group|) and committed with
//! [`ScoreEngine::apply_move`], which updates membership and cached sums in
//! one step.

use crate::error::MoveError;
use crate::model::{Instance, Move, Partition, Solution};

/// Slack allowed when comparing a stress sum against the cap, to absorb
/// floating-point drift from incremental updates.
pub const FEASIBILITY_TOLERANCE: f64 = 1e-9;

/// Change to one group caused by a move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupDelta {
    pub group: usize,
    pub happiness: f64,
    pub stress: f64,
}

/// The priced effect of a [`Move`] on a specific partition state.
///
/// Only [`ScoreEngine::delta_for_move`] creates deltas. Each one remembers the
/// state it was priced against, and [`ScoreEngine::apply_move`] refuses it
/// once that partition has changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveDelta {
    mv: Move,
    happiness: f64,
    groups: [GroupDelta; 2],
    stamp: u64,
}

impl MoveDelta {
    /// The priced move.
    pub fn mv(&self) -> Move {
        self.mv
    }

    /// Total happiness change.
    pub fn happiness(&self) -> f64 {
        self.happiness
    }

    /// Source group first, destination group second (for swaps: the groups
    /// of `a` and `b`).
    pub fn groups(&self) -> &[GroupDelta; 2] {
        &self.groups
    }
}

/// Scores and mutates partitions of one [`Instance`].
#[derive(Debug, Clone, Copy)]
pub struct ScoreEngine<'a> {
    instance: &'a Instance,
}

impl<'a> ScoreEngine<'a> {
    pub fn new(instance: &'a Instance) -> Self {
        Self { instance }
    }

    pub fn instance(&self) -> &'a Instance {
        self.instance
    }

    /// `S_max / k`.
    #[inline]
    pub fn stress_cap(&self) -> f64 {
        self.instance.stress_cap()
    }

    /// Sum of cached group happiness. O(k).
    pub fn total_happiness(&self, partition: &Partition) -> f64 {
        (0..partition.k()).map(|g| partition.group_happiness(g)).sum()
    }

    /// True iff every group's stress is within the cap. O(k).
    pub fn is_feasible(&self, partition: &Partition) -> bool {
        let cap = self.stress_cap();
        partition
            .group_stresses()
            .iter()
            .all(|&s| s <= cap + FEASIBILITY_TOLERANCE)
    }

    /// Total stress above the cap, summed over groups.
    pub fn violation(&self, partition: &Partition) -> f64 {
        let cap = self.stress_cap();
        partition
            .group_stresses()
            .iter()
            .map(|&s| (s - cap).max(0.0))
            .sum()
    }

    /// Happiness and stress between `student` and `members`, skipping the
    /// student itself if present.
    pub fn affinity(&self, student: usize, members: &[usize]) -> (f64, f64) {
        let h = self.instance.happiness_matrix().row(student);
        let s = self.instance.stress_matrix().row(student);
        members
            .iter()
            .filter(|&&m| m != student)
            .fold((0.0, 0.0), |(dh, ds), &m| (dh + h[m], ds + s[m]))
    }

    /// Prices `mv` against the current state of `partition` without
    /// mutating it.
    ///
    /// Rejects moves that are no-ops, out of range, or that would empty a
    /// group.
    pub fn delta_for_move(&self, partition: &Partition, mv: Move) -> Result<MoveDelta, MoveError> {
        let n = partition.n();
        match mv {
            Move::Relocate { student, to } => {
                if student >= n {
                    return Err(MoveError::StudentOutOfRange(student));
                }
                if to >= partition.k() {
                    return Err(MoveError::GroupOutOfRange(to));
                }
                let from = partition.group_of(student);
                if from == to {
                    return Err(MoveError::SameGroup { student, group: to });
                }
                if partition.group_size(from) <= 1 {
                    return Err(MoveError::WouldEmptyGroup {
                        student,
                        group: from,
                    });
                }

                let (h_out, s_out) = self.affinity(student, partition.members(from));
                let (h_in, s_in) = self.affinity(student, partition.members(to));
                Ok(MoveDelta {
                    mv,
                    stamp: partition.stamp(),
                    happiness: h_in - h_out,
                    groups: [
                        GroupDelta {
                            group: from,
                            happiness: -h_out,
                            stress: -s_out,
                        },
                        GroupDelta {
                            group: to,
                            happiness: h_in,
                            stress: s_in,
                        },
                    ],
                })
            }
            Move::Swap { a, b } => {
                if a >= n {
                    return Err(MoveError::StudentOutOfRange(a));
                }
                if b >= n {
                    return Err(MoveError::StudentOutOfRange(b));
                }
                if a == b {
                    return Err(MoveError::SameStudent(a));
                }
                let ga = partition.group_of(a);
                let gb = partition.group_of(b);
                if ga == gb {
                    return Err(MoveError::SameGroup {
                        student: b,
                        group: ga,
                    });
                }

                let h_ab = self.instance.happiness(a, b);
                let s_ab = self.instance.stress(a, b);
                // a leaves ga, b joins ga (without pairing with a).
                let (ha_ga, sa_ga) = self.affinity(a, partition.members(ga));
                let (hb_ga, sb_ga) = self.affinity(b, partition.members(ga));
                let (hb_gb, sb_gb) = self.affinity(b, partition.members(gb));
                let (ha_gb, sa_gb) = self.affinity(a, partition.members(gb));

                let first = GroupDelta {
                    group: ga,
                    happiness: (hb_ga - h_ab) - ha_ga,
                    stress: (sb_ga - s_ab) - sa_ga,
                };
                let second = GroupDelta {
                    group: gb,
                    happiness: (ha_gb - h_ab) - hb_gb,
                    stress: (sa_gb - s_ab) - sb_gb,
                };
                Ok(MoveDelta {
                    mv,
                    stamp: partition.stamp(),
                    happiness: first.happiness + second.happiness,
                    groups: [first, second],
                })
            }
        }
    }

    /// True if both affected groups stay within the cap after the move.
    pub fn is_move_feasible(&self, partition: &Partition, delta: &MoveDelta) -> bool {
        let cap = self.stress_cap() + FEASIBILITY_TOLERANCE;
        delta
            .groups
            .iter()
            .all(|d| partition.group_stress(d.group) + d.stress <= cap)
    }

    /// Commits a delta produced by [`delta_for_move`](Self::delta_for_move)
    /// on the same, unmodified partition.
    ///
    /// A delta priced against any other state is rejected with
    /// [`MoveError::StaleDelta`] and the partition is left untouched.
    pub fn apply_move(
        &self,
        partition: &mut Partition,
        delta: &MoveDelta,
    ) -> Result<(), MoveError> {
        if delta.stamp != partition.stamp() {
            return Err(MoveError::StaleDelta);
        }
        match delta.mv {
            Move::Relocate { student, to } => partition.move_student(student, to),
            Move::Swap { a, b } => {
                let ga = partition.group_of(a);
                let gb = partition.group_of(b);
                partition.move_student(a, gb);
                partition.move_student(b, ga);
            }
        }
        for d in &delta.groups {
            partition.adjust(d.group, d.happiness, d.stress);
        }
        partition.restamp();
        Ok(())
    }

    /// Prices and commits `mv` in one call.
    pub fn try_move(&self, partition: &mut Partition, mv: Move) -> Result<MoveDelta, MoveError> {
        let delta = self.delta_for_move(partition, mv)?;
        self.apply_move(partition, &delta)?;
        Ok(delta)
    }

    /// Packages a partition as a [`Solution`].
    pub fn solution(&self, partition: &Partition) -> Solution {
        Solution {
            group_of: partition.assignment().to_vec(),
            total_happiness: self.total_happiness(partition),
            feasible: self.is_feasible(partition),
        }
    }

    /// Happiness of an assignment recomputed pair by pair. O(n²).
    pub fn recompute_happiness(&self, group_of: &[usize]) -> f64 {
        let mut total = 0.0;
        for i in 0..group_of.len() {
            for j in i + 1..group_of.len() {
                if group_of[i] == group_of[j] {
                    total += self.instance.happiness(i, j);
                }
            }
        }
        total
    }
}
