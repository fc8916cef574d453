//! Student-to-group assignment with cached per-group aggregates.

use super::instance::Instance;
use crate::error::GroupingError;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

/// A process-wide unique state identifier.
fn next_stamp() -> u64 {
    NEXT_STAMP.fetch_add(1, Ordering::Relaxed)
}

/// A proposed mutation of a [`Partition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Move {
    /// Move `student` into group `to`.
    Relocate { student: usize, to: usize },
    /// Exchange the groups of two students in different groups.
    Swap { a: usize, b: usize },
}

/// Assignment of every student to exactly one of `k` groups.
///
/// Besides `group_of`, the partition keeps member lists and the happiness and
/// stress sums of every group (over unordered co-located pairs). Those caches
/// are only changed through [`ScoreEngine::apply_move`](crate::score::ScoreEngine::apply_move)
/// so they always equal a from-scratch recomputation.
///
/// Every state carries a stamp that changes on each mutation. Clones share
/// the stamp of the state they copy. Equality ignores it.
#[derive(Debug, Clone)]
pub struct Partition {
    group_of: Vec<usize>,
    members: Vec<Vec<usize>>,
    /// Index of each student inside `members[group_of[s]]`.
    slot: Vec<usize>,
    group_happiness: Vec<f64>,
    group_stress: Vec<f64>,
    stamp: u64,
}

impl PartialEq for Partition {
    fn eq(&self, other: &Self) -> bool {
        self.group_of == other.group_of
            && self.group_happiness == other.group_happiness
            && self.group_stress == other.group_stress
    }
}

impl Partition {
    /// Rebuilds a partition (and its caches) from an assignment vector.
    ///
    /// Empty groups are allowed here so that externally stored solutions can
    /// be checked; the optimizers never produce them.
    ///
    /// # Complexity
    /// O(Σ |group|²)
    pub fn from_assignment(
        instance: &Instance,
        group_of: Vec<usize>,
    ) -> Result<Self, GroupingError> {
        let n = instance.n();
        let k = instance.k();
        if group_of.len() != n {
            return Err(GroupingError::InvalidAssignment(format!(
                "expected {n} entries, got {}",
                group_of.len()
            )));
        }
        if let Some((student, &g)) = group_of.iter().enumerate().find(|&(_, &g)| g >= k) {
            return Err(GroupingError::InvalidAssignment(format!(
                "student {student} assigned to group {g}, but only {k} groups exist"
            )));
        }

        Ok(Self::from_valid_assignment(instance, group_of))
    }

    /// Like [`from_assignment`](Self::from_assignment), for assignments the
    /// caller already knows to have length `n` and labels below `k`.
    pub(crate) fn from_valid_assignment(instance: &Instance, group_of: Vec<usize>) -> Self {
        let n = group_of.len();
        let k = instance.k();
        let mut members = vec![Vec::new(); k];
        let mut slot = vec![0; n];
        for (student, &g) in group_of.iter().enumerate() {
            slot[student] = members[g].len();
            members[g].push(student);
        }

        let mut group_happiness = vec![0.0; k];
        let mut group_stress = vec![0.0; k];
        for (g, list) in members.iter().enumerate() {
            for (x, &i) in list.iter().enumerate() {
                for &j in &list[x + 1..] {
                    group_happiness[g] += instance.happiness(i, j);
                    group_stress[g] += instance.stress(i, j);
                }
            }
        }

        Self {
            group_of,
            members,
            slot,
            group_happiness,
            group_stress,
            stamp: next_stamp(),
        }
    }

    /// Assembles a partition whose caches were accumulated by the caller.
    pub(crate) fn from_parts(
        group_of: Vec<usize>,
        members: Vec<Vec<usize>>,
        group_happiness: Vec<f64>,
        group_stress: Vec<f64>,
    ) -> Self {
        let mut slot = vec![0; group_of.len()];
        for list in &members {
            for (idx, &s) in list.iter().enumerate() {
                slot[s] = idx;
            }
        }
        Self {
            group_of,
            members,
            slot,
            group_happiness,
            group_stress,
            stamp: next_stamp(),
        }
    }

    /// Number of students.
    #[inline]
    pub fn n(&self) -> usize {
        self.group_of.len()
    }

    /// Identifier of the current state.
    #[inline]
    pub(crate) fn stamp(&self) -> u64 {
        self.stamp
    }

    /// Marks the state as changed.
    pub(crate) fn restamp(&mut self) {
        self.stamp = next_stamp();
    }

    /// Number of groups.
    #[inline]
    pub fn k(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn group_of(&self, student: usize) -> usize {
        self.group_of[student]
    }

    /// The full student-to-group mapping.
    pub fn assignment(&self) -> &[usize] {
        &self.group_of
    }

    /// Members of group `g`, in no particular order.
    #[inline]
    pub fn members(&self, g: usize) -> &[usize] {
        &self.members[g]
    }

    #[inline]
    pub fn group_size(&self, g: usize) -> usize {
        self.members[g].len()
    }

    #[inline]
    pub fn group_happiness(&self, g: usize) -> f64 {
        self.group_happiness[g]
    }

    #[inline]
    pub fn group_stress(&self, g: usize) -> f64 {
        self.group_stress[g]
    }

    pub fn group_stresses(&self) -> &[f64] {
        &self.group_stress
    }

    /// Number of groups with at least one member.
    pub fn used_groups(&self) -> usize {
        self.members.iter().filter(|m| !m.is_empty()).count()
    }

    /// Relabels groups in order of first appearance along the student index,
    /// so student 0 is always in group 0.
    ///
    /// Empty groups keep the highest labels.
    pub fn canonicalize(&mut self) {
        let k = self.k();
        let mut relabel = vec![usize::MAX; k];
        let mut next = 0;
        for &g in &self.group_of {
            if relabel[g] == usize::MAX {
                relabel[g] = next;
                next += 1;
            }
        }
        for label in relabel.iter_mut().filter(|l| **l == usize::MAX) {
            *label = next;
            next += 1;
        }
        if relabel.iter().enumerate().all(|(old, &new)| old == new) {
            return;
        }

        let mut members = vec![Vec::new(); k];
        let mut happiness = vec![0.0; k];
        let mut stress = vec![0.0; k];
        for old in 0..k {
            let new = relabel[old];
            members[new] = std::mem::take(&mut self.members[old]);
            happiness[new] = self.group_happiness[old];
            stress[new] = self.group_stress[old];
        }
        for g in self.group_of.iter_mut() {
            *g = relabel[*g];
        }
        self.members = members;
        self.group_happiness = happiness;
        self.group_stress = stress;
        self.restamp();
    }

    /// Consumes the partition, returning `group_of`.
    pub fn into_assignment(self) -> Vec<usize> {
        self.group_of
    }

    /// Moves `student` into group `to`, updating membership only. The caller
    /// restamps once the caches are adjusted.
    pub(crate) fn move_student(&mut self, student: usize, to: usize) {
        let from = self.group_of[student];
        let idx = self.slot[student];
        self.members[from].swap_remove(idx);
        if let Some(&moved) = self.members[from].get(idx) {
            self.slot[moved] = idx;
        }
        self.slot[student] = self.members[to].len();
        self.members[to].push(student);
        self.group_of[student] = to;
    }

    /// Adds deltas to the cached aggregates of group `g`.
    pub(crate) fn adjust(&mut self, g: usize, happiness: f64, stress: f64) {
        self.group_happiness[g] += happiness;
        self.group_stress[g] += stress;
    }
}

/// The value handed back to callers: an assignment with its score.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    /// Group of each student.
    pub group_of: Vec<usize>,
    /// Sum of pairwise happiness over co-located students.
    pub total_happiness: f64,
    /// Whether every group's stress is within the per-group cap.
    pub feasible: bool,
}

impl Solution {
    /// Students of each group, ordered by student index.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let k = self.group_of.iter().max().map_or(0, |&g| g + 1);
        let mut groups = vec![Vec::new(); k];
        for (student, &g) in self.group_of.iter().enumerate() {
            groups[g].push(student);
        }
        groups
    }
}
