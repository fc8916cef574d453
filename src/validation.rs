//! Independent checking of assignments.
//!
//! Recomputes everything from the raw matrices by brute force, without the
//! partition caches or the incremental score engine. Detects:
//! - Wrong assignment length
//! - Group labels outside `0..k`
//! - Unused groups
//! - Groups whose stress exceeds `S_max / k`

use crate::model::Instance;
use crate::score::FEASIBILITY_TOLERANCE;

/// A structural problem with an assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// `group_of` does not have one entry per student.
    WrongLength,
    /// A student is assigned to a label `>= k`.
    GroupOutOfRange,
    /// A group has no members.
    EmptyGroup,
    /// A group's stress exceeds the per-group cap.
    StressExceeded,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of [`validate_solution`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    /// Sum of happiness over co-located pairs (0 if the assignment is malformed).
    pub total_happiness: f64,
    /// Stress of each group `0..k`.
    pub group_stress: Vec<f64>,
    /// Every group's stress is within the cap.
    pub feasible: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    /// No structural errors and no stress violations.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks `group_of` against `instance` and recomputes its score.
///
/// # Examples
///
/// ```
/// use u_grouping::model::Instance;
/// use u_grouping::validation::validate_solution;
///
/// let h = vec![vec![0.0, 5.0], vec![5.0, 0.0]];
/// let s = vec![vec![0.0, 3.0], vec![3.0, 0.0]];
/// let instance = Instance::new(1, h, s, 2.0).unwrap();
///
/// let report = validate_solution(&instance, &[0, 0]);
/// assert!(!report.feasible);
/// assert!((report.total_happiness - 5.0).abs() < 1e-12);
/// ```
pub fn validate_solution(instance: &Instance, group_of: &[usize]) -> ValidationReport {
    let n = instance.n();
    let k = instance.k();
    let mut errors = Vec::new();

    if group_of.len() != n {
        errors.push(ValidationError::new(
            ValidationErrorKind::WrongLength,
            format!("expected {n} assignments, got {}", group_of.len()),
        ));
        return ValidationReport {
            total_happiness: 0.0,
            group_stress: vec![0.0; k],
            feasible: false,
            errors,
        };
    }

    for (student, &g) in group_of.iter().enumerate() {
        if g >= k {
            errors.push(ValidationError::new(
                ValidationErrorKind::GroupOutOfRange,
                format!("student {student} assigned to group {g} (k = {k})"),
            ));
        }
    }
    if !errors.is_empty() {
        return ValidationReport {
            total_happiness: 0.0,
            group_stress: vec![0.0; k],
            feasible: false,
            errors,
        };
    }

    let mut sizes = vec![0usize; k];
    for &g in group_of {
        sizes[g] += 1;
    }
    for (g, _) in sizes.iter().enumerate().filter(|&(_, &size)| size == 0) {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyGroup,
            format!("group {g} has no members"),
        ));
    }

    let mut total_happiness = 0.0;
    let mut group_stress = vec![0.0; k];
    for i in 0..n {
        for j in i + 1..n {
            if group_of[i] == group_of[j] {
                total_happiness += instance.happiness(i, j);
                group_stress[group_of[i]] += instance.stress(i, j);
            }
        }
    }

    let cap = instance.stress_cap();
    let mut feasible = true;
    for (g, &stress) in group_stress.iter().enumerate() {
        if stress > cap + FEASIBILITY_TOLERANCE {
            feasible = false;
            errors.push(ValidationError::new(
                ValidationErrorKind::StressExceeded,
                format!("group {g} stress {stress} exceeds cap {cap}"),
            ));
        }
    }

    ValidationReport {
        total_happiness,
        group_stress,
        feasible,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_pairs() -> Instance {
        // h[0][1]=5, h[2][3]=5, s[0][1]=3, s[2][3]=3, budget 10, k=2 (cap 5)
        let mut h = vec![vec![0.0; 4]; 4];
        let mut s = vec![vec![0.0; 4]; 4];
        for (i, j) in [(0, 1), (2, 3)] {
            h[i][j] = 5.0;
            h[j][i] = 5.0;
            s[i][j] = 3.0;
            s[j][i] = 3.0;
        }
        Instance::new(2, h, s, 10.0).unwrap()
    }

    #[test]
    fn test_valid_solution() {
        let report = validate_solution(&two_pairs(), &[0, 0, 1, 1]);
        assert!(report.is_valid());
        assert!(report.feasible);
        assert!((report.total_happiness - 10.0).abs() < 1e-12);
        assert_eq!(report.group_stress, vec![3.0, 3.0]);
    }

    #[test]
    fn test_crossed_solution_scores_zero() {
        let report = validate_solution(&two_pairs(), &[0, 1, 0, 1]);
        assert!(report.is_valid());
        assert!(report.total_happiness.abs() < 1e-12);
    }

    #[test]
    fn test_stress_exceeded() {
        let mut h = vec![vec![0.0; 3]; 3];
        let mut s = vec![vec![0.0; 3]; 3];
        h[0][1] = 1.0;
        h[1][0] = 1.0;
        s[0][1] = 4.0;
        s[1][0] = 4.0;
        let inst = Instance::new(2, h, s, 6.0).unwrap();
        let report = validate_solution(&inst, &[0, 0, 1]);
        assert!(!report.feasible);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, ValidationErrorKind::StressExceeded);
    }

    #[test]
    fn test_wrong_length() {
        let report = validate_solution(&two_pairs(), &[0, 1]);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].kind, ValidationErrorKind::WrongLength);
    }

    #[test]
    fn test_label_out_of_range() {
        let report = validate_solution(&two_pairs(), &[0, 2, 1, 1]);
        assert_eq!(report.errors[0].kind, ValidationErrorKind::GroupOutOfRange);
        assert!(!report.feasible);
    }

    #[test]
    fn test_empty_group() {
        let report = validate_solution(&two_pairs(), &[0, 0, 0, 0]);
        assert!(report
            .errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::EmptyGroup));
    }
}
