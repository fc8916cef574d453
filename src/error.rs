//! Error types.
//!
//! Instance construction and configuration problems are reported before any
//! search starts. Infeasibility found during a search is not an error: it is
//! carried on the returned [`Solution`](crate::model::Solution).

use thiserror::Error;

/// Which of the two pairwise matrices an [`InstanceError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixKind {
    Happiness,
    Stress,
}

impl std::fmt::Display for MatrixKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatrixKind::Happiness => write!(f, "happiness"),
            MatrixKind::Stress => write!(f, "stress"),
        }
    }
}

/// Malformed or inconsistent problem data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstanceError {
    #[error("instance has no students")]
    EmptyInstance,

    #[error("group count {k} must be in 1..={n}")]
    InvalidGroupCount { k: usize, n: usize },

    #[error("{matrix} matrix row {row} has {len} entries, expected {expected}")]
    DimensionMismatch {
        matrix: MatrixKind,
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("{matrix} matrix holds {len} values, expected {expected}")]
    ValueCount {
        matrix: MatrixKind,
        len: usize,
        expected: usize,
    },

    #[error("{matrix} matrix is not symmetric at ({i}, {j})")]
    Asymmetric {
        matrix: MatrixKind,
        i: usize,
        j: usize,
    },

    #[error("{matrix} matrix has non-zero diagonal at {i}")]
    NonZeroDiagonal { matrix: MatrixKind, i: usize },

    #[error("{matrix} matrix has a non-finite value at ({i}, {j})")]
    NonFinite {
        matrix: MatrixKind,
        i: usize,
        j: usize,
    },

    #[error("stress budget must be finite and non-negative, got {0}")]
    InvalidStressBudget(f64),
}

/// A move request that can never be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("student {0} is out of range")]
    StudentOutOfRange(usize),

    #[error("group {0} is out of range")]
    GroupOutOfRange(usize),

    #[error("student {student} is already in group {group}")]
    SameGroup { student: usize, group: usize },

    #[error("cannot swap student {0} with itself")]
    SameStudent(usize),

    #[error("moving student {student} would leave group {group} empty")]
    WouldEmptyGroup { student: usize, group: usize },

    #[error("move was priced against a different partition state")]
    StaleDelta,
}

/// Top-level error for the crate's public operations.
#[derive(Debug, Error)]
pub enum GroupingError {
    #[error(transparent)]
    Instance(#[from] InstanceError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid assignment: {0}")]
    InvalidAssignment(String),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = InstanceError::InvalidGroupCount { k: 5, n: 3 };
        assert_eq!(err.to_string(), "group count 5 must be in 1..=3");

        let err = InstanceError::Asymmetric {
            matrix: MatrixKind::Stress,
            i: 0,
            j: 2,
        };
        assert_eq!(err.to_string(), "stress matrix is not symmetric at (0, 2)");

        let err = MoveError::WouldEmptyGroup {
            student: 1,
            group: 0,
        };
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_instance_error_converts() {
        let err: GroupingError = InstanceError::EmptyInstance.into();
        assert!(matches!(err, GroupingError::Instance(_)));
    }
}
