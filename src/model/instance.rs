//! Immutable problem data.

use crate::error::{InstanceError, MatrixKind};

/// Tolerance used when checking matrix symmetry and the zero diagonal.
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// A dense symmetric `n × n` matrix stored row-major.
///
/// [`set`](Self::set) writes any value; the matrix is checked when it enters
/// an [`Instance`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PairMatrix {
    n: usize,
    values: Vec<f64>,
}

impl PairMatrix {
    /// Builds a matrix from rows, checking shape, finiteness, symmetry and
    /// the zero diagonal.
    pub fn from_rows(kind: MatrixKind, rows: Vec<Vec<f64>>) -> Result<Self, InstanceError> {
        let n = rows.len();
        let mut values = Vec::with_capacity(n * n);
        for (row, r) in rows.into_iter().enumerate() {
            if r.len() != n {
                return Err(InstanceError::DimensionMismatch {
                    matrix: kind,
                    row,
                    len: r.len(),
                    expected: n,
                });
            }
            values.extend(r);
        }
        let matrix = Self { n, values };
        matrix.check(kind)?;
        Ok(matrix)
    }

    /// A zero matrix of size `n`.
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            values: vec![0.0; n * n],
        }
    }

    /// Sets both `(i, j)` and `(j, i)`.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.n + j] = value;
        self.values[j * self.n + i] = value;
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    /// Row `i` as a slice.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n..(i + 1) * self.n]
    }

    pub fn size(&self) -> usize {
        self.n
    }

    fn check(&self, kind: MatrixKind) -> Result<(), InstanceError> {
        for i in 0..self.n {
            for j in 0..self.n {
                let v = self.get(i, j);
                if !v.is_finite() {
                    return Err(InstanceError::NonFinite { matrix: kind, i, j });
                }
                if i == j {
                    if v.abs() > SYMMETRY_TOLERANCE {
                        return Err(InstanceError::NonZeroDiagonal { matrix: kind, i });
                    }
                } else if j > i && (v - self.get(j, i)).abs() > SYMMETRY_TOLERANCE {
                    return Err(InstanceError::Asymmetric { matrix: kind, i, j });
                }
            }
        }
        Ok(())
    }
}

/// One group-assignment problem: `n` students, `k` groups, pairwise happiness
/// and stress, and the global stress budget `S_max`.
///
/// Constructed once and never mutated. Every optimizer borrows it.
///
/// # Examples
///
/// ```
/// use u_grouping::model::Instance;
///
/// let h = vec![vec![0.0, 5.0], vec![5.0, 0.0]];
/// let s = vec![vec![0.0, 3.0], vec![3.0, 0.0]];
/// let instance = Instance::new(1, h, s, 10.0).unwrap();
/// assert_eq!(instance.n(), 2);
/// assert!((instance.stress_cap() - 10.0).abs() < 1e-12);
/// ```
///
/// Deserialized instances go through [`Instance::from_matrices`], so they are
/// checked the same way as constructed ones.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawInstance")
)]
pub struct Instance {
    k: usize,
    happiness: PairMatrix,
    stress: PairMatrix,
    stress_budget: f64,
}

impl Instance {
    /// Validates and builds an instance from row-major matrices.
    pub fn new(
        k: usize,
        happiness: Vec<Vec<f64>>,
        stress: Vec<Vec<f64>>,
        stress_budget: f64,
    ) -> Result<Self, InstanceError> {
        let happiness = PairMatrix::from_rows(MatrixKind::Happiness, happiness)?;
        let stress = PairMatrix::from_rows(MatrixKind::Stress, stress)?;
        Self::from_matrices(k, happiness, stress, stress_budget)
    }

    /// Builds an instance from two matrices, checking both for finiteness,
    /// symmetry and the zero diagonal.
    pub fn from_matrices(
        k: usize,
        happiness: PairMatrix,
        stress: PairMatrix,
        stress_budget: f64,
    ) -> Result<Self, InstanceError> {
        let n = happiness.size();
        if n == 0 {
            return Err(InstanceError::EmptyInstance);
        }
        if stress.size() != n {
            return Err(InstanceError::DimensionMismatch {
                matrix: MatrixKind::Stress,
                row: 0,
                len: stress.size(),
                expected: n,
            });
        }
        happiness.check(MatrixKind::Happiness)?;
        stress.check(MatrixKind::Stress)?;
        if k == 0 || k > n {
            return Err(InstanceError::InvalidGroupCount { k, n });
        }
        if !stress_budget.is_finite() || stress_budget < 0.0 {
            return Err(InstanceError::InvalidStressBudget(stress_budget));
        }
        Ok(Self {
            k,
            happiness,
            stress,
            stress_budget,
        })
    }

    /// Number of students.
    #[inline]
    pub fn n(&self) -> usize {
        self.happiness.size()
    }

    /// Number of groups.
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Global stress budget `S_max`.
    pub fn stress_budget(&self) -> f64 {
        self.stress_budget
    }

    /// Per-group stress ceiling, `S_max / k`.
    #[inline]
    pub fn stress_cap(&self) -> f64 {
        self.stress_budget / self.k as f64
    }

    #[inline]
    pub fn happiness(&self, i: usize, j: usize) -> f64 {
        self.happiness.get(i, j)
    }

    #[inline]
    pub fn stress(&self, i: usize, j: usize) -> f64 {
        self.stress.get(i, j)
    }

    pub fn happiness_matrix(&self) -> &PairMatrix {
        &self.happiness
    }

    pub fn stress_matrix(&self) -> &PairMatrix {
        &self.stress
    }

    /// Returns a copy of this instance with a different group count.
    pub fn with_group_count(&self, k: usize) -> Result<Self, InstanceError> {
        Self::from_matrices(
            k,
            self.happiness.clone(),
            self.stress.clone(),
            self.stress_budget,
        )
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawMatrix {
    n: usize,
    values: Vec<f64>,
}

#[cfg(feature = "serde")]
impl RawMatrix {
    fn into_matrix(self, kind: MatrixKind) -> Result<PairMatrix, InstanceError> {
        let RawMatrix { n, values } = self;
        if n.checked_mul(n) != Some(values.len()) {
            return Err(InstanceError::ValueCount {
                matrix: kind,
                len: values.len(),
                expected: n.saturating_mul(n),
            });
        }
        Ok(PairMatrix { n, values })
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawInstance {
    k: usize,
    happiness: RawMatrix,
    stress: RawMatrix,
    stress_budget: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawInstance> for Instance {
    type Error = InstanceError;

    fn try_from(raw: RawInstance) -> Result<Self, Self::Error> {
        let happiness = raw.happiness.into_matrix(MatrixKind::Happiness)?;
        let stress = raw.stress.into_matrix(MatrixKind::Stress)?;
        Self::from_matrices(raw.k, happiness, stress, raw.stress_budget)
    }
}
