//! Fixed-dimension positions and covariance matrices
//!
//! Positions are 2-D or 3-D Cartesian coordinates in metres. The dimension
//! is a const generic parameter, so a 2-D covariance can never be attached
//! to a 3-D position — the mismatch is a type error rather than a runtime
//! check.
//!
//! Only the small amount of linear algebra the solver and the variance
//! propagator need is implemented here: vector arithmetic, dot products,
//! and symmetric-matrix quadratic forms. The matrices are at most 3x3, so
//! everything is plain fixed-size arrays.
//!
//! # Example
//!
//! ```
//! use rloc_core::geometry::{Covariance, Position};
//!
//! let a = Position::new([1.0, 2.0]);
//! let b = Position::new([4.0, 6.0]);
//! assert_eq!(a.distance_to(&b), 5.0);
//!
//! let cov = Covariance::diagonal([0.5, 0.5]);
//! let g = Position::new([1.0, -1.0]);
//! // g^T C g = 0.5 + 0.5
//! assert!((cov.quadratic_form(&g) - 1.0).abs() < 1e-12);
//! ```

use crate::types::{PositioningError, PositioningResult};

/// Absolute tolerance used when checking covariance symmetry.
const SYMMETRY_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// An N-dimensional position (N = 2 or 3), in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position<const N: usize> {
    pub coords: [f64; N],
}

/// A 2-D position.
pub type Position2 = Position<2>;
/// A 3-D position.
pub type Position3 = Position<3>;

impl<const N: usize> Position<N> {
    /// Create a position from its coordinates.
    pub fn new(coords: [f64; N]) -> Self {
        Self { coords }
    }

    /// The origin.
    pub fn zeros() -> Self {
        Self { coords: [0.0; N] }
    }

    /// Number of dimensions.
    pub fn dim(&self) -> usize {
        N
    }

    /// Component-wise difference `self - other`.
    pub fn sub(&self, other: &Self) -> Self {
        Self {
            coords: std::array::from_fn(|i| self.coords[i] - other.coords[i]),
        }
    }

    /// Component-wise sum `self + other`.
    pub fn add(&self, other: &Self) -> Self {
        Self {
            coords: std::array::from_fn(|i| self.coords[i] + other.coords[i]),
        }
    }

    /// Scalar multiple.
    pub fn scale(&self, s: f64) -> Self {
        Self {
            coords: std::array::from_fn(|i| self.coords[i] * s),
        }
    }

    /// Component-wise division by a scalar.
    pub fn div(&self, s: f64) -> Self {
        Self {
            coords: std::array::from_fn(|i| self.coords[i] / s),
        }
    }

    /// Dot product.
    pub fn dot(&self, other: &Self) -> f64 {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Squared Euclidean norm.
    pub fn sqr_norm(&self) -> f64 {
        self.dot(self)
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.sqr_norm().sqrt()
    }

    /// Euclidean distance to another position.
    pub fn distance_to(&self, other: &Self) -> f64 {
        self.sub(other).norm()
    }
}

// ---------------------------------------------------------------------------
// Covariance
// ---------------------------------------------------------------------------

/// An N x N symmetric covariance matrix.
///
/// Construction validates symmetry and non-negative diagonal entries;
/// positive-semidefiniteness beyond the diagonal is the caller's
/// responsibility (readings from real covariance estimators satisfy it).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Covariance<const N: usize> {
    data: [[f64; N]; N],
}

impl<const N: usize> Covariance<N> {
    /// Create a covariance matrix, validating symmetry and the diagonal.
    pub fn new(data: [[f64; N]; N]) -> PositioningResult<Self> {
        for i in 0..N {
            if data[i][i] < 0.0 {
                return Err(PositioningError::NegativeVariance {
                    index: i,
                    value: data[i][i],
                });
            }
            for j in (i + 1)..N {
                if (data[i][j] - data[j][i]).abs() > SYMMETRY_TOLERANCE {
                    return Err(PositioningError::AsymmetricCovariance);
                }
            }
        }
        Ok(Self { data })
    }

    /// The zero matrix (no uncertainty).
    pub fn zeros() -> Self {
        Self {
            data: [[0.0; N]; N],
        }
    }

    /// Diagonal covariance from per-axis variances.
    ///
    /// # Panics
    /// Panics if any variance is negative.
    pub fn diagonal(variances: [f64; N]) -> Self {
        let mut data = [[0.0; N]; N];
        for (i, &v) in variances.iter().enumerate() {
            assert!(v >= 0.0, "variance must be non-negative");
            data[i][i] = v;
        }
        Self { data }
    }

    /// Matrix entry at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row][col]
    }

    /// Evaluate the quadratic form `g^T C g`.
    ///
    /// This is the delta-method contribution of this covariance to the
    /// variance of a scalar output with gradient `g`.
    pub fn quadratic_form(&self, g: &Position<N>) -> f64 {
        let mut acc = 0.0;
        for i in 0..N {
            for j in 0..N {
                acc += g.coords[i] * self.data[i][j] * g.coords[j];
            }
        }
        acc
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
