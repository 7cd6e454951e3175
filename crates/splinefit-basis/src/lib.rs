#![warn(missing_docs)]

//! Knot vectors, B-spline basis evaluation and tensor-product splines.
//!
//! Covers the geometric half of the fitting engine: synthesizing clamped
//! knot vectors from sample abscissae, evaluating the univariate B-spline
//! basis via the Cox-de Boor recursion, and combining the per-axis bases
//! into a multivariate tensor-product [`Spline`].
//!
//! # Key types
//!
//! - [`KnotVector`] — validated clamped knot sequence for one axis
//! - [`KnotSpacing`] — the three knot synthesis strategies
//! - [`Spline`] — immutable fitted spline: knots, degrees, coefficients
//!
//! # Example
//!
//! ```
//! use splinefit_basis::{build_knot_vector, KnotSpacing, Spline};
//!
//! let values = [0.0, 1.0, 2.0, 3.0, 4.0];
//! let kv = build_knot_vector(&values, 3, KnotSpacing::AsSampled, 0, None, 0.0).unwrap();
//! assert_eq!(kv.len(), values.len() + 3 + 1);
//!
//! // A degenerate "spline" carrying explicit coefficients
//! let spline = Spline::new(vec![kv], vec![3], vec![1.0; 5]).unwrap();
//! assert_eq!(spline.num_basis_functions(), 5);
//! ```

mod basis;
mod knots;
mod spline;

pub use basis::{eval_basis_axis, eval_basis_derivative_axis};
pub use knots::{build_knot_vector, sorted_unique, KnotSpacing, KnotVector};
pub use spline::Spline;

use thiserror::Error;

/// Errors from knot synthesis and spline evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BasisError {
    /// An axis has too few distinct sample values for the requested degree.
    #[error("axis needs at least {required} distinct values for degree {degree}, got {got}")]
    TooFewUniqueValues {
        /// Required distinct value count (degree + 1).
        required: usize,
        /// Distinct values observed.
        got: usize,
        /// Requested spline degree.
        degree: usize,
    },

    /// A knot sequence decreases somewhere (or contains NaN).
    #[error("knot vector is not non-decreasing")]
    NotNonDecreasing,

    /// End-knot multiplicity is below degree + 1.
    #[error("knot vector is not clamped for degree {degree}")]
    NotClamped {
        /// Degree the vector was validated against.
        degree: usize,
    },

    /// Query point dimensionality differs from the spline's.
    #[error("query point has {got} coordinates but the spline has {expected} variables")]
    DimensionMismatch {
        /// Spline dimensionality.
        expected: usize,
        /// Query point dimensionality.
        got: usize,
    },

    /// Coefficient count does not match the tensor-product basis size.
    #[error("coefficient vector has length {got}, basis requires {expected}")]
    CoefficientCount {
        /// Product of the per-axis basis counts.
        expected: usize,
        /// Provided coefficient count.
        got: usize,
    },

    /// Per-axis argument vectors disagree in length.
    #[error("spline needs one knot vector and one degree per axis ({knots} knot vectors, {degrees} degrees)")]
    AxisCount {
        /// Number of knot vectors supplied.
        knots: usize,
        /// Number of degrees supplied.
        degrees: usize,
    },
}
