#![warn(missing_docs)]

//! Multivariate tensor-product B-spline fitting.
//!
//! Feed a [`SampleStore`] with samples `(x, y)`, `x` in R^d, configure a
//! [`Builder`] and call [`Builder::build`] to obtain an immutable
//! [`Spline`] approximating the samples: interpolating them on a complete
//! grid with plain least squares, or smoothing them with ridge or P-spline
//! regularization whose weight can be auto-tuned by Harville-Fellner-Schall
//! iterations.
//!
//! # Example
//!
//! ```
//! use splinefit::{Builder, SampleStore};
//!
//! let mut store = SampleStore::new();
//! for i in 0..5 {
//!     let x = i as f64;
//!     store.add(&[x], x * x).unwrap();
//! }
//!
//! let spline = Builder::new(&store).build().unwrap();
//! let y = spline.eval(&[2.0]).unwrap();
//! assert!((y - 4.0).abs() < 1e-9);
//! ```

pub use splinefit_basis;
pub use splinefit_data;
pub use splinefit_math;
pub use splinefit_solver;

pub use splinefit_basis::{BasisError, KnotSpacing, KnotVector, Spline};
pub use splinefit_data::{DataError, Sample, SampleStore};
pub use splinefit_solver::{Smoothing, SolverError};

use log::debug;
use splinefit_basis::build_knot_vector;
use splinefit_solver::{solve_for_coefficients, SolveConfig};
use thiserror::Error;

/// Maximum supported spline degree per axis.
pub const MAX_DEGREE: usize = 5;

/// Errors from builder configuration and fitting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// A per-axis degree exceeds [`MAX_DEGREE`].
    #[error("degree {0} exceeds the supported maximum of {MAX_DEGREE}")]
    InvalidDegree(usize),

    /// The degrees vector length differs from the dimensionality.
    #[error("expected one degree per axis ({expected}), got {got}")]
    DegreeCount {
        /// Store dimensionality.
        expected: usize,
        /// Provided entry count.
        got: usize,
    },

    /// The basis-function-count vector length differs from the
    /// dimensionality.
    #[error("expected one basis-function count per axis ({expected}), got {got}")]
    BasisCount {
        /// Store dimensionality.
        expected: usize,
        /// Provided entry count.
        got: usize,
    },

    /// Alpha must be non-negative and finite.
    #[error("alpha must be non-negative and finite, got {0}")]
    InvalidAlpha(f64),

    /// Padding must be non-negative and finite.
    #[error("padding must be non-negative and finite, got {0}")]
    InvalidPadding(f64),

    /// The weights vector length differs from the sample count.
    #[error("expected one weight per sample ({expected}), got {got}")]
    WeightCount {
        /// Sample count.
        expected: usize,
        /// Provided entry count.
        got: usize,
    },

    /// Sample weights must be strictly positive and finite.
    #[error("sample weights must be positive and finite")]
    NonPositiveWeight,

    /// The bounds vector length differs from the dimensionality.
    #[error("expected one bounds pair per axis ({expected}), got {got}")]
    BoundsCount {
        /// Store dimensionality.
        expected: usize,
        /// Provided entry count.
        got: usize,
    },

    /// Fitting needs at least one sample.
    #[error("cannot fit an empty sample store")]
    EmptyStore,

    /// The samples do not form the full Cartesian grid of their per-axis
    /// values (enable the `scattered` feature to fit anyway).
    #[error("samples do not form a complete grid")]
    IncompleteGrid,

    /// Sample store error.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Knot synthesis or basis evaluation error.
    #[error(transparent)]
    Basis(#[from] BasisError),

    /// Assembly or solver error.
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Fluent configuration for fitting a B-spline to a sample store.
///
/// A builder value-captures its store at construction; fallible setters
/// validate synchronously and return the updated builder. [`Builder::build`]
/// does not consume the builder, so a configuration can be cloned, altered
/// and rebuilt.
///
/// Defaults: degree 3 on every axis, knot spacing [`KnotSpacing::AsSampled`],
/// smoothing [`Smoothing::None`], alpha 0.1, no padding, uniform weights,
/// data-extent bounds, no HFS iterations.
#[derive(Debug, Clone)]
pub struct Builder {
    store: SampleStore,
    degrees: Vec<usize>,
    num_basis_functions: Vec<usize>,
    knot_spacing: KnotSpacing,
    smoothing: Smoothing,
    alpha: f64,
    padding: f64,
    weights: Vec<f64>,
    bounds: Vec<(f64, f64)>,
    hfs_iterations: u32,
}

impl Builder {
    /// Create a builder over a snapshot of `store`.
    pub fn new(store: &SampleStore) -> Self {
        let d = store.num_variables();
        Self {
            store: store.clone(),
            degrees: vec![3; d],
            num_basis_functions: vec![0; d],
            knot_spacing: KnotSpacing::default(),
            smoothing: Smoothing::default(),
            alpha: 0.1,
            padding: 0.0,
            weights: Vec::new(),
            bounds: Vec::new(),
            hfs_iterations: 0,
        }
    }

    /// Set the same degree on every axis. At most [`MAX_DEGREE`].
    pub fn degree(self, degree: usize) -> Result<Self, FitError> {
        let d = self.store.num_variables();
        self.degrees(&vec![degree; d])
    }

    /// Set per-axis degrees. One entry per axis, each at most [`MAX_DEGREE`].
    pub fn degrees(mut self, degrees: &[usize]) -> Result<Self, FitError> {
        let expected = self.store.num_variables();
        if degrees.len() != expected {
            return Err(FitError::DegreeCount {
                expected,
                got: degrees.len(),
            });
        }
        if let Some(&bad) = degrees.iter().find(|&&p| p > MAX_DEGREE) {
            return Err(FitError::InvalidDegree(bad));
        }
        self.degrees = degrees.to_vec();
        Ok(self)
    }

    /// Set per-axis basis function counts; zero means "derive from the
    /// samples". Only consulted by [`KnotSpacing::Equidistant`].
    pub fn num_basis_functions(mut self, counts: &[usize]) -> Result<Self, FitError> {
        let expected = self.store.num_variables();
        if counts.len() != expected {
            return Err(FitError::BasisCount {
                expected,
                got: counts.len(),
            });
        }
        self.num_basis_functions = counts.to_vec();
        Ok(self)
    }

    /// Set the knot synthesis strategy.
    pub fn knot_spacing(mut self, spacing: KnotSpacing) -> Self {
        self.knot_spacing = spacing;
        self
    }

    /// Set the smoothing mode.
    pub fn smoothing(mut self, smoothing: Smoothing) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// Set the regularization weight (initial lambda for P-splines).
    pub fn alpha(mut self, alpha: f64) -> Result<Self, FitError> {
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(FitError::InvalidAlpha(alpha));
        }
        self.alpha = alpha;
        Ok(self)
    }

    /// Set the fractional padding applied to the equidistant knot extent.
    pub fn padding(mut self, padding: f64) -> Result<Self, FitError> {
        if !padding.is_finite() || padding < 0.0 {
            return Err(FitError::InvalidPadding(padding));
        }
        self.padding = padding;
        Ok(self)
    }

    /// Set per-sample weights; one strictly positive entry per sample.
    pub fn weights(mut self, weights: &[f64]) -> Result<Self, FitError> {
        let expected = self.store.len();
        if weights.len() != expected {
            return Err(FitError::WeightCount {
                expected,
                got: weights.len(),
            });
        }
        if weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(FitError::NonPositiveWeight);
        }
        self.weights = weights.to_vec();
        Ok(self)
    }

    /// Set per-axis `[lo, hi]` bounds for the equidistant knot extent.
    /// A NaN slot falls back to the data extent on that side.
    pub fn bounds(mut self, bounds: &[(f64, f64)]) -> Result<Self, FitError> {
        let expected = self.store.num_variables();
        if bounds.len() != expected {
            return Err(FitError::BoundsCount {
                expected,
                got: bounds.len(),
            });
        }
        self.bounds = bounds.to_vec();
        Ok(self)
    }

    /// Set the number of Harville-Fellner-Schall smoothing-parameter
    /// iterations (P-spline smoothing only).
    pub fn hfs_iterations(mut self, iterations: u32) -> Self {
        self.hfs_iterations = iterations;
        self
    }

    /// Fit the spline.
    ///
    /// Synthesizes one knot vector per axis, assembles the sparse
    /// regression system and solves for the coefficients. The result is an
    /// immutable [`Spline`]; the builder is left untouched and can be
    /// rebuilt with altered configuration.
    pub fn build(&self) -> Result<Spline, FitError> {
        if self.store.is_empty() {
            return Err(FitError::EmptyStore);
        }
        #[cfg(not(feature = "scattered"))]
        if !self.store.is_grid_complete() {
            return Err(FitError::IncompleteGrid);
        }

        let d = self.store.num_variables();
        let mut knot_vectors = Vec::with_capacity(d);
        for axis in 0..d {
            let values = self.store.axis_values(axis)?;
            knot_vectors.push(build_knot_vector(
                &values,
                self.degrees[axis],
                self.knot_spacing,
                self.num_basis_functions[axis],
                self.bounds.get(axis).copied(),
                self.padding,
            )?);
        }

        let n: usize = knot_vectors
            .iter()
            .zip(&self.degrees)
            .map(|(kv, &p)| kv.num_basis_functions(p))
            .product();
        let skeletal = Spline::new(knot_vectors, self.degrees.clone(), vec![0.0; n])?;

        let config = SolveConfig {
            smoothing: self.smoothing,
            alpha: self.alpha,
            weights: self.weights.clone(),
            hfs_iterations: self.hfs_iterations,
        };
        let result = solve_for_coefficients(&skeletal, &self.store, &config)?;
        debug!(
            "fit complete: {} coefficients, lambda = {:e}",
            result.coefficients.len(),
            result.lambda
        );

        let fitted = Spline::new(
            skeletal.knot_vectors().to_vec(),
            skeletal.degrees().to_vec(),
            result.coefficients,
        )?;
        Ok(fitted)
    }
}
