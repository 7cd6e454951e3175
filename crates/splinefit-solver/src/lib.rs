#![warn(missing_docs)]

//! System assembly and regularized least-squares solving for splinefit.
//!
//! Builds the sparse regression system for a skeletal spline (the basis
//! matrix B at the sample abscissae, the diagonal weight matrix W and, for
//! P-spline smoothing, the second-order finite-difference penalty D) and
//! solves the resulting, optionally regularized, normal equations for the
//! spline coefficients. The smoothing parameter can be auto-tuned with
//! Harville-Fellner-Schall fixed-point iterations.
//!
//! Sparse representations are used throughout; the solver densifies only
//! for the HFS matrix inverse and the dense QR fallback.

mod assemble;
mod solve;

pub use assemble::{design_matrix, penalty_matrix, weight_matrix};
pub use solve::{solve_for_coefficients, SolveConfig};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smoothing mode for the regression problem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Smoothing {
    /// Plain least squares (interpolation on a square system).
    #[default]
    None,
    /// Ridge regularization: `B^T B + alpha I`.
    Identity,
    /// P-spline: second-order difference penalty with weight `lambda`.
    PSpline,
}

impl Smoothing {
    /// Map the binding-level integer code (0, 1, 2) to a smoothing mode.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Identity),
            2 => Some(Self::PSpline),
            _ => None,
        }
    }
}

/// Errors from system assembly and solving.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// Basis evaluation failed while assembling the design matrix.
    #[error(transparent)]
    Basis(#[from] splinefit_basis::BasisError),

    /// P-spline smoothing needs at least 3 basis functions on every axis.
    #[error("p-spline smoothing needs at least 3 basis functions per axis, axis {axis} has {got}")]
    PenaltyTooCoarse {
        /// Offending axis.
        axis: usize,
        /// Basis functions on that axis.
        got: usize,
    },

    /// Both the sparse factorization and the dense QR solve failed.
    #[error("normal equations are singular or rank-deficient")]
    Singular,
}
