//! Regularized least-squares solve with HFS smoothing-parameter tuning.

use log::{debug, warn};
use nalgebra_sparse::CsrMatrix;
use splinefit_basis::Spline;
use splinefit_data::SampleStore;
use splinefit_math::{
    inverse_lu, lstsq_qr, mul_vec, scale, solve_sparse_cholesky, to_csc, to_dense, DenseMatrix,
    DenseVector, SparseBuilder,
};

use crate::{assemble, Smoothing, SolverError};

/// Row-count threshold above which a sparse factorization is attempted
/// before densifying.
const SPARSE_THRESHOLD: usize = 100;

/// Configuration of the regularized solve.
#[derive(Debug, Clone)]
pub struct SolveConfig {
    /// Smoothing mode.
    pub smoothing: Smoothing,
    /// Regularization weight (the initial lambda for P-spline smoothing).
    pub alpha: f64,
    /// Per-sample weights; empty means uniform.
    pub weights: Vec<f64>,
    /// Number of Harville-Fellner-Schall iterations (P-spline only).
    pub hfs_iterations: u32,
}

/// Outcome of a solve: the coefficients and the effective smoothing weight
/// (equal to `alpha` unless HFS iterations updated it).
#[derive(Debug, Clone)]
pub struct SolveResult {
    /// Flat coefficient vector, in the spline's layout.
    pub coefficients: Vec<f64>,
    /// Final smoothing weight lambda.
    pub lambda: f64,
}

/// Solve the regression problem for a skeletal spline over the store's
/// samples and return the coefficient vector.
pub fn solve_for_coefficients(
    spline: &Spline,
    store: &SampleStore,
    config: &SolveConfig,
) -> Result<SolveResult, SolverError> {
    let b_mat = assemble::design_matrix(spline, store)?;
    let y = DenseVector::from_vec(store.ys());
    let m = store.len();

    match config.smoothing {
        Smoothing::None => {
            // A = B, b = y: plain least squares, interpolation when square.
            let coefficients = solve_linear(&b_mat, &y, false)?;
            Ok(SolveResult {
                coefficients,
                lambda: config.alpha,
            })
        }
        Smoothing::Identity => {
            let n = b_mat.ncols();
            let bt = b_mat.transpose();
            let btb = &bt * &b_mat;
            let a = &btb + &scale(SparseBuilder::identity(n).to_csr(), config.alpha);
            let rhs = mul_vec(&bt, &y);
            let coefficients = solve_linear(&a, &rhs, true)?;
            Ok(SolveResult {
                coefficients,
                lambda: config.alpha,
            })
        }
        Smoothing::PSpline => {
            let w = assemble::weight_matrix(&config.weights, m);
            let d_mat = assemble::penalty_matrix(&spline.basis_counts())?;

            let bt = b_mat.transpose();
            let wb = &w * &b_mat;
            let btwb = &bt * &wb;
            let btwy = mul_vec(&bt, &mul_vec(&w, &y));
            let dt = d_mat.transpose();
            let dtd = &dt * &d_mat;

            let mut lambda = config.alpha;
            let mut a = &btwb + &scale(dtd.clone(), lambda);

            if config.hfs_iterations > 0 {
                let btwb_dense = to_dense(&btwb);
                let num_vars = spline.num_variables() as f64;
                for iteration in 0..config.hfs_iterations {
                    let next = hfs_update(
                        &a,
                        &btwb_dense,
                        &btwy,
                        &b_mat,
                        &d_mat,
                        &y,
                        m as f64,
                        num_vars,
                    );
                    let Some(next) = next else {
                        // Degenerate update (singular system or vanishing
                        // penalty norm): keep the last valid lambda.
                        warn!("hfs iteration {iteration} degenerate, keeping lambda = {lambda:e}");
                        break;
                    };
                    lambda = next;
                    debug!("hfs iteration {iteration}: lambda = {lambda:e}");
                    a = &btwb + &scale(dtd.clone(), lambda);
                }
            }

            let coefficients = solve_linear(&a, &btwy, true)?;
            Ok(SolveResult {
                coefficients,
                lambda,
            })
        }
    }
}

/// One HFS fixed-point update of lambda.
///
/// Inverts the current normal matrix, estimates the effective dimension
/// ED = tr(A^-1 B^T W B), and maps the residual and penalty norms to the
/// next smoothing weight `sigma^2 / tau^2`. Returns `None` when any
/// quantity degenerates.
#[allow(clippy::too_many_arguments)]
fn hfs_update(
    a: &CsrMatrix<f64>,
    btwb_dense: &DenseMatrix,
    btwy: &DenseVector,
    b_mat: &CsrMatrix<f64>,
    d_mat: &CsrMatrix<f64>,
    y: &DenseVector,
    m: f64,
    num_vars: f64,
) -> Option<f64> {
    let a_inv = inverse_lu(&to_dense(a))?;
    let effective_dim = (&a_inv * btwb_dense).trace();
    let c = &a_inv * btwy;

    let penalty_norm2 = mul_vec(d_mat, &c).norm_squared();
    let residual_norm2 = (y - mul_vec(b_mat, &c)).norm_squared();

    #[cfg(feature = "hfs-book")]
    let (tau_den, sigma_den) = (effective_dim - num_vars, m - effective_dim);
    #[cfg(not(feature = "hfs-book"))]
    let (tau_den, sigma_den) = (effective_dim, m - num_vars - effective_dim);

    if tau_den <= 0.0 || sigma_den <= 0.0 {
        return None;
    }
    let tau2 = penalty_norm2 / tau_den;
    let sigma2 = residual_norm2 / sigma_den;
    debug!("hfs: ed = {effective_dim:.6}, sigma2 = {sigma2:e}, tau2 = {tau2:e}");
    if tau2 <= 0.0 || !tau2.is_finite() {
        return None;
    }
    let lambda = sigma2 / tau2;
    lambda.is_finite().then_some(lambda)
}

/// Solve `A x = rhs`, sparse first where the structure allows it.
///
/// Systems of at least [`SPARSE_THRESHOLD`] rows that carry the symmetric
/// positive definite normal-equation form go through a sparse Cholesky
/// factorization. On factorization failure, and for all smaller,
/// rectangular or unsymmetric systems, the matrix is densified and solved
/// by QR least squares.
fn solve_linear(
    a: &CsrMatrix<f64>,
    rhs: &DenseVector,
    symmetric: bool,
) -> Result<Vec<f64>, SolverError> {
    let q = a.nrows();
    if symmetric && q >= SPARSE_THRESHOLD {
        let csc = to_csc(a);
        if let Some(x) = solve_sparse_cholesky(&csc, rhs) {
            return Ok(x.as_slice().to_vec());
        }
        warn!("sparse factorization failed for {q} rows, falling back to dense qr");
    }
    let x = lstsq_qr(&to_dense(a), rhs).ok_or(SolverError::Singular)?;
    Ok(x.as_slice().to_vec())
}
