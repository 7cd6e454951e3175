//! Direct solvers: dense QR least squares, LU inversion, sparse Cholesky.

use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::CscMatrix;

use crate::{DenseMatrix, DenseVector};

/// Least-squares solve of `a * x = b` via thin QR.
///
/// Accepts square or overdetermined systems (`nrows >= ncols`). Returns
/// `None` for underdetermined or rank-deficient systems. The rank test uses
/// the standard relative tolerance on the R diagonal.
pub fn lstsq_qr(a: &DenseMatrix, b: &DenseVector) -> Option<DenseVector> {
    let (m, n) = (a.nrows(), a.ncols());
    if m < n || n == 0 || b.len() != m {
        return None;
    }

    let qr = a.clone().qr();
    let r = qr.r();

    let max_diag = (0..n).map(|i| r[(i, i)].abs()).fold(0.0, f64::max);
    if max_diag == 0.0 {
        return None;
    }
    let tol = f64::EPSILON * max_diag * m as f64;
    if (0..n).any(|i| r[(i, i)].abs() <= tol) {
        return None;
    }

    let rhs = qr.q().transpose() * b;
    r.solve_upper_triangular(&rhs)
}

/// Dense inverse via partial-pivot LU. `None` if singular.
pub fn inverse_lu(a: &DenseMatrix) -> Option<DenseMatrix> {
    a.clone().lu().try_inverse()
}

/// Solve `a * x = b` for a symmetric positive definite sparse matrix via
/// sparse Cholesky. Returns `None` when the factorization fails (the matrix
/// is not SPD within working precision).
pub fn solve_sparse_cholesky(a: &CscMatrix<f64>, b: &DenseVector) -> Option<DenseVector> {
    let factor = CscCholesky::factor(a).ok()?;
    let rhs = DenseMatrix::from_column_slice(b.len(), 1, b.as_slice());
    let x = factor.solve(&rhs);
    Some(x.column(0).into_owned())
}
