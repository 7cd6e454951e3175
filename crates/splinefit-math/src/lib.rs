#![warn(missing_docs)]

//! Dense and sparse linear algebra support for the splinefit engine.
//!
//! Thin wrappers around nalgebra and nalgebra-sparse providing the handful
//! of operations the fitting pipeline needs: incremental sparse assembly,
//! dense QR least squares, LU inversion, and a sparse Cholesky solve for the
//! symmetric positive definite normal equations.
//!
//! Sparse matrices are assembled in COO (triplet) form and converted to
//! CSR/CSC for arithmetic; densification happens only where an algorithm
//! forces it (matrix inversion, the dense solve fallback).

mod solve;
mod sparse;

pub use solve::{inverse_lu, lstsq_qr, solve_sparse_cholesky};
pub use sparse::SparseBuilder;

pub use nalgebra_sparse::{CooMatrix, CscMatrix, CsrMatrix};

/// A dynamically sized dense matrix of `f64`.
pub type DenseMatrix = nalgebra::DMatrix<f64>;

/// A dynamically sized dense column vector of `f64`.
pub type DenseVector = nalgebra::DVector<f64>;

/// `num` equally spaced values over `[start, stop]`, endpoints included.
///
/// `num == 1` yields `[start]`; `num == 0` yields an empty vector.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num).map(|i| start + i as f64 * step).collect()
        }
    }
}

/// Convert a CSR matrix to its dense representation.
pub fn to_dense(a: &CsrMatrix<f64>) -> DenseMatrix {
    let mut out = DenseMatrix::zeros(a.nrows(), a.ncols());
    for (i, j, v) in a.triplet_iter() {
        out[(i, j)] += v;
    }
    out
}

/// Re-layout a CSR matrix as CSC, the layout sparse factorizations want.
pub fn to_csc(a: &CsrMatrix<f64>) -> CscMatrix<f64> {
    let mut coo = CooMatrix::new(a.nrows(), a.ncols());
    for (i, j, v) in a.triplet_iter() {
        coo.push(i, j, *v);
    }
    CscMatrix::from(&coo)
}

/// Sparse matrix-vector product `a * v`.
///
/// # Panics
/// Panics if `v.len() != a.ncols()`.
pub fn mul_vec(a: &CsrMatrix<f64>, v: &DenseVector) -> DenseVector {
    assert_eq!(v.len(), a.ncols(), "matrix-vector dimension mismatch");
    let mut out = DenseVector::zeros(a.nrows());
    for (i, row) in a.row_iter().enumerate() {
        let mut acc = 0.0;
        for (&j, &x) in row.col_indices().iter().zip(row.values()) {
            acc += x * v[j];
        }
        out[i] = acc;
    }
    out
}

/// Scale every stored entry of a CSR matrix by `s`.
pub fn scale(mut a: CsrMatrix<f64>, s: f64) -> CsrMatrix<f64> {
    for v in a.values_mut() {
        *v *= s;
    }
    a
}
