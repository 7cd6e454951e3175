//! Assembly of the sparse regression system.

use nalgebra_sparse::CsrMatrix;
use splinefit_basis::Spline;
use splinefit_data::SampleStore;
use splinefit_math::SparseBuilder;

use crate::SolverError;

/// Assemble the m x N design matrix B: row i is the multivariate basis of
/// the skeletal spline evaluated at sample abscissa x_i.
pub fn design_matrix(spline: &Spline, store: &SampleStore) -> Result<CsrMatrix<f64>, SolverError> {
    let m = store.len();
    let n = spline.num_basis_functions();
    let row_nnz: usize = spline.degrees().iter().map(|p| p + 1).product();

    let mut builder = SparseBuilder::with_capacity(m, n, m * row_nnz);
    for (i, sample) in store.samples().iter().enumerate() {
        for (column, value) in spline.eval_basis(sample.x())? {
            builder.push(i, column, value);
        }
    }
    Ok(builder.to_csr())
}

/// Assemble the diagonal m x m weight matrix W: the identity when `weights`
/// is empty, `diag(weights)` otherwise.
///
/// # Panics
/// Panics if `weights` is non-empty with length differing from `m`; the
/// builder facade validates this before assembly.
pub fn weight_matrix(weights: &[f64], m: usize) -> CsrMatrix<f64> {
    if weights.is_empty() {
        SparseBuilder::identity(m).to_csr()
    } else {
        assert_eq!(weights.len(), m, "weight count must match sample count");
        SparseBuilder::diagonal(weights).to_csr()
    }
}

/// Assemble the second-order finite-difference penalty D over the
/// coefficient tensor.
///
/// Every axis contributes rows applying the (+1, -2, +1) stencil along that
/// axis while an identity block sweeps the remaining axes. Axes are visited
/// in reverse (the fastest-varying coefficient axis first) and within an
/// axis the slower-axis blocks advance before the stencil offset; this row
/// ordering is part of the fitting contract.
///
/// Requires at least 3 basis functions on every axis.
pub fn penalty_matrix(basis_counts: &[usize]) -> Result<CsrMatrix<f64>, SolverError> {
    if let Some(axis) = basis_counts.iter().position(|&n| n < 3) {
        return Err(SolverError::PenaltyTooCoarse {
            axis,
            got: basis_counts[axis],
        });
    }

    // The coefficient layout has the last axis varying fastest, so the
    // reversed counts list axes by increasing stride.
    let dims: Vec<usize> = basis_counts.iter().rev().copied().collect();
    let n_total: usize = dims.iter().product();
    let total_rows: usize = dims.iter().map(|&dim| (n_total / dim) * (dim - 2)).sum();

    let mut builder = SparseBuilder::with_capacity(total_rows, n_total, 3 * total_rows);
    let mut row = 0;
    for (a, &dim) in dims.iter().enumerate() {
        let left: usize = dims[..a].iter().product();
        let right: usize = dims[a + 1..].iter().product();
        for j in 0..right {
            let base = j * left * dim;
            for l in 0..dim - 2 {
                for k in 0..left {
                    let column = base + l * left + k;
                    builder.push(row, column, 1.0);
                    builder.push(row, column + left, -2.0);
                    builder.push(row, column + 2 * left, 1.0);
                    row += 1;
                }
            }
        }
    }
    debug_assert_eq!(row, total_rows);
    Ok(builder.to_csr())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use splinefit_basis::{build_knot_vector, KnotSpacing, Spline};
    use splinefit_math::{mul_vec, to_dense, DenseVector};

    #[test]
    fn test_design_matrix_rows_sum_to_one() {
        let mut store = SampleStore::new();
        for i in 0..5 {
            store.add(&[i as f64], (i * i) as f64).unwrap();
        }
        let kv = build_knot_vector(
            &store.axis_values(0).unwrap(),
            3,
            KnotSpacing::AsSampled,
            0,
            None,
            0.0,
        )
        .unwrap();
        let spline = Spline::new(vec![kv], vec![3], vec![0.0; 5]).unwrap();

        let b = design_matrix(&spline, &store).unwrap();
        assert_eq!(b.nrows(), 5);
        assert_eq!(b.ncols(), 5);
        let ones = DenseVector::from_element(5, 1.0);
        let row_sums = mul_vec(&b, &ones);
        for i in 0..5 {
            assert_relative_eq!(row_sums[i], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_weight_matrix_identity_and_diagonal() {
        let id = to_dense(&weight_matrix(&[], 3));
        assert_relative_eq!(id[(0, 0)], 1.0);
        assert_relative_eq!(id[(2, 2)], 1.0);
        assert_relative_eq!(id[(0, 1)], 0.0);

        let w = to_dense(&weight_matrix(&[0.5, 2.0], 2));
        assert_relative_eq!(w[(0, 0)], 0.5);
        assert_relative_eq!(w[(1, 1)], 2.0);
    }

    #[test]
    fn test_penalty_matrix_1d() {
        let d = penalty_matrix(&[5]).unwrap();
        assert_eq!(d.nrows(), 3);
        assert_eq!(d.ncols(), 5);
        let dense = to_dense(&d);
        for l in 0..3 {
            assert_relative_eq!(dense[(l, l)], 1.0);
            assert_relative_eq!(dense[(l, l + 1)], -2.0);
            assert_relative_eq!(dense[(l, l + 2)], 1.0);
        }
        // A linear coefficient ramp has vanishing second differences.
        let linear = DenseVector::from_vec(vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(mul_vec(&d, &linear).norm() < 1e-14);
    }

    #[test]
    fn test_penalty_matrix_2d_shape_and_order() {
        // Axis counts (n0, n1) = (3, 4): reversed dims are [4, 3].
        let d = penalty_matrix(&[3, 4]).unwrap();
        // Axis a=0 (stride 1): 3 blocks x 2 stencils; axis a=1 (stride 4):
        // 1 block x 1 stencil x 4 sweeps.
        assert_eq!(d.nrows(), 6 + 4);
        assert_eq!(d.ncols(), 12);

        let dense = to_dense(&d);
        // First row: stencil along the fastest axis at the origin.
        assert_relative_eq!(dense[(0, 0)], 1.0);
        assert_relative_eq!(dense[(0, 1)], -2.0);
        assert_relative_eq!(dense[(0, 2)], 1.0);
        // First slow-axis row (row 6): stride-4 stencil swept by identity.
        assert_relative_eq!(dense[(6, 0)], 1.0);
        assert_relative_eq!(dense[(6, 4)], -2.0);
        assert_relative_eq!(dense[(6, 8)], 1.0);
        assert_relative_eq!(dense[(7, 1)], 1.0);
        assert_relative_eq!(dense[(7, 5)], -2.0);
        assert_relative_eq!(dense[(7, 9)], 1.0);
    }

    #[test]
    fn test_penalty_requires_three_basis_functions() {
        let err = penalty_matrix(&[5, 2]).unwrap_err();
        assert_eq!(err, SolverError::PenaltyTooCoarse { axis: 1, got: 2 });
    }
}
