//! The immutable tensor-product spline.

use serde::{Deserialize, Serialize};

use crate::basis::{eval_basis_axis, eval_basis_derivative_axis};
use crate::{BasisError, KnotVector};

/// An immutable multivariate tensor-product B-spline `f: R^d -> R`.
///
/// Holds one knot vector and degree per axis plus the flat coefficient
/// vector. Coefficients are laid out lexicographically over the per-axis
/// basis indices with the LAST axis varying fastest (row-major over the
/// coefficient tensor).
///
/// A `Spline` is safe to share between threads once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spline {
    knot_vectors: Vec<KnotVector>,
    degrees: Vec<usize>,
    coefficients: Vec<f64>,
}

impl Spline {
    /// Assemble a spline from per-axis knot vectors, degrees and the flat
    /// coefficient vector.
    ///
    /// The coefficient count must equal the product of the per-axis basis
    /// counts `|k_i| - p_i - 1`.
    pub fn new(
        knot_vectors: Vec<KnotVector>,
        degrees: Vec<usize>,
        coefficients: Vec<f64>,
    ) -> Result<Self, BasisError> {
        if knot_vectors.len() != degrees.len() {
            return Err(BasisError::AxisCount {
                knots: knot_vectors.len(),
                degrees: degrees.len(),
            });
        }
        let expected: usize = knot_vectors
            .iter()
            .zip(&degrees)
            .map(|(kv, &p)| kv.num_basis_functions(p))
            .product();
        if coefficients.len() != expected {
            return Err(BasisError::CoefficientCount {
                expected,
                got: coefficients.len(),
            });
        }
        Ok(Self {
            knot_vectors,
            degrees,
            coefficients,
        })
    }

    /// Number of variables `d`.
    pub fn num_variables(&self) -> usize {
        self.degrees.len()
    }

    /// Per-axis basis function counts `[n_0 ... n_{d-1}]`.
    pub fn basis_counts(&self) -> Vec<usize> {
        self.knot_vectors
            .iter()
            .zip(&self.degrees)
            .map(|(kv, &p)| kv.num_basis_functions(p))
            .collect()
    }

    /// Total number of tensor-product basis functions `N`.
    pub fn num_basis_functions(&self) -> usize {
        self.basis_counts().iter().product()
    }

    /// The per-axis knot vectors.
    pub fn knot_vectors(&self) -> &[KnotVector] {
        &self.knot_vectors
    }

    /// The per-axis degrees.
    pub fn degrees(&self) -> &[usize] {
        &self.degrees
    }

    /// Read-only view of the flat coefficient vector.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Per-axis evaluable domain `[first knot, last knot]`.
    ///
    /// Queries are clamped into this box axis by axis.
    pub fn domain(&self) -> Vec<(f64, f64)> {
        self.knot_vectors
            .iter()
            .map(|kv| (kv.first(), kv.last()))
            .collect()
    }

    /// The sparse multivariate basis row at `x`.
    ///
    /// Returns `(column, value)` pairs with ascending column indices; at
    /// most `prod(p_j + 1)` entries are non-zero. Columns follow the
    /// coefficient layout (last axis fastest).
    pub fn eval_basis(&self, x: &[f64]) -> Result<Vec<(usize, f64)>, BasisError> {
        self.check_dimension(x)?;

        let mut offsets = Vec::with_capacity(x.len());
        let mut axis_values = Vec::with_capacity(x.len());
        for ((kv, &p), &t) in self.knot_vectors.iter().zip(&self.degrees).zip(x) {
            let (first, values) = eval_basis_axis(kv, p, t);
            offsets.push(first);
            axis_values.push(values);
        }
        Ok(self.tensor_row(&offsets, &axis_values))
    }

    /// Evaluate the spline at `x`.
    ///
    /// Equal to the inner product of [`Self::eval_basis`] with the
    /// coefficient vector. Fails if `x.len()` differs from the spline's
    /// dimensionality.
    pub fn eval(&self, x: &[f64]) -> Result<f64, BasisError> {
        let row = self.eval_basis(x)?;
        Ok(self.contract(&row))
    }

    /// Evaluate the gradient `[df/dx_0 ... df/dx_{d-1}]` at `x`.
    ///
    /// Component `a` replaces axis `a`'s basis values with their first
    /// derivatives in the tensor product. Clamped like [`Self::eval`], so
    /// outside the domain this is the gradient at the nearest boundary
    /// point.
    pub fn eval_jacobian(&self, x: &[f64]) -> Result<Vec<f64>, BasisError> {
        self.check_dimension(x)?;
        let d = self.num_variables();

        let mut offsets = Vec::with_capacity(d);
        let mut axis_values = Vec::with_capacity(d);
        let mut axis_derivatives = Vec::with_capacity(d);
        for ((kv, &p), &t) in self.knot_vectors.iter().zip(&self.degrees).zip(x) {
            let (first, values) = eval_basis_axis(kv, p, t);
            let (_, derivatives) = eval_basis_derivative_axis(kv, p, t);
            offsets.push(first);
            axis_values.push(values);
            axis_derivatives.push(derivatives);
        }

        let mut gradient = Vec::with_capacity(d);
        for axis in 0..d {
            std::mem::swap(&mut axis_values[axis], &mut axis_derivatives[axis]);
            let row = self.tensor_row(&offsets, &axis_values);
            gradient.push(self.contract(&row));
            std::mem::swap(&mut axis_values[axis], &mut axis_derivatives[axis]);
        }
        Ok(gradient)
    }

    fn check_dimension(&self, x: &[f64]) -> Result<(), BasisError> {
        let d = self.num_variables();
        if x.len() != d {
            return Err(BasisError::DimensionMismatch {
                expected: d,
                got: x.len(),
            });
        }
        Ok(())
    }

    fn contract(&self, row: &[(usize, f64)]) -> f64 {
        row.iter()
            .map(|&(column, value)| value * self.coefficients[column])
            .sum()
    }

    /// Combine per-axis values into the sparse tensor-product row, walking
    /// the local support with the last axis fastest.
    fn tensor_row(&self, offsets: &[usize], axis_values: &[Vec<f64>]) -> Vec<(usize, f64)> {
        let d = self.num_variables();

        // Strides of the flat layout: last axis fastest.
        let counts = self.basis_counts();
        let mut strides = vec![1usize; d];
        for axis in (0..d.saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * counts[axis + 1];
        }

        let total: usize = axis_values.iter().map(Vec::len).product();
        let mut row = Vec::with_capacity(total);
        let mut local = vec![0usize; d];
        loop {
            let mut column = 0;
            let mut value = 1.0;
            for axis in 0..d {
                column += (offsets[axis] + local[axis]) * strides[axis];
                value *= axis_values[axis][local[axis]];
            }
            row.push((column, value));

            let mut axis = d;
            loop {
                if axis == 0 {
                    return row;
                }
                axis -= 1;
                local[axis] += 1;
                if local[axis] < axis_values[axis].len() {
                    break;
                }
                local[axis] = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_knot_vector, KnotSpacing};
    use approx::assert_relative_eq;

    fn line_spline_1d() -> Spline {
        // Degree-1 spline on [0, 2] with coefficients equal to the Greville
        // abscissae reproduces the identity function.
        let kv = KnotVector::new(vec![0.0, 0.0, 1.0, 2.0, 2.0], 1).unwrap();
        Spline::new(vec![kv], vec![1], vec![0.0, 1.0, 2.0]).unwrap()
    }

    #[test]
    fn test_coefficient_count_enforced() {
        let kv = KnotVector::new(vec![0.0, 0.0, 1.0, 1.0], 1).unwrap();
        let err = Spline::new(vec![kv], vec![1], vec![0.0]).unwrap_err();
        assert_eq!(
            err,
            BasisError::CoefficientCount {
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn test_eval_dimension_mismatch() {
        let spline = line_spline_1d();
        let err = spline.eval(&[0.5, 0.5]).unwrap_err();
        assert_eq!(
            err,
            BasisError::DimensionMismatch {
                expected: 1,
                got: 2
            }
        );
    }

    #[test]
    fn test_linear_reproduction_1d() {
        let spline = line_spline_1d();
        for i in 0..=10 {
            let t = 2.0 * i as f64 / 10.0;
            assert_relative_eq!(spline.eval(&[t]).unwrap(), t, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_basis_row_partition_of_unity_2d() {
        let kv_u =
            build_knot_vector(&[0.0, 1.0, 2.0, 3.0, 4.0], 2, KnotSpacing::AsSampled, 0, None, 0.0)
                .unwrap();
        let kv_v =
            build_knot_vector(&[0.0, 0.5, 1.0, 1.5, 2.0], 2, KnotSpacing::AsSampled, 0, None, 0.0)
                .unwrap();
        let n = kv_u.num_basis_functions(2) * kv_v.num_basis_functions(2);
        let spline = Spline::new(vec![kv_u, kv_v], vec![2, 2], vec![0.0; n]).unwrap();

        let row = spline.eval_basis(&[1.3, 0.7]).unwrap();
        assert!(row.len() <= 9);
        let sum: f64 = row.iter().map(|&(_, v)| v).sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        // Columns ascend and stay in range.
        for pair in row.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
        assert!(row.iter().all(|&(c, _)| c < n));
    }

    #[test]
    fn test_jacobian_of_quadratic() {
        // Coefficients (0, 0, 1) over a single Bernstein segment give
        // f(t) = t^2, so the derivative is 2t.
        let kv = KnotVector::new(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0], 2).unwrap();
        let spline = Spline::new(vec![kv], vec![2], vec![0.0, 0.0, 1.0]).unwrap();
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            let gradient = spline.eval_jacobian(&[t]).unwrap();
            assert_eq!(gradient.len(), 1);
            assert_relative_eq!(gradient[0], 2.0 * t, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_coefficient_layout_last_axis_fastest() {
        // 2 x 3 coefficient grid; f picks out basis (i, j) = (1, 2).
        let kv_u = KnotVector::new(vec![0.0, 0.0, 1.0, 1.0], 1).unwrap();
        let kv_v = KnotVector::new(vec![0.0, 0.0, 0.5, 1.0, 1.0], 1).unwrap();
        let mut coefficients = vec![0.0; 6];
        coefficients[5] = 1.0; // (i, j) = (1, 2) at stride (3, 1)
        let spline = Spline::new(vec![kv_u, kv_v], vec![1, 1], coefficients).unwrap();
        // Basis (1, 2) peaks at u = 1, v = 1 for these degree-1 bases.
        assert_relative_eq!(spline.eval(&[1.0, 1.0]).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(spline.eval(&[0.0, 0.0]).unwrap(), 0.0, epsilon = 1e-12);
    }
}
