//! Univariate B-spline basis evaluation (Cox-de Boor).

use crate::KnotVector;

/// Find the knot span index for parameter `t`.
///
/// Returns `span` such that `knots[span] <= t < knots[span + 1]`, clamped to
/// the valid range `[degree, n - 1]` where `n` is the basis count. For `t`
/// at or past the last knot, returns the last valid span.
fn find_span(knots: &[f64], degree: usize, t: f64) -> usize {
    // n = number of basis functions - 1 (last basis index)
    let n = knots.len() - degree - 2;
    if t >= knots[n + 1] {
        return n; // last valid span
    }
    if t <= knots[degree] {
        return degree; // first valid span
    }
    // Binary search
    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Compute the non-zero basis function values at parameter `t`.
///
/// Returns a vector of `degree + 1` values `N[span - degree ..= span]`.
/// Zero-length knot intervals contribute zero terms (the standard Cox-de
/// Boor convention), so repeated interior knots are handled gracefully.
fn basis_functions(knots: &[f64], span: usize, degree: usize, t: f64) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    n[0] = 1.0;

    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            let temp = if denom != 0.0 { n[r] / denom } else { 0.0 };
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }

    n
}

/// Evaluate the univariate basis at `t` on one axis.
///
/// Queries outside the outer knots are clamped to the boundary. Returns the
/// index of the first supported basis function and the `degree + 1` values
/// `N[first ..= first + degree]` at the (clamped) parameter.
pub fn eval_basis_axis(knot_vector: &KnotVector, degree: usize, t: f64) -> (usize, Vec<f64>) {
    let knots = knot_vector.as_slice();
    let t = t.clamp(knot_vector.first(), knot_vector.last());
    let span = find_span(knots, degree, t);
    let values = basis_functions(knots, span, degree, t);
    (span - degree, values)
}

/// Evaluate the univariate basis first derivatives at `t` on one axis.
///
/// Same support and clamping as [`eval_basis_axis`]. Uses the standard
/// degree-reduction formula
/// `N'_{i,p} = p (N_{i,p-1} / (k_{i+p} - k_i) - N_{i+1,p-1} / (k_{i+p+1} - k_{i+1}))`
/// with zero terms on zero-length intervals.
pub fn eval_basis_derivative_axis(
    knot_vector: &KnotVector,
    degree: usize,
    t: f64,
) -> (usize, Vec<f64>) {
    let knots = knot_vector.as_slice();
    let t = t.clamp(knot_vector.first(), knot_vector.last());
    let span = find_span(knots, degree, t);
    if degree == 0 {
        return (span, vec![0.0]);
    }

    // The `degree` non-zero lower-degree functions N[span-degree+1 ..= span].
    let lower = basis_functions(knots, span, degree - 1, t);

    let p = degree as f64;
    let mut derivatives = vec![0.0; degree + 1];
    for (j, slot) in derivatives.iter_mut().enumerate() {
        let i = span - degree + j;
        let mut value = 0.0;
        if j >= 1 {
            let denom = knots[i + degree] - knots[i];
            if denom != 0.0 {
                value += lower[j - 1] / denom;
            }
        }
        if j <= degree - 1 {
            let denom = knots[i + degree + 1] - knots[i + 1];
            if denom != 0.0 {
                value -= lower[j] / denom;
            }
        }
        *slot = p * value;
    }
    (span - degree, derivatives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bezier_cubic() -> KnotVector {
        KnotVector::new(vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0], 3).unwrap()
    }

    #[test]
    fn test_bernstein_coincidence() {
        // On a single clamped segment the basis equals the Bernstein polynomials.
        let kv = bezier_cubic();
        for i in 0..=20 {
            let t = i as f64 / 20.0;
            let (first, vals) = eval_basis_axis(&kv, 3, t);
            assert_eq!(first, 0);
            let u = 1.0 - t;
            let bernstein = [u * u * u, 3.0 * t * u * u, 3.0 * t * t * u, t * t * t];
            for (v, b) in vals.iter().zip(bernstein) {
                assert_relative_eq!(*v, b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_partition_of_unity() {
        let kv = KnotVector::new(
            vec![0.0, 0.0, 0.0, 1.0, 2.5, 2.5, 4.0, 5.0, 5.0, 5.0],
            2,
        )
        .unwrap();
        for i in 0..=100 {
            let t = 5.0 * i as f64 / 100.0;
            let (_, vals) = eval_basis_axis(&kv, 2, t);
            let sum: f64 = vals.iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_end_of_domain_span() {
        let kv = bezier_cubic();
        let (first, vals) = eval_basis_axis(&kv, 3, 1.0);
        // Span clamps to the last basis function; the end point is
        // interpolated by the final coefficient.
        assert_eq!(first, 0);
        assert_relative_eq!(vals[3], 1.0, epsilon = 1e-12);
        assert_relative_eq!(vals[0] + vals[1] + vals[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_out_of_domain_clamps() {
        let kv = bezier_cubic();
        let below = eval_basis_axis(&kv, 3, -2.0);
        let at_lo = eval_basis_axis(&kv, 3, 0.0);
        assert_eq!(below, at_lo);
        let above = eval_basis_axis(&kv, 3, 7.0);
        let at_hi = eval_basis_axis(&kv, 3, 1.0);
        assert_eq!(above, at_hi);
    }

    #[test]
    fn test_degree_zero() {
        let kv = KnotVector::new(vec![0.0, 1.0, 2.0, 3.0], 0).unwrap();
        let (first, vals) = eval_basis_axis(&kv, 0, 1.5);
        assert_eq!(first, 1);
        assert_relative_eq!(vals[0], 1.0);

        let (_, derivs) = eval_basis_derivative_axis(&kv, 0, 1.5);
        assert_relative_eq!(derivs[0], 0.0);
    }

    #[test]
    fn test_bernstein_derivatives() {
        let kv = bezier_cubic();
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            let (first, derivs) = eval_basis_derivative_axis(&kv, 3, t);
            assert_eq!(first, 0);
            let u = 1.0 - t;
            let expected = [
                -3.0 * u * u,
                3.0 * u * u - 6.0 * t * u,
                6.0 * t * u - 3.0 * t * t,
                3.0 * t * t,
            ];
            for (d, e) in derivs.iter().zip(expected) {
                assert_relative_eq!(*d, e, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_derivatives_sum_to_zero() {
        // Differentiating the partition of unity gives zero.
        let kv = KnotVector::new(
            vec![0.0, 0.0, 0.0, 1.0, 2.5, 2.5, 4.0, 5.0, 5.0, 5.0],
            2,
        )
        .unwrap();
        for i in 1..100 {
            let t = 5.0 * i as f64 / 100.0;
            let (_, derivs) = eval_basis_derivative_axis(&kv, 2, t);
            let sum: f64 = derivs.iter().sum();
            assert_relative_eq!(sum, 0.0, epsilon = 1e-12);
        }
    }
}
