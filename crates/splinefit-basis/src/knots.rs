//! Knot vector synthesis from sample abscissae.
//!
//! Three strategies produce a clamped knot vector per axis. All of them
//! require at least `degree + 1` distinct axis values and clamp by repeating
//! the end knots to multiplicity `degree + 1`, so the resulting spline
//! interpolates its domain endpoints.

use serde::{Deserialize, Serialize};
use splinefit_math::linspace;

use crate::BasisError;

/// Interior knots produced by the experimental strategy are capped so that
/// no axis carries more than this many basis functions.
const MAX_SEGMENTS: usize = 10;

/// Knot synthesis strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnotSpacing {
    /// Moving average of the sorted distinct sample values (clamped).
    #[default]
    AsSampled,
    /// Equidistant knots over the (optionally padded and bounded) data extent.
    Equidistant,
    /// Bucketed moving average with a capped segment count. Experimental.
    Experimental,
}

impl KnotSpacing {
    /// Map the binding-level integer code (0, 1, 2) to a strategy.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::AsSampled),
            1 => Some(Self::Equidistant),
            2 => Some(Self::Experimental),
            _ => None,
        }
    }
}

/// A validated clamped knot vector for one axis.
///
/// Non-decreasing, and the first and last knots carry multiplicity at least
/// `degree + 1` for the degree the vector was built for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnotVector(Vec<f64>);

impl KnotVector {
    /// Validate and wrap a knot sequence for the given degree.
    pub fn new(knots: Vec<f64>, degree: usize) -> Result<Self, BasisError> {
        if knots.len() < 2 * (degree + 1) {
            return Err(BasisError::NotClamped { degree });
        }
        if !knots.windows(2).all(|w| w[0] <= w[1]) {
            return Err(BasisError::NotNonDecreasing);
        }
        let first = knots[0];
        let last = knots[knots.len() - 1];
        let head = knots.iter().take_while(|&&k| k == first).count();
        let tail = knots.iter().rev().take_while(|&&k| k == last).count();
        if head < degree + 1 || tail < degree + 1 {
            return Err(BasisError::NotClamped { degree });
        }
        Ok(Self(knots))
    }

    /// Number of knots.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector is empty (never true for a validated vector).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The knots as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// First knot (the lower end of the evaluable domain).
    pub fn first(&self) -> f64 {
        self.0[0]
    }

    /// Last knot (the upper end of the evaluable domain).
    pub fn last(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// Number of basis functions this vector supports at `degree`.
    pub fn num_basis_functions(&self, degree: usize) -> usize {
        self.0.len() - degree - 1
    }
}

/// Sorted distinct copy of `values`.
///
/// # Panics
/// Panics if any value is NaN; the sample store rejects those upstream.
pub fn sorted_unique(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).expect("axis values must not be NaN"));
    out.dedup();
    out
}

/// Build a knot vector for one axis from its raw sample values.
///
/// `num_basis` is only consulted by [`KnotSpacing::Equidistant`] (zero means
/// "derive from the data"); `bounds` slots that are NaN fall back to the data
/// extent; `padding` widens the equidistant extent by that fraction of its
/// width on each side.
pub fn build_knot_vector(
    values: &[f64],
    degree: usize,
    spacing: KnotSpacing,
    num_basis: usize,
    bounds: Option<(f64, f64)>,
    padding: f64,
) -> Result<KnotVector, BasisError> {
    let unique = sorted_unique(values);
    let knots = match spacing {
        KnotSpacing::AsSampled => knots_as_sampled(&unique, degree)?,
        KnotSpacing::Equidistant => {
            knots_equidistant(&unique, degree, num_basis, bounds, padding)?
        }
        KnotSpacing::Experimental => knots_buckets(&unique, degree)?,
    };
    KnotVector::new(knots, degree)
}

fn require_enough(n: usize, degree: usize) -> Result<(), BasisError> {
    if n < degree + 1 {
        return Err(BasisError::TooFewUniqueValues {
            required: degree + 1,
            got: n,
            degree,
        });
    }
    Ok(())
}

/// Moving-average knots: interior knot i is the mean of the window
/// `unique[i..i + degree + 2]`, clamped to multiplicity degree + 1.
fn knots_as_sampled(unique: &[f64], degree: usize) -> Result<Vec<f64>, BasisError> {
    let n = unique.len();
    require_enough(n, degree)?;

    let window = degree + 2;
    let interior = n - degree - 1;

    let mut knots = Vec::with_capacity(n + degree + 1);
    knots.extend(std::iter::repeat(unique[0]).take(degree + 1));
    for i in 0..interior {
        let mean = unique[i..i + window].iter().sum::<f64>() / window as f64;
        knots.push(mean);
    }
    knots.extend(std::iter::repeat(unique[n - 1]).take(degree + 1));
    Ok(knots)
}

/// Equidistant knots over `[lo, hi]` with end multiplicity degree + 1.
///
/// When the requested basis count leaves no interior knots the vector
/// degenerates to the two clamp blocks (a single polynomial segment).
fn knots_equidistant(
    unique: &[f64],
    degree: usize,
    num_basis: usize,
    bounds: Option<(f64, f64)>,
    padding: f64,
) -> Result<Vec<f64>, BasisError> {
    let n = if num_basis > 0 { num_basis } else { unique.len() };
    require_enough(n, degree)?;

    let (bound_lo, bound_hi) = bounds.unwrap_or((f64::NAN, f64::NAN));
    let mut lo = if bound_lo.is_nan() { unique[0] } else { bound_lo };
    let mut hi = if bound_hi.is_nan() {
        unique[unique.len() - 1]
    } else {
        bound_hi
    };
    let pad = (hi - lo) * padding;
    lo -= pad;
    hi += pad;

    // n - degree - 1 strictly interior knots; the linspace carries lo and hi
    // once each, the clamp blocks contribute the remaining `degree` copies.
    let span = n + 1 - degree;
    if n == degree + 1 || span < 2 {
        let mut knots = vec![lo; degree + 1];
        knots.extend(std::iter::repeat(hi).take(degree + 1));
        return Ok(knots);
    }

    let mut knots = Vec::with_capacity(n + degree + 1);
    knots.extend(std::iter::repeat(lo).take(degree));
    knots.extend(linspace(lo, hi, span));
    knots.extend(std::iter::repeat(hi).take(degree));
    Ok(knots)
}

/// Bucketed moving-average knots: the distinct values are split into one
/// bucket per interior knot and each knot is the mean of its bucket. The
/// number of basis functions is capped at [`MAX_SEGMENTS`]; the requested
/// basis count is deliberately ignored here, matching the historical
/// behavior of this strategy.
fn knots_buckets(unique: &[f64], degree: usize) -> Result<Vec<f64>, BasisError> {
    let n = unique.len();
    require_enough(n, degree)?;

    let mut interior = n - degree - 1;
    if interior + degree + 1 > MAX_SEGMENTS && MAX_SEGMENTS >= degree + 1 {
        interior = MAX_SEGMENTS - degree - 1;
    }

    let mut knots = Vec::with_capacity(interior + 2 * (degree + 1));
    knots.extend(std::iter::repeat(unique[0]).take(degree + 1));
    if interior > 0 {
        let width = n / interior;
        let residual = n - width * interior;
        let mut cursor = 0;
        for i in 0..interior {
            let size = if i < residual { width + 1 } else { width };
            let bucket = &unique[cursor..cursor + size];
            knots.push(bucket.iter().sum::<f64>() / size as f64);
            cursor += size;
        }
    }
    knots.extend(std::iter::repeat(unique[n - 1]).take(degree + 1));
    Ok(knots)
}
