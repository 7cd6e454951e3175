#![warn(missing_docs)]

//! Sample storage for the splinefit engine.
//!
//! A [`SampleStore`] holds scattered or gridded samples `(x, y)` with
//! `x` in R^d and scalar `y`. The dimensionality `d` is fixed by the first
//! insertion. The store reports per-axis value sets and whether the samples
//! form a complete Cartesian grid, which is what the fitting pipeline keys
//! its interpolation guarantees on.
//!
//! # Example
//!
//! ```
//! use splinefit_data::SampleStore;
//!
//! let mut store = SampleStore::new();
//! for i in 0..3 {
//!     for j in 0..3 {
//!         store.add(&[i as f64, j as f64], (i + j) as f64).unwrap();
//!     }
//! }
//! assert_eq!(store.num_variables(), 2);
//! assert!(store.is_grid_complete());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from sample insertion and lookup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// A sample's dimensionality differs from the store's.
    #[error("sample has {got} coordinates but the store holds {expected}-dimensional samples")]
    DimensionMismatch {
        /// Dimensionality fixed by the first insertion.
        expected: usize,
        /// Dimensionality of the offending sample.
        got: usize,
    },

    /// A flat data array does not match the declared shape.
    #[error("flat array of length {len} does not match {rows} rows x {cols} columns")]
    BadShape {
        /// Length of the provided array.
        len: usize,
        /// Declared row count.
        rows: usize,
        /// Declared column count.
        cols: usize,
    },

    /// Column-major ingestion needs at least one x column and the y column.
    #[error("need at least 2 columns (x..., y), got {0}")]
    TooFewColumns(usize),

    /// Axis index out of range.
    #[error("axis {axis} out of range for dimensionality {dim}")]
    AxisOutOfRange {
        /// Requested axis.
        axis: usize,
        /// Store dimensionality.
        dim: usize,
    },

    /// A coordinate or value is NaN or infinite.
    #[error("sample coordinates and values must be finite")]
    NotFinite,
}

/// One sample point: abscissa `x` in R^d and ordinate `y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    x: Vec<f64>,
    y: f64,
}

impl Sample {
    /// Create a sample from its coordinates and value.
    pub fn new(x: Vec<f64>, y: f64) -> Self {
        Self { x, y }
    }

    /// The abscissa coordinates.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// The ordinate value.
    pub fn y(&self) -> f64 {
        self.y
    }
}

/// An ordered collection of samples with fixed dimensionality.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleStore {
    samples: Vec<Sample>,
    dim: Option<usize>,
}

impl SampleStore {
    /// Create an empty store. Dimensionality is fixed by the first `add`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of samples `m`.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the store holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Dimensionality `d`; zero while the store is empty.
    pub fn num_variables(&self) -> usize {
        self.dim.unwrap_or(0)
    }

    /// The samples in insertion order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Add one sample. The first insertion fixes the dimensionality.
    pub fn add(&mut self, x: &[f64], y: f64) -> Result<(), DataError> {
        if !y.is_finite() || x.iter().any(|v| !v.is_finite()) {
            return Err(DataError::NotFinite);
        }
        match self.dim {
            None => self.dim = Some(x.len()),
            Some(expected) if expected != x.len() => {
                return Err(DataError::DimensionMismatch {
                    expected,
                    got: x.len(),
                })
            }
            Some(_) => {}
        }
        self.samples.push(Sample::new(x.to_vec(), y));
        Ok(())
    }

    /// Add `rows` samples from a column-major flat array.
    ///
    /// The array holds `cols` columns of `rows` values each: first all x0
    /// values, then all x1 values, ..., and the LAST column is y. The
    /// dimensionality is therefore `cols - 1` (the binding convention this
    /// engine preserves).
    pub fn add_col_major(&mut self, data: &[f64], rows: usize, cols: usize) -> Result<(), DataError> {
        if cols < 2 {
            return Err(DataError::TooFewColumns(cols));
        }
        if data.len() != rows * cols {
            return Err(DataError::BadShape {
                len: data.len(),
                rows,
                cols,
            });
        }
        // A failing batch must leave the store untouched.
        if data.iter().any(|v| !v.is_finite()) {
            return Err(DataError::NotFinite);
        }
        let d = cols - 1;
        let mut x = vec![0.0; d];
        for i in 0..rows {
            for (j, slot) in x.iter_mut().enumerate() {
                *slot = data[j * rows + i];
            }
            self.add(&x, data[d * rows + i])?;
        }
        Ok(())
    }

    /// The sorted distinct values observed on `axis`.
    pub fn axis_values(&self, axis: usize) -> Result<Vec<f64>, DataError> {
        let dim = self.num_variables();
        if axis >= dim {
            return Err(DataError::AxisOutOfRange { axis, dim });
        }
        let mut values: Vec<f64> = self.samples.iter().map(|s| s.x[axis]).collect();
        values.sort_by(|a, b| a.partial_cmp(b).expect("finite by construction"));
        values.dedup();
        Ok(values)
    }

    /// Sorted distinct values for every axis.
    pub fn axis_values_all(&self) -> Vec<Vec<f64>> {
        (0..self.num_variables())
            .map(|axis| self.axis_values(axis).expect("axis in range"))
            .collect()
    }

    /// The ordinate values in sample order.
    pub fn ys(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.y).collect()
    }

    /// Whether the samples form the full Cartesian product of the distinct
    /// per-axis values.
    pub fn is_grid_complete(&self) -> bool {
        if self.samples.is_empty() {
            return false;
        }
        let grid_size: usize = self
            .axis_values_all()
            .iter()
            .map(|values| values.len())
            .product();
        self.samples.len() == grid_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_fixed_by_first_add() {
        let mut store = SampleStore::new();
        store.add(&[1.0, 2.0], 3.0).unwrap();
        assert_eq!(store.num_variables(), 2);
        let err = store.add(&[1.0], 0.0).unwrap_err();
        assert_eq!(
            err,
            DataError::DimensionMismatch {
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut store = SampleStore::new();
        assert_eq!(store.add(&[f64::NAN], 0.0), Err(DataError::NotFinite));
        assert_eq!(store.add(&[0.0], f64::INFINITY), Err(DataError::NotFinite));
        assert!(store.is_empty());
    }

    #[test]
    fn test_axis_values_sorted_unique() {
        let mut store = SampleStore::new();
        store.add(&[2.0], 0.0).unwrap();
        store.add(&[0.0], 1.0).unwrap();
        store.add(&[2.0], 2.0).unwrap();
        store.add(&[1.0], 3.0).unwrap();
        assert_eq!(store.axis_values(0).unwrap(), vec![0.0, 1.0, 2.0]);
        assert!(store.axis_values(1).is_err());
    }

    #[test]
    fn test_grid_completeness() {
        let mut store = SampleStore::new();
        for i in 0..2 {
            for j in 0..3 {
                store.add(&[i as f64, j as f64], 0.0).unwrap();
            }
        }
        assert!(store.is_grid_complete());

        let mut partial = SampleStore::new();
        partial.add(&[0.0, 0.0], 0.0).unwrap();
        partial.add(&[1.0, 1.0], 0.0).unwrap();
        assert!(!partial.is_grid_complete());

        assert!(!SampleStore::new().is_grid_complete());
    }

    #[test]
    fn test_col_major_last_column_is_y() {
        // 3 rows, 3 columns: x0 = [0,1,2], x1 = [5,6,7], y = [10,11,12]
        let data = [0.0, 1.0, 2.0, 5.0, 6.0, 7.0, 10.0, 11.0, 12.0];
        let mut store = SampleStore::new();
        store.add_col_major(&data, 3, 3).unwrap();
        assert_eq!(store.num_variables(), 2);
        assert_eq!(store.len(), 3);
        assert_eq!(store.samples()[1].x(), &[1.0, 6.0]);
        assert_eq!(store.samples()[1].y(), 11.0);
    }

    #[test]
    fn test_col_major_shape_errors() {
        let mut store = SampleStore::new();
        assert_eq!(
            store.add_col_major(&[1.0, 2.0], 2, 1),
            Err(DataError::TooFewColumns(1))
        );
        assert_eq!(
            store.add_col_major(&[1.0, 2.0, 3.0], 2, 2),
            Err(DataError::BadShape {
                len: 3,
                rows: 2,
                cols: 2
            })
        );
    }
}
