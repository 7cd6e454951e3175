//! Incremental sparse matrix assembly.

use nalgebra_sparse::{CooMatrix, CscMatrix, CsrMatrix};

use crate::DenseMatrix;

/// Sparse matrix builder accumulating COO (triplet) entries.
///
/// Assembly-friendly: entries may arrive in any order and duplicates are
/// summed on conversion. Convert once assembly is finished; the builder is
/// not meant for arithmetic.
#[derive(Debug, Clone)]
pub struct SparseBuilder {
    nrows: usize,
    ncols: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl SparseBuilder {
    /// Create a builder for an `nrows` x `ncols` matrix.
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            entries: Vec::new(),
        }
    }

    /// Create a builder with pre-allocated space for `cap` entries.
    pub fn with_capacity(nrows: usize, ncols: usize, cap: usize) -> Self {
        Self {
            nrows,
            ncols,
            entries: Vec::with_capacity(cap),
        }
    }

    /// Add a value at `(row, col)`; accumulates with existing entries.
    ///
    /// # Panics
    /// Panics if the position is out of bounds.
    #[inline]
    pub fn push(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.nrows && col < self.ncols, "entry out of bounds");
        if value != 0.0 {
            self.entries.push((row, col, value));
        }
    }

    /// Number of stored (pre-deduplication) entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    fn to_coo(&self) -> CooMatrix<f64> {
        let mut coo = CooMatrix::new(self.nrows, self.ncols);
        for &(row, col, val) in &self.entries {
            coo.push(row, col, val);
        }
        coo
    }

    /// Convert to CSR format.
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        CsrMatrix::from(&self.to_coo())
    }

    /// Convert to CSC format (the layout sparse factorizations want).
    pub fn to_csc(&self) -> CscMatrix<f64> {
        CscMatrix::from(&self.to_coo())
    }

    /// Convert to a dense matrix.
    pub fn to_dense(&self) -> DenseMatrix {
        let mut out = DenseMatrix::zeros(self.nrows, self.ncols);
        for &(row, col, val) in &self.entries {
            out[(row, col)] += val;
        }
        out
    }

    /// The `n` x `n` identity matrix, ready for CSR conversion.
    pub fn identity(n: usize) -> Self {
        let mut b = Self::with_capacity(n, n, n);
        for i in 0..n {
            b.push(i, i, 1.0);
        }
        b
    }

    /// A diagonal matrix carrying `values`.
    pub fn diagonal(values: &[f64]) -> Self {
        let n = values.len();
        let mut b = Self::with_capacity(n, n, n);
        for (i, &v) in values.iter().enumerate() {
            b.push(i, i, v);
        }
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_duplicates() {
        let mut b = SparseBuilder::new(2, 2);
        b.push(0, 0, 1.0);
        b.push(0, 0, 2.0);
        let dense = b.to_dense();
        assert_eq!(dense[(0, 0)], 3.0);
        let csr = b.to_csr();
        assert_eq!(csr.nnz(), 1);
        assert_eq!(csr.get_entry(0, 0).unwrap().into_value(), 3.0);
    }

    #[test]
    fn test_identity_and_diagonal() {
        let id = SparseBuilder::identity(3).to_csr();
        assert_eq!(id.nnz(), 3);
        let diag = SparseBuilder::diagonal(&[2.0, 0.5]).to_dense();
        assert_eq!(diag[(0, 0)], 2.0);
        assert_eq!(diag[(1, 1)], 0.5);
        assert_eq!(diag[(0, 1)], 0.0);
    }

    #[test]
    fn test_zero_entries_skipped() {
        let mut b = SparseBuilder::new(4, 4);
        b.push(1, 1, 0.0);
        assert_eq!(b.nnz(), 0);
    }
}
