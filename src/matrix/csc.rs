//! Compressed-sparse-column storage payload
//!
//! The sparse kind carries the representation mode: `factors: None` is
//! the explicit matrix, `factors: Some(..)` the factored inverse. The
//! explicit arrays are never destroyed by factoring, only re-tagged, so
//! toggling back is free.

use crate::error::{Error, Result};
use crate::kernel::{sparse, sparse_lu};
use crate::matrix::dense::DenseData;

pub(crate) use crate::kernel::sparse_lu::LuFactors;

/// Compressed-column payload.
#[derive(Debug, Clone)]
pub(crate) struct CscData {
    pub m: usize,
    pub n: usize,
    pub col_ptrs: Vec<usize>,
    pub row_indices: Vec<usize>,
    pub values: Vec<f64>,
    /// `Some` while this matrix represents the inverse operator backed
    /// by its LU factorization
    pub factors: Option<LuFactors>,
}

impl CscData {
    pub fn eff_dims(&self, trans: bool) -> (usize, usize) {
        if trans {
            (self.n, self.m)
        } else {
            (self.m, self.n)
        }
    }

    pub fn is_factored(&self) -> bool {
        self.factors.is_some()
    }

    /// Expand the explicit values to dense column-major storage.
    pub fn to_dense(&self) -> DenseData {
        DenseData {
            m: self.m,
            n: self.n,
            values: sparse::to_dense(self.m, self.n, &self.col_ptrs, &self.row_indices, &self.values),
        }
    }

    /// Materialize the transpose via the sparse transpose kernel.
    ///
    /// The factorization does not carry over; the caller refactors when
    /// the source was a factored inverse.
    pub fn transpose_copy(&self) -> CscData {
        let (p, i, x) = sparse::transpose(self.m, self.n, &self.col_ptrs, &self.row_indices, &self.values);
        CscData {
            m: self.n,
            n: self.m,
            col_ptrs: p,
            row_indices: i,
            values: x,
            factors: None,
        }
    }

    /// Toggle Explicit <-> FactoredInverse.
    ///
    /// Factoring failure leaves the matrix in Explicit mode untouched.
    pub fn toggle_invert(&mut self) -> Result<()> {
        if self.m != self.n {
            return Err(Error::ShapeMismatch {
                expected: [self.m, self.m],
                got: [self.m, self.n],
            });
        }
        match self.factors.take() {
            Some(_) => Ok(()),
            None => {
                let f = sparse_lu::factor(self.n, &self.col_ptrs, &self.row_indices, &self.values)?;
                self.factors = Some(f);
                Ok(())
            }
        }
    }

    /// Re-derive the factorization (used when copying a factored matrix).
    pub fn refactor(&mut self) -> Result<()> {
        let f = sparse_lu::factor(self.n, &self.col_ptrs, &self.row_indices, &self.values)?;
        self.factors = Some(f);
        Ok(())
    }
}

/// Sparse same-kind add; transposed operands are materialized first
/// because the sparse kernel has no strided access.
pub(crate) fn add(
    alpha: f64,
    a: &CscData,
    at: bool,
    beta: f64,
    b: &CscData,
    bt: bool,
) -> CscData {
    let ta;
    let a = if at {
        ta = a.transpose_copy();
        &ta
    } else {
        a
    };
    let tb;
    let b = if bt {
        tb = b.transpose_copy();
        &tb
    } else {
        b
    };

    let (p, i, x) = sparse::add(
        a.m,
        a.n,
        &a.col_ptrs,
        &a.row_indices,
        &a.values,
        &b.col_ptrs,
        &b.row_indices,
        &b.values,
        alpha,
        beta,
    );
    CscData {
        m: a.m,
        n: a.n,
        col_ptrs: p,
        row_indices: i,
        values: x,
        factors: None,
    }
}

/// Sparse same-kind multiply `alpha * op(A) * op(B)`.
pub(crate) fn matmat(alpha: f64, a: &CscData, at: bool, b: &CscData, bt: bool) -> CscData {
    let ta;
    let a = if at {
        ta = a.transpose_copy();
        &ta
    } else {
        a
    };
    let tb;
    let b = if bt {
        tb = b.transpose_copy();
        &tb
    } else {
        b
    };

    let (p, i, mut x) = sparse::multiply(
        a.m,
        b.n,
        &a.col_ptrs,
        &a.row_indices,
        &a.values,
        &b.col_ptrs,
        &b.row_indices,
        &b.values,
    );
    if alpha != 1.0 {
        for v in x.iter_mut() {
            *v *= alpha;
        }
    }
    CscData {
        m: a.m,
        n: b.n,
        col_ptrs: p,
        row_indices: i,
        values: x,
        factors: None,
    }
}

/// Explicit sparse matrix-vector product `y = alpha * op(A) * x + beta * y`.
pub(crate) fn matvec_into(alpha: f64, a: &CscData, at: bool, x: &[f64], beta: f64, y: &mut [f64]) {
    if at {
        for (col, yj) in y.iter_mut().enumerate().take(a.n) {
            let mut acc = 0.0;
            for idx in a.col_ptrs[col]..a.col_ptrs[col + 1] {
                acc += a.values[idx] * x[a.row_indices[idx]];
            }
            *yj = alpha * acc + beta * *yj;
        }
    } else {
        for yi in y.iter_mut().take(a.m) {
            *yi *= beta;
        }
        for col in 0..a.n {
            let xj = alpha * x[col];
            if xj != 0.0 {
                for idx in a.col_ptrs[col]..a.col_ptrs[col + 1] {
                    y[a.row_indices[idx]] += a.values[idx] * xj;
                }
            }
        }
    }
}
