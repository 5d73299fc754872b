//! Common test utilities
#![allow(dead_code)]

use mxr::prelude::*;

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Collect a matrix into a column-major value vector, implicit zeros
/// included, regardless of storage kind.
pub fn dense_values(a: &Matrix) -> Vec<f64> {
    let (m, n) = (a.rows(), a.cols());
    let mut out = Vec::with_capacity(m * n);
    for j in 0..n {
        for i in 0..m {
            out.push(a.get(i, j));
        }
    }
    out
}

/// Build a sparse matrix holding the nonzeros of a column-major dense array.
pub fn csc_from_dense(m: usize, n: usize, vals: &[f64]) -> Matrix {
    let mut col_ptrs = vec![0usize];
    let mut row_indices = Vec::new();
    let mut values = Vec::new();
    for j in 0..n {
        for i in 0..m {
            let v = vals[i + j * m];
            if v != 0.0 {
                row_indices.push(i);
                values.push(v);
            }
        }
        col_ptrs.push(values.len());
    }
    Matrix::csc_from(m, n, col_ptrs, row_indices, values).unwrap()
}
