//! Sparse LU factorization and permuted triangular solves
//!
//! Left-looking Gilbert-Peierls LU with partial pivoting over a
//! fill-reducing column ordering. The factors back the factored-inverse
//! representation of sparse matrices: applying the inverse means
//! permute, L-solve, U-solve, un-permute, never forming inverse entries.

use std::cell::RefCell;

use super::dense::MIN_PIVOT;
use crate::error::{Error, Result};

/// Symbolic and numeric LU state for a factored sparse matrix.
///
/// `L` is unit lower triangular (diagonal implicit) and `U` upper
/// triangular with the diagonal stored last in each column. Row indices
/// of both factors live in pivot-position space. `work` is the solve
/// scratch released together with the factorization.
#[derive(Debug, Clone)]
pub struct LuFactors {
    /// Fill-reducing column order: pivot column `k` factors `A[:, col_perm[k]]`
    pub col_perm: Vec<usize>,
    /// Pivot rows: position `k` holds original row `row_perm[k]`
    pub row_perm: Vec<usize>,
    l_col_ptrs: Vec<usize>,
    l_row_indices: Vec<usize>,
    l_values: Vec<f64>,
    u_col_ptrs: Vec<usize>,
    u_row_indices: Vec<usize>,
    u_values: Vec<f64>,
    work: RefCell<Vec<f64>>,
}

impl LuFactors {
    /// Matrix dimension
    pub fn dim(&self) -> usize {
        self.row_perm.len()
    }

    /// Stored nonzeros in both factors
    pub fn factor_nnz(&self) -> usize {
        self.l_values.len() + self.u_values.len()
    }
}

/// Fill-reducing column ordering: ascending column nonzero count.
///
/// This is the initial-score stage of column minimum-degree orderings;
/// cheap columns are pivoted early, which bounds fill for the
/// arrow/banded patterns stiffness assembly produces.
pub fn min_degree_order(n: usize, col_ptrs: &[usize]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&j| (col_ptrs[j + 1] - col_ptrs[j], j));
    order
}

/// Factor an `n x n` CSC matrix into permuted LU form.
///
/// Fails with [`Error::Singular`] when no usable pivot exists in some
/// column; the caller's matrix is left untouched in that case.
pub fn factor(n: usize, col_ptrs: &[usize], row_indices: &[usize], values: &[f64]) -> Result<LuFactors> {
    let col_perm = min_degree_order(n, col_ptrs);

    let mut row_perm: Vec<usize> = vec![usize::MAX; n];
    // Original row -> pivot position, usize::MAX while unassigned
    let mut pos_of_row: Vec<usize> = vec![usize::MAX; n];

    let mut l_col_ptrs = vec![0usize; n + 1];
    let mut l_rows_orig: Vec<usize> = Vec::new();
    let mut l_values: Vec<f64> = Vec::new();

    let mut u_col_ptrs = vec![0usize; n + 1];
    let mut u_row_indices: Vec<usize> = Vec::new();
    let mut u_values: Vec<f64> = Vec::new();

    // Dense work vector indexed by original row
    let mut work = vec![0.0f64; n];

    for k in 0..n {
        // Scatter column col_perm[k] of A
        let acol = col_perm[k];
        for idx in col_ptrs[acol]..col_ptrs[acol + 1] {
            work[row_indices[idx]] = values[idx];
        }

        // Left-looking update: apply every earlier pivot column in order
        for j in 0..k {
            let xj = work[row_perm[j]];
            if xj != 0.0 {
                for idx in l_col_ptrs[j]..l_col_ptrs[j + 1] {
                    work[l_rows_orig[idx]] -= l_values[idx] * xj;
                }
            }
        }

        // Upper part: entries in already-pivoted rows, ascending position
        for j in 0..k {
            let val = work[row_perm[j]];
            if val != 0.0 {
                u_row_indices.push(j);
                u_values.push(val);
                work[row_perm[j]] = 0.0;
            }
        }

        // Partial pivoting over the rows still unassigned
        let mut pivot_row = usize::MAX;
        let mut pivot_abs = 0.0f64;
        for (row, &pos) in pos_of_row.iter().enumerate() {
            if pos == usize::MAX {
                let mag = work[row].abs();
                if mag > pivot_abs {
                    pivot_abs = mag;
                    pivot_row = row;
                }
            }
        }
        if pivot_abs < MIN_PIVOT {
            return Err(Error::Singular { col: acol });
        }

        let pivot = work[pivot_row];
        row_perm[k] = pivot_row;
        pos_of_row[pivot_row] = k;
        work[pivot_row] = 0.0;

        // Diagonal of U stored last in its column
        u_row_indices.push(k);
        u_values.push(pivot);
        u_col_ptrs[k + 1] = u_values.len();

        // Lower part, scaled by the pivot, rows still in original indices
        let inv_pivot = 1.0 / pivot;
        for (row, &pos) in pos_of_row.iter().enumerate() {
            if pos == usize::MAX && work[row] != 0.0 {
                l_rows_orig.push(row);
                l_values.push(work[row] * inv_pivot);
            }
        }
        l_col_ptrs[k + 1] = l_values.len();

        for (row, &pos) in pos_of_row.iter().enumerate() {
            if pos == usize::MAX {
                work[row] = 0.0;
            }
        }
    }

    // Renumber L rows from original indices into pivot positions
    let l_row_indices: Vec<usize> = l_rows_orig.iter().map(|&r| pos_of_row[r]).collect();

    Ok(LuFactors {
        col_perm,
        row_perm,
        l_col_ptrs,
        l_row_indices,
        l_values,
        u_col_ptrs,
        u_row_indices,
        u_values,
        work: RefCell::new(vec![0.0f64; n]),
    })
}

/// Solve `A x = b` through the factors: permute, L-solve, U-solve, un-permute.
pub fn solve(f: &LuFactors, b: &[f64], out: &mut [f64]) {
    let n = f.dim();
    let mut ws = f.work.borrow_mut();
    let x = &mut ws[..n];

    for k in 0..n {
        x[k] = b[f.row_perm[k]];
    }

    // L x = b', unit diagonal
    for j in 0..n {
        let xj = x[j];
        if xj != 0.0 {
            for idx in f.l_col_ptrs[j]..f.l_col_ptrs[j + 1] {
                x[f.l_row_indices[idx]] -= f.l_values[idx] * xj;
            }
        }
    }

    // U x = x, diagonal stored last per column
    for j in (0..n).rev() {
        let end = f.u_col_ptrs[j + 1];
        x[j] /= f.u_values[end - 1];
        let xj = x[j];
        if xj != 0.0 {
            for idx in f.u_col_ptrs[j]..end - 1 {
                x[f.u_row_indices[idx]] -= f.u_values[idx] * xj;
            }
        }
    }

    for k in 0..n {
        out[f.col_perm[k]] = x[k];
    }
}

/// Solve `A^T x = b`: un-permute, `U^T`-solve, `L^T`-solve, permute.
pub fn solve_transpose(f: &LuFactors, b: &[f64], out: &mut [f64]) {
    let n = f.dim();
    let mut ws = f.work.borrow_mut();
    let x = &mut ws[..n];

    for k in 0..n {
        x[k] = b[f.col_perm[k]];
    }

    // U^T x = b', forward over columns of U
    for j in 0..n {
        let end = f.u_col_ptrs[j + 1];
        let mut acc = x[j];
        for idx in f.u_col_ptrs[j]..end - 1 {
            acc -= f.u_values[idx] * x[f.u_row_indices[idx]];
        }
        x[j] = acc / f.u_values[end - 1];
    }

    // L^T x = x, backward, unit diagonal
    for j in (0..n).rev() {
        let mut acc = x[j];
        for idx in f.l_col_ptrs[j]..f.l_col_ptrs[j + 1] {
            acc -= f.l_values[idx] * x[f.l_row_indices[idx]];
        }
        x[j] = acc;
    }

    for k in 0..n {
        out[f.row_perm[k]] = x[k];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::sparse::to_dense;

    // [4 1 0]
    // [1 3 0]
    // [2 0 5]
    fn fixture() -> (Vec<usize>, Vec<usize>, Vec<f64>) {
        (
            vec![0, 3, 5, 6],
            vec![0, 1, 2, 0, 1, 2],
            vec![4.0, 1.0, 2.0, 1.0, 3.0, 5.0],
        )
    }

    #[test]
    fn solve_recovers_known_vector() {
        let (p, i, x) = fixture();
        let f = factor(3, &p, &i, &x).unwrap();

        let dense = to_dense(3, 3, &p, &i, &x);
        let truth = [1.0, -2.0, 0.5];
        let mut b = [0.0; 3];
        for col in 0..3 {
            for row in 0..3 {
                b[row] += dense[row + col * 3] * truth[col];
            }
        }

        let mut got = [0.0; 3];
        solve(&f, &b, &mut got);
        for (g, t) in got.iter().zip(truth.iter()) {
            assert!((g - t).abs() < 1e-12);
        }
    }

    #[test]
    fn transpose_solve_recovers_known_vector() {
        let (p, i, x) = fixture();
        let f = factor(3, &p, &i, &x).unwrap();

        let dense = to_dense(3, 3, &p, &i, &x);
        let truth = [-1.0, 3.0, 2.0];
        let mut b = [0.0; 3];
        for col in 0..3 {
            for row in 0..3 {
                // b = A^T * truth
                b[col] += dense[row + col * 3] * truth[row];
            }
        }

        let mut got = [0.0; 3];
        solve_transpose(&f, &b, &mut got);
        for (g, t) in got.iter().zip(truth.iter()) {
            assert!((g - t).abs() < 1e-12);
        }
    }

    #[test]
    fn factors_solve_both_directions_back_to_back() {
        let (p, i, x) = fixture();
        let f = factor(3, &p, &i, &x).unwrap();
        let dense = to_dense(3, 3, &p, &i, &x);
        let b = [1.0, 2.0, 3.0];

        // One shared workspace serves consecutive solves in both
        // directions without cross-talk
        let mut y = [0.0; 3];
        solve(&f, &b, &mut y);
        let mut yt = [0.0; 3];
        solve_transpose(&f, &b, &mut yt);

        let mut ay = [0.0; 3];
        let mut aty = [0.0; 3];
        for col in 0..3 {
            for row in 0..3 {
                ay[row] += dense[row + col * 3] * y[col];
                aty[col] += dense[row + col * 3] * yt[row];
            }
        }
        for k in 0..3 {
            assert!((ay[k] - b[k]).abs() < 1e-12, "A y = b at {}", k);
            assert!((aty[k] - b[k]).abs() < 1e-12, "A^T y = b at {}", k);
        }
    }

    #[test]
    fn structurally_singular_column_fails() {
        // Second column is empty
        let p = vec![0usize, 1, 1, 2];
        let i = vec![0usize, 2];
        let x = vec![1.0, 1.0];
        assert!(matches!(
            factor(3, &p, &i, &x),
            Err(Error::Singular { .. })
        ));
    }
}
