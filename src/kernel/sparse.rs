//! Compressed-sparse-column primitives: transpose, add, multiply, expand
//!
//! All routines work on raw CSC triplets `(col_ptrs, row_indices, values)`
//! with row indices sorted within each column, and produce the same.

/// Raw CSC arrays produced by the kernels below.
pub type CscParts = (Vec<usize>, Vec<usize>, Vec<f64>);

/// Transpose an `m x n` CSC matrix via counting sort.
///
/// The result is the `n x m` CSC transpose with naturally sorted rows.
pub fn transpose(m: usize, n: usize, p: &[usize], i: &[usize], x: &[f64]) -> CscParts {
    let nnz = x.len();
    let mut tp = vec![0usize; m + 1];
    for &row in i.iter().take(nnz) {
        tp[row + 1] += 1;
    }
    for k in 0..m {
        tp[k + 1] += tp[k];
    }

    let mut next = tp.clone();
    let mut ti = vec![0usize; nnz];
    let mut tx = vec![0.0f64; nnz];
    for col in 0..n {
        for idx in p[col]..p[col + 1] {
            let row = i[idx];
            let dst = next[row];
            next[row] += 1;
            ti[dst] = col;
            tx[dst] = x[idx];
        }
    }
    (tp, ti, tx)
}

/// Sparse add: `C = alpha * A + beta * B` for same-shape CSC operands.
#[allow(clippy::too_many_arguments)]
pub fn add(
    m: usize,
    n: usize,
    ap: &[usize],
    ai: &[usize],
    ax: &[f64],
    bp: &[usize],
    bi: &[usize],
    bx: &[f64],
    alpha: f64,
    beta: f64,
) -> CscParts {
    let mut cp = vec![0usize; n + 1];
    let mut ci = Vec::with_capacity(ax.len() + bx.len());
    let mut cx = Vec::with_capacity(ax.len() + bx.len());

    let mut work = vec![0.0f64; m];
    let mut mark = vec![usize::MAX; m];
    let mut pattern: Vec<usize> = Vec::with_capacity(m);

    for col in 0..n {
        pattern.clear();
        for idx in ap[col]..ap[col + 1] {
            let row = ai[idx];
            if mark[row] != col {
                mark[row] = col;
                work[row] = 0.0;
                pattern.push(row);
            }
            work[row] += alpha * ax[idx];
        }
        for idx in bp[col]..bp[col + 1] {
            let row = bi[idx];
            if mark[row] != col {
                mark[row] = col;
                work[row] = 0.0;
                pattern.push(row);
            }
            work[row] += beta * bx[idx];
        }
        pattern.sort_unstable();
        for &row in &pattern {
            ci.push(row);
            cx.push(work[row]);
        }
        cp[col + 1] = ci.len();
    }
    (cp, ci, cx)
}

/// Sparse multiply: `C = A * B` where `A` is `m x k` and `B` is `k x n`.
#[allow(clippy::too_many_arguments)]
pub fn multiply(
    m: usize,
    n: usize,
    ap: &[usize],
    ai: &[usize],
    ax: &[f64],
    bp: &[usize],
    bi: &[usize],
    bx: &[f64],
) -> CscParts {
    let mut cp = vec![0usize; n + 1];
    let mut ci = Vec::new();
    let mut cx = Vec::new();

    let mut work = vec![0.0f64; m];
    let mut mark = vec![usize::MAX; m];
    let mut pattern: Vec<usize> = Vec::with_capacity(m);

    for col in 0..n {
        pattern.clear();
        for idx in bp[col]..bp[col + 1] {
            let l = bi[idx];
            let bv = bx[idx];
            for aidx in ap[l]..ap[l + 1] {
                let row = ai[aidx];
                if mark[row] != col {
                    mark[row] = col;
                    work[row] = 0.0;
                    pattern.push(row);
                }
                work[row] += ax[aidx] * bv;
            }
        }
        pattern.sort_unstable();
        for &row in &pattern {
            ci.push(row);
            cx.push(work[row]);
        }
        cp[col + 1] = ci.len();
    }
    (cp, ci, cx)
}

/// Expand an `m x n` CSC matrix into a column-major dense array.
pub fn to_dense(m: usize, n: usize, p: &[usize], i: &[usize], x: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0f64; m * n];
    for col in 0..n {
        for idx in p[col]..p[col + 1] {
            out[i[idx] + col * m] = x[idx];
        }
    }
    out
}
