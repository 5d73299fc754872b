//! Dense numeric primitives: gemm, gemv, LU factorization and inversion
//!
//! All matrices are column-major `f64` slices. `gemm`/`gemv` take explicit
//! leading dimensions so diagonal-block panels can alias a larger value
//! array without copying.

use crate::error::{Error, Result};

/// Pivot magnitudes below this are treated as singular.
pub const MIN_PIVOT: f64 = 1e-13;

/// General matrix-matrix product: `C = alpha * op(A) * op(B) + beta * C`
///
/// `m`, `n`, `k` are the dimensions of `op(A)` (m x k), `op(B)` (k x n)
/// and `C` (m x n). `lda`/`ldb`/`ldc` are leading dimensions of the
/// underlying arrays.
#[allow(clippy::too_many_arguments)]
pub fn gemm(
    transa: bool,
    transb: bool,
    m: usize,
    n: usize,
    k: usize,
    alpha: f64,
    a: &[f64],
    lda: usize,
    b: &[f64],
    ldb: usize,
    beta: f64,
    c: &mut [f64],
    ldc: usize,
) {
    for j in 0..n {
        for i in 0..m {
            let mut acc = 0.0;
            for l in 0..k {
                let av = if transa { a[l + i * lda] } else { a[i + l * lda] };
                let bv = if transb { b[j + l * ldb] } else { b[l + j * ldb] };
                acc += av * bv;
            }
            let dst = &mut c[i + j * ldc];
            *dst = alpha * acc + beta * *dst;
        }
    }
}

/// Matrix-vector product: `y = alpha * op(A) * x + beta * y`
///
/// `m`, `n` are the dimensions of `A` itself (not `op(A)`).
#[allow(clippy::too_many_arguments)]
pub fn gemv(
    trans: bool,
    m: usize,
    n: usize,
    alpha: f64,
    a: &[f64],
    lda: usize,
    x: &[f64],
    beta: f64,
    y: &mut [f64],
) {
    if trans {
        for j in 0..n {
            let mut acc = 0.0;
            for i in 0..m {
                acc += a[i + j * lda] * x[i];
            }
            y[j] = alpha * acc + beta * y[j];
        }
    } else {
        for yi in y.iter_mut().take(m) {
            *yi *= beta;
        }
        for j in 0..n {
            let xj = alpha * x[j];
            for i in 0..m {
                y[i] += a[i + j * lda] * xj;
            }
        }
    }
}

/// LU factorization with partial pivoting, in place.
///
/// On success `a` holds the packed L (unit lower) and U factors and
/// `piv[k]` records the row swapped with row `k` at step `k`.
pub fn lu_factor(n: usize, a: &mut [f64], piv: &mut [usize]) -> Result<()> {
    for col in 0..n {
        // Pivot search in the current column
        let mut pivot_row = col;
        let mut max_val = a[col + col * n].abs();
        for row in (col + 1)..n {
            let val = a[row + col * n].abs();
            if val > max_val {
                max_val = val;
                pivot_row = row;
            }
        }
        piv[col] = pivot_row;

        if pivot_row != col {
            for j in 0..n {
                a.swap(col + j * n, pivot_row + j * n);
            }
        }

        let pivot = a[col + col * n];
        if pivot.abs() < MIN_PIVOT {
            return Err(Error::Singular { col });
        }

        for row in (col + 1)..n {
            a[row + col * n] /= pivot;
        }
        for j in (col + 1)..n {
            let ucj = a[col + j * n];
            if ucj != 0.0 {
                for row in (col + 1)..n {
                    a[row + j * n] -= a[row + col * n] * ucj;
                }
            }
        }
    }
    Ok(())
}

/// Explicit inverse from packed LU factors.
///
/// Solves `A x = e_j` for every unit vector, writing column `j` of the
/// inverse into `out`. `work` must have length `n`.
pub fn lu_invert(n: usize, lu: &[f64], piv: &[usize], out: &mut [f64], work: &mut [f64]) {
    for j in 0..n {
        work.fill(0.0);
        work[j] = 1.0;

        // Apply recorded row swaps in factorization order
        for (k, &p) in piv.iter().enumerate().take(n) {
            if p != k {
                work.swap(k, p);
            }
        }

        // Forward substitution with unit lower factor
        for k in 0..n {
            let wk = work[k];
            if wk != 0.0 {
                for i in (k + 1)..n {
                    work[i] -= lu[i + k * n] * wk;
                }
            }
        }

        // Backward substitution with upper factor
        for k in (0..n).rev() {
            work[k] /= lu[k + k * n];
            let wk = work[k];
            if wk != 0.0 {
                for i in 0..k {
                    work[i] -= lu[i + k * n] * wk;
                }
            }
        }

        out[j * n..(j + 1) * n].copy_from_slice(work);
    }
}
