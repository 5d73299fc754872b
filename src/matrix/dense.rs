//! Dense storage payload and its same-kind operations

use crate::error::Result;
use crate::kernel::{dense, jacobi};

/// Column-major dense payload.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DenseData {
    pub m: usize,
    pub n: usize,
    pub values: Vec<f64>,
}

impl DenseData {
    pub fn zeros(m: usize, n: usize) -> Self {
        Self {
            m,
            n,
            values: vec![0.0; m * n],
        }
    }

    /// Logical dimensions after an optional transpose.
    pub fn eff_dims(&self, trans: bool) -> (usize, usize) {
        if trans {
            (self.n, self.m)
        } else {
            (self.m, self.n)
        }
    }
}

/// `C = alpha * op(A) + beta * op(B)`, dimensions validated by the caller.
///
/// One index loop covers all four transpose sub-cases.
pub(crate) fn add_into(
    alpha: f64,
    a: &DenseData,
    at: bool,
    beta: f64,
    b: &DenseData,
    bt: bool,
    c: &mut DenseData,
) {
    let (m, n) = (c.m, c.n);
    for j in 0..n {
        for i in 0..m {
            let av = if at {
                a.values[j + i * a.m]
            } else {
                a.values[i + j * a.m]
            };
            let bv = if bt {
                b.values[j + i * b.m]
            } else {
                b.values[i + j * b.m]
            };
            c.values[i + j * m] = alpha * av + beta * bv;
        }
    }
}

/// `C = alpha * op(A) * op(B) + beta * C` via the gemm kernel.
pub(crate) fn matmat_into(
    alpha: f64,
    a: &DenseData,
    at: bool,
    b: &DenseData,
    bt: bool,
    beta: f64,
    c: &mut DenseData,
) {
    let (m, k) = a.eff_dims(at);
    let (_, n) = b.eff_dims(bt);
    dense::gemm(
        at, bt, m, n, k, alpha, &a.values, a.m, &b.values, b.m, beta, &mut c.values, c.m,
    );
}

/// Materialize the transpose as a fresh payload (index-permuted copy).
pub(crate) fn transpose_copy(a: &DenseData) -> DenseData {
    let mut b = DenseData::zeros(a.n, a.m);
    for j in 0..a.n {
        for i in 0..a.m {
            b.values[j + i * a.n] = a.values[i + j * a.m];
        }
    }
    b
}

/// Explicit inverse: LU factorization then inversion from the factors.
pub(crate) fn invert(a: &DenseData) -> Result<DenseData> {
    let n = a.n;
    let mut lu = a.values.clone();
    let mut piv = vec![0usize; n];
    dense::lu_factor(n, &mut lu, &mut piv)?;

    let mut out = DenseData::zeros(n, n);
    let mut work = vec![0.0f64; n];
    dense::lu_invert(n, &lu, &piv, &mut out.values, &mut work);
    Ok(out)
}

/// Symmetric eigendecomposition restricted to a contiguous spectral range.
///
/// `first..last` indexes the ascending full spectrum; the input is
/// copied so the matrix itself is never modified.
pub(crate) fn eigen(
    a: &DenseData,
    first: usize,
    last: usize,
    vals: &mut [f64],
    vecs: Option<&mut DenseData>,
) -> Result<()> {
    let n = a.n;
    let mut work = a.values.clone();
    let mut v = vec![0.0f64; n * n];
    let mut full = vec![0.0f64; n];
    jacobi::sym_eigen(n, &mut work, &mut full, &mut v)?;

    vals[..last - first].copy_from_slice(&full[first..last]);
    if let Some(vec_out) = vecs {
        for (dst, src) in (first..last).enumerate() {
            vec_out.values[dst * n..(dst + 1) * n].copy_from_slice(&v[src * n..(src + 1) * n]);
        }
    }
    Ok(())
}
