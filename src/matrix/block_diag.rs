//! Block-diagonal storage payload and its same-kind operations
//!
//! A block-diagonal matrix is square, described by cumulative block row
//! boundaries (`bounds`) and cumulative value offsets (`offsets`), with
//! each block stored contiguously in column-major order. Binary
//! operations require identical block structure on both operands.

use crate::error::Result;
use crate::kernel::{dense, jacobi};
use crate::matrix::dense::DenseData;

/// Block-diagonal payload.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BlockDiagData {
    /// Cumulative block row boundaries, length `nb + 1`
    pub bounds: Vec<usize>,
    /// Cumulative value offsets, length `nb + 1`
    pub offsets: Vec<usize>,
    pub values: Vec<f64>,
}

impl BlockDiagData {
    pub fn zeros(sizes: &[usize]) -> Self {
        let mut bounds = Vec::with_capacity(sizes.len() + 1);
        let mut offsets = Vec::with_capacity(sizes.len() + 1);
        bounds.push(0);
        offsets.push(0);
        for &s in sizes {
            bounds.push(bounds.last().unwrap() + s);
            offsets.push(offsets.last().unwrap() + s * s);
        }
        let total = *offsets.last().unwrap();
        Self {
            bounds,
            offsets,
            values: vec![0.0; total],
        }
    }

    pub fn dim(&self) -> usize {
        *self.bounds.last().unwrap()
    }

    pub fn as_ref(&self) -> BdRef<'_> {
        BdRef {
            bounds: &self.bounds,
            offsets: &self.offsets,
            values: &self.values,
            row0: 0,
            off0: 0,
        }
    }

    /// Borrow the contiguous block range `from..=to`, rebased so block
    /// and value indices start at zero.
    pub fn range_ref(&self, from: usize, to: usize) -> BdRef<'_> {
        BdRef {
            bounds: &self.bounds[from..=to + 1],
            offsets: &self.offsets[from..=to + 1],
            values: &self.values[self.offsets[from]..self.offsets[to + 1]],
            row0: self.bounds[from],
            off0: self.offsets[from],
        }
    }
}

/// Borrowed block range of a block-diagonal payload.
///
/// A full matrix is the range over all blocks; a sub-block view narrows
/// `bounds`/`offsets` and rebases indices with `row0`/`off0` so every
/// per-block routine works on either without copying.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BdRef<'a> {
    pub bounds: &'a [usize],
    pub offsets: &'a [usize],
    pub values: &'a [f64],
    pub row0: usize,
    pub off0: usize,
}

impl<'a> BdRef<'a> {
    pub fn nb(&self) -> usize {
        self.bounds.len() - 1
    }

    pub fn dim(&self) -> usize {
        self.bounds[self.nb()] - self.row0
    }

    pub fn block_size(&self, k: usize) -> usize {
        self.bounds[k + 1] - self.bounds[k]
    }

    /// Row offset of block `k` within this range
    pub fn block_row(&self, k: usize) -> usize {
        self.bounds[k] - self.row0
    }

    pub fn block_values(&self, k: usize) -> &'a [f64] {
        &self.values[self.offsets[k] - self.off0..self.offsets[k + 1] - self.off0]
    }

    pub fn value_len(&self) -> usize {
        self.offsets[self.nb()] - self.off0
    }

    /// Block sizes of this range, for allocating a structural twin
    pub fn sizes(&self) -> Vec<usize> {
        (0..self.nb()).map(|k| self.block_size(k)).collect()
    }

    pub fn largest_block(&self) -> usize {
        (0..self.nb()).map(|k| self.block_size(k)).max().unwrap_or(0)
    }
}

/// Identical block boundary check for binary operations.
pub(crate) fn same_structure(a: &BdRef<'_>, b: &BdRef<'_>) -> bool {
    a.nb() == b.nb() && (0..a.nb()).all(|k| a.block_size(k) == b.block_size(k))
}

/// `C = alpha * op(A) + beta * op(B)`, block-wise; a block-diagonal
/// transpose is a per-block transpose.
pub(crate) fn add_into(
    alpha: f64,
    a: &BdRef<'_>,
    at: bool,
    beta: f64,
    b: &BdRef<'_>,
    bt: bool,
    c: &mut BlockDiagData,
) {
    for k in 0..a.nb() {
        let s = a.block_size(k);
        let av = a.block_values(k);
        let bv = b.block_values(k);
        let cv = &mut c.values[c.offsets[k]..c.offsets[k + 1]];
        for j in 0..s {
            for i in 0..s {
                let ax = if at { av[j + i * s] } else { av[i + j * s] };
                let bx = if bt { bv[j + i * s] } else { bv[i + j * s] };
                cv[i + j * s] = alpha * ax + beta * bx;
            }
        }
    }
}

/// `C = alpha * op(A) * op(B) + beta * C`, one gemm per block.
pub(crate) fn matmat_into(
    alpha: f64,
    a: &BdRef<'_>,
    at: bool,
    b: &BdRef<'_>,
    bt: bool,
    beta: f64,
    c: &mut BlockDiagData,
) {
    for k in 0..a.nb() {
        let s = a.block_size(k);
        let cv = &mut c.values[c.offsets[k]..c.offsets[k + 1]];
        dense::gemm(
            at,
            bt,
            s,
            s,
            s,
            alpha,
            a.block_values(k),
            s,
            b.block_values(k),
            s,
            beta,
            cv,
            s,
        );
    }
}

/// Per-block matrix-vector product `y = alpha * op(A) * x + beta * y`.
pub(crate) fn matvec_into(
    alpha: f64,
    a: &BdRef<'_>,
    at: bool,
    x: &[f64],
    beta: f64,
    y: &mut [f64],
) {
    for k in 0..a.nb() {
        let s = a.block_size(k);
        let r = a.block_row(k);
        dense::gemv(
            at,
            s,
            s,
            alpha,
            a.block_values(k),
            s,
            &x[r..r + s],
            beta,
            &mut y[r..r + s],
        );
    }
}

/// Materialize the per-block transpose as a fresh payload.
pub(crate) fn transpose_copy(a: &BdRef<'_>) -> BlockDiagData {
    let mut b = BlockDiagData::zeros(&a.sizes());
    for k in 0..a.nb() {
        let s = a.block_size(k);
        let av = a.block_values(k);
        let bv = &mut b.values[b.offsets[k]..b.offsets[k + 1]];
        for j in 0..s {
            for i in 0..s {
                bv[j + i * s] = av[i + j * s];
            }
        }
    }
    b
}

/// Copy the referenced block range into an owned payload.
pub(crate) fn to_owned(a: &BdRef<'_>) -> BlockDiagData {
    let mut b = BlockDiagData::zeros(&a.sizes());
    b.values.copy_from_slice(&a.values[..a.value_len()]);
    b
}

/// Expand into a dense payload, off-block entries zero.
pub(crate) fn to_dense(a: &BdRef<'_>) -> DenseData {
    let n = a.dim();
    let mut d = DenseData::zeros(n, n);
    for k in 0..a.nb() {
        let s = a.block_size(k);
        let r = a.block_row(k);
        let av = a.block_values(k);
        for j in 0..s {
            for i in 0..s {
                d.values[(r + i) + (r + j) * n] = av[i + j * s];
            }
        }
    }
    d
}

/// Invert every block independently, reusing one workspace sized by the
/// largest block. Any singular block aborts the whole inversion.
pub(crate) fn invert(a: &BdRef<'_>) -> Result<BlockDiagData> {
    let smax = a.largest_block();
    let mut lu = vec![0.0f64; smax * smax];
    let mut piv = vec![0usize; smax];
    let mut work = vec![0.0f64; smax];

    let mut out = BlockDiagData::zeros(&a.sizes());
    for k in 0..a.nb() {
        let s = a.block_size(k);
        lu[..s * s].copy_from_slice(a.block_values(k));
        dense::lu_factor(s, &mut lu[..s * s], &mut piv[..s])?;
        let ov = &mut out.values[out.offsets[k]..out.offsets[k + 1]];
        dense::lu_invert(s, &lu[..s * s], &piv[..s], ov, &mut work[..s]);
    }
    Ok(out)
}

/// Eigenpair collected from one block before the global merge.
struct EigPair {
    value: f64,
    /// Row offset of the source block
    row: usize,
    /// Source block size
    len: usize,
    /// Start of the eigenvector within the block vector storage
    shift: usize,
}

/// Block-wise symmetric eigendecomposition merged into one ascending
/// spectrum; eigenvectors are scattered at their source-block row offset.
pub(crate) fn eigen(
    a: &BdRef<'_>,
    first: usize,
    last: usize,
    vals: &mut [f64],
    mut vecs: Option<&mut DenseData>,
) -> Result<()> {
    let n = a.dim();
    let smax = a.largest_block();
    let mut work = vec![0.0f64; smax * smax];

    // Per-block vectors live in a structural twin of the value array;
    // eigenvalues in one flat buffer
    let mut vstore = to_owned(a);
    let mut all_vals = vec![0.0f64; n];

    for k in 0..a.nb() {
        let s = a.block_size(k);
        let r = a.block_row(k);
        work[..s * s].copy_from_slice(a.block_values(k));
        let vv = &mut vstore.values[vstore.offsets[k]..vstore.offsets[k + 1]];
        jacobi::sym_eigen(s, &mut work[..s * s], &mut all_vals[r..r + s], vv)?;
    }

    // Merge the per-block spectra globally
    let mut pairs: Vec<EigPair> = Vec::with_capacity(n);
    for k in 0..a.nb() {
        let s = a.block_size(k);
        let r = a.block_row(k);
        for j in 0..s {
            pairs.push(EigPair {
                value: all_vals[r + j],
                row: r,
                len: s,
                shift: vstore.offsets[k] + j * s,
            });
        }
    }
    pairs.sort_by(|x, y| x.value.partial_cmp(&y.value).unwrap_or(std::cmp::Ordering::Equal));

    if let Some(vec_out) = vecs.as_deref_mut() {
        vec_out.values.fill(0.0);
    }
    for (dst, pair) in pairs[first..last].iter().enumerate() {
        vals[dst] = pair.value;
        if let Some(vec_out) = vecs.as_deref_mut() {
            let col = &mut vec_out.values[dst * n + pair.row..dst * n + pair.row + pair.len];
            col.copy_from_slice(&vstore.values[pair.shift..pair.shift + pair.len]);
        }
    }
    Ok(())
}
