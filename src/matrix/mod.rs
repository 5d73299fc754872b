//! Matrix core: one logical matrix type over three storage kinds
//!
//! A [`Matrix`] owns exactly one storage payload; its kind never changes
//! once created. Transpose and diagonal block ranges are expressed as
//! single-use [`View`] operands, and a sparse matrix can be toggled into
//! a factored-inverse representation by [`Matrix::invert_in_place`].

pub(crate) mod block_diag;
pub(crate) mod csc;
pub(crate) mod dense;
mod ops;
mod view;

pub use ops::{add, add_into, matmat, matmat_into, matvec, trimat};
pub use view::View;

use crate::error::{Error, Result};
use block_diag::BlockDiagData;
use csc::CscData;
use dense::DenseData;

/// Storage kind of a matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// One contiguous column-major value array
    Dense,
    /// Independent square blocks on the diagonal
    BlockDiag,
    /// Compressed sparse column
    Csc,
}

#[derive(Debug, Clone)]
pub(crate) enum Storage {
    Dense(DenseData),
    BlockDiag(BlockDiagData),
    Csc(CscData),
}

/// A dense, block-diagonal or compressed-column matrix of `f64` values.
#[derive(Debug, Clone)]
pub struct Matrix {
    pub(crate) storage: Storage,
}

impl Matrix {
    /// Create a zeroed dense matrix.
    pub fn dense(m: usize, n: usize) -> Result<Self> {
        if m == 0 || n == 0 {
            return Err(Error::InvalidArgument {
                arg: "dims",
                reason: format!("dense matrix must be non-empty, got {}x{}", m, n),
            });
        }
        Ok(Self {
            storage: Storage::Dense(DenseData::zeros(m, n)),
        })
    }

    /// Create a dense matrix from column-major values.
    pub fn dense_from(m: usize, n: usize, values: &[f64]) -> Result<Self> {
        let mut a = Self::dense(m, n)?;
        if values.len() != m * n {
            return Err(Error::InvalidArgument {
                arg: "values",
                reason: format!("expected {} values, got {}", m * n, values.len()),
            });
        }
        if let Storage::Dense(d) = &mut a.storage {
            d.values.copy_from_slice(values);
        }
        Ok(a)
    }

    /// Create a zeroed block-diagonal matrix from block sizes.
    pub fn block_diag(sizes: &[usize]) -> Result<Self> {
        if sizes.is_empty() || sizes.contains(&0) {
            return Err(Error::InvalidArgument {
                arg: "sizes",
                reason: "block sizes must be non-empty and positive".to_string(),
            });
        }
        Ok(Self {
            storage: Storage::BlockDiag(BlockDiagData::zeros(sizes)),
        })
    }

    /// Create a block-diagonal matrix from block sizes and the
    /// concatenated column-major block values.
    pub fn block_diag_from(sizes: &[usize], values: &[f64]) -> Result<Self> {
        let mut a = Self::block_diag(sizes)?;
        if let Storage::BlockDiag(b) = &mut a.storage {
            if values.len() != b.values.len() {
                return Err(Error::InvalidArgument {
                    arg: "values",
                    reason: format!("expected {} values, got {}", b.values.len(), values.len()),
                });
            }
            b.values.copy_from_slice(values);
        }
        Ok(a)
    }

    /// Create a zeroed sparse matrix with the given structure.
    pub fn csc(m: usize, n: usize, col_ptrs: Vec<usize>, row_indices: Vec<usize>) -> Result<Self> {
        validate_csc_structure(m, n, &col_ptrs, &row_indices)?;
        let nnz = col_ptrs[n];
        Ok(Self {
            storage: Storage::Csc(CscData {
                m,
                n,
                col_ptrs,
                row_indices,
                values: vec![0.0; nnz],
                factors: None,
            }),
        })
    }

    /// Create a sparse matrix with structure and values.
    pub fn csc_from(
        m: usize,
        n: usize,
        col_ptrs: Vec<usize>,
        row_indices: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self> {
        validate_csc_structure(m, n, &col_ptrs, &row_indices)?;
        if values.len() != col_ptrs[n] {
            return Err(Error::InvalidArgument {
                arg: "values",
                reason: format!("expected {} values, got {}", col_ptrs[n], values.len()),
            });
        }
        Ok(Self {
            storage: Storage::Csc(CscData {
                m,
                n,
                col_ptrs,
                row_indices,
                values,
                factors: None,
            }),
        })
    }

    /// Storage kind
    pub fn kind(&self) -> Kind {
        match &self.storage {
            Storage::Dense(_) => Kind::Dense,
            Storage::BlockDiag(_) => Kind::BlockDiag,
            Storage::Csc(_) => Kind::Csc,
        }
    }

    /// Logical row count
    pub fn rows(&self) -> usize {
        match &self.storage {
            Storage::Dense(d) => d.m,
            Storage::BlockDiag(b) => b.dim(),
            Storage::Csc(c) => c.m,
        }
    }

    /// Logical column count
    pub fn cols(&self) -> usize {
        match &self.storage {
            Storage::Dense(d) => d.n,
            Storage::BlockDiag(b) => b.dim(),
            Storage::Csc(c) => c.n,
        }
    }

    /// Number of stored values
    pub fn nnz(&self) -> usize {
        match &self.storage {
            Storage::Dense(d) => d.values.len(),
            Storage::BlockDiag(b) => b.values.len(),
            Storage::Csc(c) => c.values.len(),
        }
    }

    /// Whether a sparse matrix currently represents a factored inverse
    pub fn is_factored_inverse(&self) -> bool {
        matches!(&self.storage, Storage::Csc(c) if c.is_factored())
    }

    /// Stored value at `(i, j)`, implicit zeros included.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        match &self.storage {
            Storage::Dense(d) => d.values[i + j * d.m],
            Storage::BlockDiag(b) => {
                let r = b.as_ref();
                for k in 0..r.nb() {
                    let lo = r.block_row(k);
                    let s = r.block_size(k);
                    if i >= lo && i < lo + s {
                        if j >= lo && j < lo + s {
                            return r.block_values(k)[(i - lo) + (j - lo) * s];
                        }
                        return 0.0;
                    }
                }
                0.0
            }
            Storage::Csc(c) => {
                for idx in c.col_ptrs[j]..c.col_ptrs[j + 1] {
                    if c.row_indices[idx] == i {
                        return c.values[idx];
                    }
                }
                0.0
            }
        }
    }

    /// Structural compatibility for result-buffer reuse across
    /// iterations: same kind, dimensions, and block/sparsity structure.
    pub fn same_structure(&self, other: &Matrix) -> bool {
        match (&self.storage, &other.storage) {
            (Storage::Dense(a), Storage::Dense(b)) => a.m == b.m && a.n == b.n,
            (Storage::BlockDiag(a), Storage::BlockDiag(b)) => a.bounds == b.bounds,
            (Storage::Csc(a), Storage::Csc(b)) => {
                a.m == b.m
                    && a.n == b.n
                    && a.col_ptrs == b.col_ptrs
                    && a.row_indices == b.row_indices
            }
            _ => false,
        }
    }

    /// Set every stored value to zero.
    ///
    /// A factored inverse has no zero counterpart, so the factorization
    /// is dropped first and the matrix reverts to explicit mode.
    pub fn zero(&mut self) {
        match &mut self.storage {
            Storage::Dense(d) => d.values.fill(0.0),
            Storage::BlockDiag(b) => b.values.fill(0.0),
            Storage::Csc(c) => {
                c.factors = None;
                c.values.fill(0.0);
            }
        }
    }

    /// Multiply every stored value by `factor`.
    ///
    /// Rejected on a factored inverse: scaling raw factor entries does
    /// not scale the operator the inverse represents. Toggle back to
    /// explicit mode with [`Matrix::invert_in_place`] first.
    pub fn scale(&mut self, factor: f64) -> Result<()> {
        match &mut self.storage {
            Storage::Dense(d) => {
                for v in d.values.iter_mut() {
                    *v *= factor;
                }
            }
            Storage::BlockDiag(b) => {
                for v in b.values.iter_mut() {
                    *v *= factor;
                }
            }
            Storage::Csc(c) => {
                if c.is_factored() {
                    return Err(Error::FactoredOperand { op: "scale" });
                }
                for v in c.values.iter_mut() {
                    *v *= factor;
                }
            }
        }
        Ok(())
    }

    /// Copy this matrix into a structurally compatible buffer.
    ///
    /// Dense buffers may be reshaped; a sparse buffer adopts this
    /// matrix's structure (and factorization state); a block-diagonal
    /// buffer must match exactly.
    pub fn copy_into(&self, dst: &mut Matrix) -> Result<()> {
        match (&self.storage, &mut dst.storage) {
            (Storage::Dense(s), Storage::Dense(d)) => {
                d.m = s.m;
                d.n = s.n;
                d.values.clear();
                d.values.extend_from_slice(&s.values);
                Ok(())
            }
            (Storage::BlockDiag(s), Storage::BlockDiag(d)) => {
                if s.bounds != d.bounds {
                    return Err(Error::StructureMismatch { op: "copy_into" });
                }
                d.values.copy_from_slice(&s.values);
                Ok(())
            }
            (Storage::Csc(s), Storage::Csc(d)) => {
                *d = s.clone();
                Ok(())
            }
            _ => Err(Error::StructureMismatch { op: "copy_into" }),
        }
    }

    /// Plain operand view of this matrix.
    pub fn view(&self) -> View<'_> {
        View::plain(self)
    }

    /// Transposed view, valid for one consuming operation.
    pub fn t(&self) -> View<'_> {
        View::transposed(self)
    }

    /// View of the contiguous block range `from..=to`.
    ///
    /// Only valid on block-diagonal matrices.
    pub fn diag_block(&self, from: usize, to: usize) -> Result<View<'_>> {
        let Storage::BlockDiag(b) = &self.storage else {
            return Err(Error::Unsupported {
                op: "diag_block",
                kind: self.kind(),
            });
        };
        let nb = b.bounds.len() - 1;
        if from > to || to >= nb {
            return Err(Error::InvalidArgument {
                arg: "blocks",
                reason: format!("range {}..={} out of {} blocks", from, to, nb),
            });
        }
        Ok(View::blocks(self, from, to))
    }

    /// Dense rendition of this matrix (the conversion adapter).
    pub fn to_dense(&self) -> Matrix {
        let payload = match &self.storage {
            Storage::Dense(d) => d.clone(),
            Storage::BlockDiag(b) => block_diag::to_dense(&b.as_ref()),
            Storage::Csc(c) => c.to_dense(),
        };
        Matrix {
            storage: Storage::Dense(payload),
        }
    }

    /// Inverse as a new matrix.
    ///
    /// Dense and block-diagonal inverses are explicit. A sparse inverse
    /// is the factored representation; inverting an already factored
    /// sparse matrix returns its explicit values.
    pub fn invert(&self) -> Result<Matrix> {
        match &self.storage {
            Storage::Dense(d) => {
                require_square(d.m, d.n)?;
                Ok(Matrix {
                    storage: Storage::Dense(dense::invert(d)?),
                })
            }
            Storage::BlockDiag(b) => Ok(Matrix {
                storage: Storage::BlockDiag(block_diag::invert(&b.as_ref())?),
            }),
            Storage::Csc(c) => {
                let mut out = c.clone();
                out.factors = None;
                if !c.is_factored() {
                    out.toggle_invert()?;
                }
                Ok(Matrix {
                    storage: Storage::Csc(out),
                })
            }
        }
    }

    /// Invert into a structurally compatible result buffer.
    pub fn invert_into(&self, out: &mut Matrix) -> Result<()> {
        let inv = self.invert()?;
        inv.copy_into(out)
    }

    /// Invert in place.
    ///
    /// For sparse matrices this toggles between the explicit and
    /// factored-inverse representations; the explicit values survive a
    /// round trip unchanged. A factorization failure leaves the matrix
    /// explicit.
    pub fn invert_in_place(&mut self) -> Result<()> {
        match &mut self.storage {
            Storage::Dense(d) => {
                require_square(d.m, d.n)?;
                *d = dense::invert(d)?;
                Ok(())
            }
            Storage::BlockDiag(b) => {
                *b = block_diag::invert(&b.as_ref())?;
                Ok(())
            }
            Storage::Csc(c) => c.toggle_invert(),
        }
    }

    /// Symmetric eigendecomposition.
    ///
    /// `count > 0` selects the largest `count` eigenvalues, `count < 0`
    /// the smallest `-count`, `|count| == n` the full spectrum; `vals`
    /// is always filled in ascending order. When `vecs` is given it
    /// must be a dense `n x |count|` matrix and receives the matching
    /// eigenvectors as columns. Not implemented for sparse storage.
    pub fn eigen(&self, count: i32, vals: &mut [f64], vecs: Option<&mut Matrix>) -> Result<()> {
        let n = self.rows();
        require_square(n, self.cols())?;

        let want = count.unsigned_abs() as usize;
        if count == 0 || want > n {
            return Err(Error::InvalidArgument {
                arg: "count",
                reason: format!("count {} out of range for dimension {}", count, n),
            });
        }
        if vals.len() < want {
            return Err(Error::InvalidArgument {
                arg: "vals",
                reason: format!("need room for {} eigenvalues, got {}", want, vals.len()),
            });
        }
        let (first, last) = if count > 0 { (n - want, n) } else { (0, want) };

        let vec_payload = match vecs {
            None => None,
            Some(v) => {
                let Storage::Dense(d) = &mut v.storage else {
                    return Err(Error::StructureMismatch { op: "eigen" });
                };
                if d.m != n || d.n != want {
                    return Err(Error::ShapeMismatch {
                        expected: [n, want],
                        got: [d.m, d.n],
                    });
                }
                Some(d)
            }
        };

        match &self.storage {
            Storage::Dense(d) => dense::eigen(d, first, last, vals, vec_payload),
            Storage::BlockDiag(b) => block_diag::eigen(&b.as_ref(), first, last, vals, vec_payload),
            Storage::Csc(_) => Err(Error::Unsupported {
                op: "eigen",
                kind: Kind::Csc,
            }),
        }
    }
}

fn require_square(m: usize, n: usize) -> Result<()> {
    if m != n {
        return Err(Error::ShapeMismatch {
            expected: [m, m],
            got: [m, n],
        });
    }
    Ok(())
}

fn validate_csc_structure(m: usize, n: usize, col_ptrs: &[usize], row_indices: &[usize]) -> Result<()> {
    if m == 0 || n == 0 {
        return Err(Error::InvalidArgument {
            arg: "dims",
            reason: format!("sparse matrix must be non-empty, got {}x{}", m, n),
        });
    }
    if col_ptrs.len() != n + 1 || col_ptrs[0] != 0 {
        return Err(Error::InvalidArgument {
            arg: "col_ptrs",
            reason: format!("expected {} monotone pointers starting at 0", n + 1),
        });
    }
    if col_ptrs.windows(2).any(|w| w[1] < w[0]) {
        return Err(Error::InvalidArgument {
            arg: "col_ptrs",
            reason: "column pointers must be non-decreasing".to_string(),
        });
    }
    let nnz = col_ptrs[n];
    if nnz == 0 {
        return Err(Error::InvalidArgument {
            arg: "col_ptrs",
            reason: "declared nonzero count must be positive".to_string(),
        });
    }
    if row_indices.len() != nnz {
        return Err(Error::InvalidArgument {
            arg: "row_indices",
            reason: format!("expected {} row indices, got {}", nnz, row_indices.len()),
        });
    }
    if row_indices.iter().any(|&r| r >= m) {
        return Err(Error::InvalidArgument {
            arg: "row_indices",
            reason: format!("row index out of range for {} rows", m),
        });
    }
    Ok(())
}
