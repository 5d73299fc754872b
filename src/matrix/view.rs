//! Single-use operand views
//!
//! A [`View`] wraps a borrowed matrix with an optional transpose flag
//! and an optional diagonal block range. Views are consumed by value:
//! the operation that receives one uses it exactly once, which is how
//! the one-shot lifetime of a transposed operand is enforced at compile
//! time. A view is never an output; materialize it to get a matrix.

use crate::error::{Error, Result};
use crate::matrix::{block_diag, dense, Matrix, Storage};

/// Borrowed operand: a matrix, optionally transposed, optionally
/// narrowed to a diagonal block range.
#[derive(Debug)]
pub struct View<'a> {
    pub(crate) matrix: &'a Matrix,
    pub(crate) trans: bool,
    /// Inclusive block range, only ever set on block-diagonal matrices
    pub(crate) blocks: Option<(usize, usize)>,
}

impl<'a> From<&'a Matrix> for View<'a> {
    fn from(matrix: &'a Matrix) -> Self {
        View::plain(matrix)
    }
}

impl<'a> View<'a> {
    pub(crate) fn plain(matrix: &'a Matrix) -> Self {
        Self {
            matrix,
            trans: false,
            blocks: None,
        }
    }

    pub(crate) fn transposed(matrix: &'a Matrix) -> Self {
        Self {
            matrix,
            trans: true,
            blocks: None,
        }
    }

    pub(crate) fn blocks(matrix: &'a Matrix, from: usize, to: usize) -> Self {
        Self {
            matrix,
            trans: false,
            blocks: Some((from, to)),
        }
    }

    /// Transpose this view.
    ///
    /// A view transposes at most once; materialize first to transpose
    /// again.
    pub fn t(self) -> Result<Self> {
        if self.trans {
            return Err(Error::InvalidTranspose {
                reason: "operand is already transposed; materialize it first",
            });
        }
        Ok(Self {
            matrix: self.matrix,
            trans: true,
            blocks: self.blocks,
        })
    }

    /// Logical row count after the transpose flag.
    pub fn rows(&self) -> usize {
        let (m, _) = self.eff_dims();
        m
    }

    /// Logical column count after the transpose flag.
    pub fn cols(&self) -> usize {
        let (_, n) = self.eff_dims();
        n
    }

    pub(crate) fn eff_dims(&self) -> (usize, usize) {
        let (m, n) = match (&self.matrix.storage, self.blocks) {
            (Storage::BlockDiag(b), Some((from, to))) => {
                let d = b.range_ref(from, to).dim();
                (d, d)
            }
            _ => (self.matrix.rows(), self.matrix.cols()),
        };
        if self.trans {
            (n, m)
        } else {
            (m, n)
        }
    }

    /// Materialize this view as an owned matrix of the same kind.
    ///
    /// A transposed factored inverse refactors the transposed values,
    /// so the result still represents an inverse operator.
    pub fn materialize(self) -> Result<Matrix> {
        let storage = match (&self.matrix.storage, self.blocks) {
            (Storage::Dense(d), _) => {
                if self.trans {
                    Storage::Dense(dense::transpose_copy(d))
                } else {
                    Storage::Dense(d.clone())
                }
            }
            (Storage::BlockDiag(b), range) => {
                let r = match range {
                    Some((from, to)) => b.range_ref(from, to),
                    None => b.as_ref(),
                };
                if self.trans {
                    Storage::BlockDiag(block_diag::transpose_copy(&r))
                } else {
                    Storage::BlockDiag(block_diag::to_owned(&r))
                }
            }
            (Storage::Csc(c), _) => {
                if self.trans {
                    let mut t = c.transpose_copy();
                    if c.is_factored() {
                        t.refactor()?;
                    }
                    Storage::Csc(t)
                } else {
                    Storage::Csc(c.clone())
                }
            }
        };
        Ok(Matrix { storage })
    }

    /// Materialize into a structurally compatible result buffer.
    pub fn materialize_into(self, dst: &mut Matrix) -> Result<()> {
        self.materialize()?.copy_into(dst)
    }
}
