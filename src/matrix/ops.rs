//! Binary operations over every storage kind pairing
//!
//! Same-kind pairings run their native kernels; mixed pairings convert
//! both operands to dense and produce a dense result. A factored
//! inverse entering a multiply is applied through its triangular
//! solves, column by column, never by forming explicit inverse entries.

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::kernel::sparse_lu::{self, LuFactors};
use crate::kernel::dense as dense_kernel;
use crate::matrix::block_diag::{self, BdRef, BlockDiagData};
use crate::matrix::csc::{self, CscData};
use crate::matrix::dense::{self, DenseData};
use crate::matrix::view::View;
use crate::matrix::{Matrix, Storage};

/// Resolved operand payload behind a view.
enum Ref<'a> {
    Dense(&'a DenseData),
    Bd(BdRef<'a>),
    Csc(&'a CscData),
}

fn resolve<'a>(v: &View<'a>) -> Ref<'a> {
    match (&v.matrix.storage, v.blocks) {
        (Storage::Dense(d), _) => Ref::Dense(d),
        (Storage::BlockDiag(b), Some((from, to))) => Ref::Bd(b.range_ref(from, to)),
        (Storage::BlockDiag(b), None) => Ref::Bd(b.as_ref()),
        (Storage::Csc(c), _) => Ref::Csc(c),
    }
}

fn eff_dims(r: &Ref<'_>, trans: bool) -> (usize, usize) {
    match r {
        Ref::Dense(d) => d.eff_dims(trans),
        Ref::Bd(b) => (b.dim(), b.dim()),
        Ref::Csc(c) => c.eff_dims(trans),
    }
}

fn is_factored(r: &Ref<'_>) -> bool {
    matches!(r, Ref::Csc(c) if c.is_factored())
}

fn factored_of<'a>(r: &Ref<'a>) -> Option<&'a CscData> {
    match r {
        Ref::Csc(c) if c.is_factored() => Some(*c),
        _ => None,
    }
}

/// Dense rendition of a resolved operand, borrowing when it already is one.
fn dense_of<'a>(r: &Ref<'a>) -> Cow<'a, DenseData> {
    match r {
        Ref::Dense(d) => Cow::Borrowed(*d),
        Ref::Bd(b) => Cow::Owned(block_diag::to_dense(b)),
        Ref::Csc(c) => Cow::Owned(c.to_dense()),
    }
}

/// `alpha * op(A) + beta * op(B)` as a new matrix.
///
/// Same-kind operands produce a result of that kind (block-diagonal
/// operands must share their block structure); mixed kinds produce a
/// dense result. Factored inverses have no meaningful sum and are
/// rejected.
pub fn add(alpha: f64, a: View<'_>, beta: f64, b: View<'_>) -> Result<Matrix> {
    let ra = resolve(&a);
    let rb = resolve(&b);
    let (m, n) = eff_dims(&ra, a.trans);
    let db = eff_dims(&rb, b.trans);
    if (m, n) != db {
        return Err(Error::ShapeMismatch {
            expected: [m, n],
            got: [db.0, db.1],
        });
    }
    if is_factored(&ra) || is_factored(&rb) {
        return Err(Error::FactoredOperand { op: "add" });
    }

    let storage = match (&ra, &rb) {
        (Ref::Dense(x), Ref::Dense(y)) => {
            let mut c = DenseData::zeros(m, n);
            dense::add_into(alpha, x, a.trans, beta, y, b.trans, &mut c);
            Storage::Dense(c)
        }
        (Ref::Bd(x), Ref::Bd(y)) => {
            if !block_diag::same_structure(x, y) {
                return Err(Error::StructureMismatch { op: "add" });
            }
            let mut c = BlockDiagData::zeros(&x.sizes());
            block_diag::add_into(alpha, x, a.trans, beta, y, b.trans, &mut c);
            Storage::BlockDiag(c)
        }
        (Ref::Csc(x), Ref::Csc(y)) => Storage::Csc(csc::add(alpha, x, a.trans, beta, y, b.trans)),
        _ => {
            let dx = dense_of(&ra);
            let dy = dense_of(&rb);
            let mut c = DenseData::zeros(m, n);
            dense::add_into(alpha, &dx, a.trans, beta, &dy, b.trans, &mut c);
            Storage::Dense(c)
        }
    };
    Ok(Matrix { storage })
}

/// `alpha * op(A) + beta * op(B)` into a reusable result buffer.
///
/// The buffer must have the kind the allocating [`add`] would produce;
/// dense buffers are reshaped, block-diagonal buffers must match the
/// result structure, sparse buffers adopt the result structure.
pub fn add_into(alpha: f64, a: View<'_>, beta: f64, b: View<'_>, c: &mut Matrix) -> Result<()> {
    add(alpha, a, beta, b)?.copy_into(c)
}

/// `alpha * op(A) * op(B)` as a new matrix.
///
/// A factored-inverse operand turns its side of the product into
/// triangular solves and forces a dense result; two factored operands
/// cannot be combined.
pub fn matmat(alpha: f64, a: View<'_>, b: View<'_>) -> Result<Matrix> {
    let ra = resolve(&a);
    let rb = resolve(&b);
    let (m, k) = eff_dims(&ra, a.trans);
    let (bk, n) = eff_dims(&rb, b.trans);
    if k != bk {
        // Report both operands' effective shapes; the inner dimensions
        // are the conflict
        return Err(Error::ShapeMismatch {
            expected: [m, k],
            got: [bk, n],
        });
    }

    match (factored_of(&ra), factored_of(&rb)) {
        (Some(_), Some(_)) => return Err(Error::FactoredOperand { op: "matmat" }),
        (Some(ca), None) => return factored_times(alpha, ca, a.trans, &rb, b.trans),
        (None, Some(cb)) => return times_factored(alpha, &ra, a.trans, cb, b.trans),
        (None, None) => {}
    }

    let storage = match (&ra, &rb) {
        (Ref::Dense(x), Ref::Dense(y)) => {
            let mut c = DenseData::zeros(m, n);
            dense::matmat_into(alpha, x, a.trans, y, b.trans, 0.0, &mut c);
            Storage::Dense(c)
        }
        (Ref::Bd(x), Ref::Bd(y)) => {
            if !block_diag::same_structure(x, y) {
                return Err(Error::StructureMismatch { op: "matmat" });
            }
            let mut c = BlockDiagData::zeros(&x.sizes());
            block_diag::matmat_into(alpha, x, a.trans, y, b.trans, 0.0, &mut c);
            Storage::BlockDiag(c)
        }
        (Ref::Csc(x), Ref::Csc(y)) => Storage::Csc(csc::matmat(alpha, x, a.trans, y, b.trans)),
        _ => {
            let dx = dense_of(&ra);
            let dy = dense_of(&rb);
            let mut c = DenseData::zeros(m, n);
            dense::matmat_into(alpha, &dx, a.trans, &dy, b.trans, 0.0, &mut c);
            Storage::Dense(c)
        }
    };
    Ok(Matrix { storage })
}

/// `alpha * op(A) * op(B) + beta * C` into a reusable result buffer.
///
/// With `beta == 0` the buffer is prepared like [`add_into`]; otherwise
/// it must already hold a structurally matching value to accumulate on.
pub fn matmat_into(alpha: f64, a: View<'_>, b: View<'_>, beta: f64, c: &mut Matrix) -> Result<()> {
    let res = matmat(alpha, a, b)?;
    if beta == 0.0 {
        return res.copy_into(c);
    }
    match (res.storage, &mut c.storage) {
        (Storage::Dense(r), Storage::Dense(d)) => {
            if d.m != r.m || d.n != r.n {
                return Err(Error::ShapeMismatch {
                    expected: [r.m, r.n],
                    got: [d.m, d.n],
                });
            }
            for (dv, rv) in d.values.iter_mut().zip(r.values) {
                *dv = rv + beta * *dv;
            }
            Ok(())
        }
        (Storage::BlockDiag(r), Storage::BlockDiag(d)) => {
            if r.bounds != d.bounds {
                return Err(Error::StructureMismatch { op: "matmat" });
            }
            for (dv, rv) in d.values.iter_mut().zip(r.values) {
                *dv = rv + beta * *dv;
            }
            Ok(())
        }
        (Storage::Csc(r), Storage::Csc(d)) => {
            if d.is_factored() {
                return Err(Error::FactoredOperand { op: "matmat" });
            }
            if (r.m, r.n) != (d.m, d.n) {
                return Err(Error::ShapeMismatch {
                    expected: [r.m, r.n],
                    got: [d.m, d.n],
                });
            }
            let merged = csc::add(1.0, &r, false, beta, d, false);
            *d = merged;
            Ok(())
        }
        _ => Err(Error::StructureMismatch { op: "matmat" }),
    }
}

/// Apply a factored inverse to every column of a dense right-hand side.
fn inv_apply_cols(f: &LuFactors, trans: bool, rhs: &DenseData) -> DenseData {
    let n = f.dim();
    let mut out = DenseData::zeros(n, rhs.n);
    for j in 0..rhs.n {
        let b = &rhs.values[j * n..(j + 1) * n];
        let o = &mut out.values[j * n..(j + 1) * n];
        if trans {
            sparse_lu::solve_transpose(f, b, o);
        } else {
            sparse_lu::solve(f, b, o);
        }
    }
    out
}

/// `alpha * inv-op(A) * op(B)` with `A` factored: one solve per column
/// of the dense-materialized `op(B)`.
fn factored_times(
    alpha: f64,
    a: &CscData,
    at: bool,
    rb: &Ref<'_>,
    bt: bool,
) -> Result<Matrix> {
    let f = a
        .factors
        .as_ref()
        .ok_or(Error::FactoredOperand { op: "matmat" })?;
    let db_plain = dense_of(rb);
    let db = if bt {
        Cow::Owned(dense::transpose_copy(&db_plain))
    } else {
        db_plain
    };
    let mut out = inv_apply_cols(f, at, &db);
    if alpha != 1.0 {
        for v in out.values.iter_mut() {
            *v *= alpha;
        }
    }
    Ok(Matrix {
        storage: Storage::Dense(out),
    })
}

/// `alpha * op(A) * inv-op(B)` with `B` factored, computed row-wise:
/// the transposed product needs one transpose-flipped solve per row of
/// `op(A)`.
fn times_factored(
    alpha: f64,
    ra: &Ref<'_>,
    at: bool,
    b: &CscData,
    bt: bool,
) -> Result<Matrix> {
    let f = b
        .factors
        .as_ref()
        .ok_or(Error::FactoredOperand { op: "matmat" })?;
    // op(A)^T: the plain payload when A arrives transposed
    let da_plain = dense_of(ra);
    let da_t = if at {
        da_plain
    } else {
        Cow::Owned(dense::transpose_copy(&da_plain))
    };
    let ct = inv_apply_cols(f, !bt, &da_t);
    let mut out = dense::transpose_copy(&ct);
    if alpha != 1.0 {
        for v in out.values.iter_mut() {
            *v *= alpha;
        }
    }
    Ok(Matrix {
        storage: Storage::Dense(out),
    })
}

/// `y = alpha * op(A) * x + beta * y` for any kind, including factored
/// inverses (one triangular solve instead of a product).
pub fn matvec(alpha: f64, a: View<'_>, x: &[f64], beta: f64, y: &mut [f64]) -> Result<()> {
    let ra = resolve(&a);
    let (m, n) = eff_dims(&ra, a.trans);
    if x.len() != n || y.len() != m {
        return Err(Error::ShapeMismatch {
            expected: [m, n],
            got: [y.len(), x.len()],
        });
    }
    match &ra {
        Ref::Dense(d) => {
            dense_kernel::gemv(a.trans, d.m, d.n, alpha, &d.values, d.m, x, beta, y);
        }
        Ref::Bd(b) => block_diag::matvec_into(alpha, b, a.trans, x, beta, y),
        Ref::Csc(c) => match &c.factors {
            None => csc::matvec_into(alpha, c, a.trans, x, beta, y),
            Some(f) => {
                let mut tmp = vec![0.0f64; m];
                if a.trans {
                    sparse_lu::solve_transpose(f, x, &mut tmp);
                } else {
                    sparse_lu::solve(f, x, &mut tmp);
                }
                for (yi, ti) in y.iter_mut().zip(tmp) {
                    *yi = alpha * ti + beta * *yi;
                }
            }
        },
    }
    Ok(())
}

/// Triple product `op(A) * op(B) * op(C)`, associated right to left.
pub fn trimat(a: View<'_>, b: View<'_>, c: View<'_>) -> Result<Matrix> {
    let bc = matmat(1.0, b, c)?;
    matmat(1.0, a, View::plain(&bc))
}
