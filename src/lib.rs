//! # mxr
//!
//! **Format-polymorphic linear algebra for structural dynamics.**
//!
//! mxr is the matrix engine of an implicit contact-dynamics pipeline:
//! one [`Matrix`] type over three storage kinds, with binary operations
//! dispatched on the kind pairing.
//!
//! ## Storage kinds
//!
//! - **Dense**: one contiguous column-major array
//! - **BlockDiag**: independent square diagonal blocks (assembled
//!   stiffness and mass operators)
//! - **Csc**: compressed sparse column, with an in-place toggle to a
//!   factored-inverse representation backed by a sparse LU
//!
//! ## Quick Start
//!
//! ```rust
//! use mxr::prelude::*;
//!
//! # fn main() -> mxr::Result<()> {
//! let a = Matrix::dense_from(2, 2, &[4.0, 2.0, 1.0, 3.0])?;
//! let b = Matrix::dense_from(2, 2, &[1.0, 0.0, 0.0, 1.0])?;
//!
//! // c = 2 A^T + B
//! let c = add(2.0, a.t(), 1.0, b.view())?;
//!
//! // d = A * inv(A), equal to the identity
//! let inv = a.invert()?;
//! let d = matmat(1.0, a.view(), inv.view())?;
//! assert!((d.get(0, 0) - 1.0).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Matrices are plain owned data; `Matrix` is `Send`. Operations take
//! shared or exclusive borrows the usual Rust way, so the borrow
//! checker enforces the exclusive-writer rule other environments leave
//! to convention.

#![warn(missing_docs)]

pub mod error;
pub mod kernel;
pub mod matrix;

pub use error::{Error, Result};
pub use matrix::{Kind, Matrix, View};
pub use matrix::{add, add_into, matmat, matmat_into, matvec, trimat};

/// Common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::matrix::{add, add_into, matmat, matmat_into, matvec, trimat};
    pub use crate::matrix::{Kind, Matrix, View};
}
