//! In-crate numeric kernels
//!
//! The matrix layer never touches storage arrays directly for numeric
//! work; it calls these primitives. `dense` and `jacobi` cover the
//! BLAS/LAPACK-shaped dense operations, `sparse` and `sparse_lu` the
//! CSparse-shaped compressed-column operations.

pub mod dense;
pub mod jacobi;
pub mod sparse;
pub mod sparse_lu;
