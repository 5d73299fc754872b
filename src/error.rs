//! Error types for mxr

use crate::matrix::Kind;
use thiserror::Error;

/// Result type alias using mxr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mxr operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Operand or result shapes are incompatible
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected [rows, cols]
        expected: [usize; 2],
        /// Actual [rows, cols]
        got: [usize; 2],
    },

    /// Block or sparsity structure is incompatible between operands,
    /// or a reused result buffer has the wrong kind/structure
    #[error("Structure mismatch in '{op}'")]
    StructureMismatch {
        /// The operation name
        op: &'static str,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// LU factorization hit a zero (or below-threshold) pivot
    #[error("Singular matrix: unusable pivot at column {col}")]
    Singular {
        /// Column at which factorization failed
        col: usize,
    },

    /// Jacobi eigensolver failed to converge
    #[error("Eigendecomposition failed to converge after {sweeps} sweeps")]
    EigenFailure {
        /// Number of sweeps performed
        sweeps: usize,
    },

    /// Operation is not implemented for this storage kind
    #[error("Unsupported operation '{op}' for {kind:?} storage")]
    Unsupported {
        /// The operation name
        op: &'static str,
        /// The offending storage kind
        kind: Kind,
    },

    /// Transpose of an already-transposed view
    #[error("Invalid view transition: {reason}")]
    InvalidTranspose {
        /// What went wrong
        reason: &'static str,
    },

    /// A factored-inverse matrix was passed where an explicit matrix
    /// is required (add, scale, or factoring both multiply operands)
    #[error("Factored inverse operand is invalid in '{op}'")]
    FactoredOperand {
        /// The operation name
        op: &'static str,
    },
}
