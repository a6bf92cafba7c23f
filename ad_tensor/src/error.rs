//! Error types for tensor construction and element-wise operations.

use thiserror::Error;

use crate::shape::Shape;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TensorError {
    /// Aligned dimensions are neither equal nor 1.
    #[error("cannot broadcast shapes {lhs} and {rhs}")]
    Broadcast { lhs: Shape, rhs: Shape },

    /// A buffer does not hold the number of elements a shape requires.
    #[error("element count mismatch: expected {expected}, got {got}")]
    ElementCount { expected: usize, got: usize },

    #[error("shape must have at least one dimension")]
    EmptyShape,

    #[error("dimension {axis} has size 0")]
    ZeroDim { axis: usize },

    #[error("range {start}..{end} is empty")]
    EmptyRange { start: i64, end: i64 },
}

pub type Result<T> = std::result::Result<T, TensorError>;
