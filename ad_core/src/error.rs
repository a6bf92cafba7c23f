//! Error type for fallible graph construction.

use thiserror::Error;

use crate::node::Op;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// The forward value lies outside the operation's domain.
    #[error("{op} is undefined for input {value}")]
    Domain { op: Op, value: f64 },
}

pub type Result<T> = std::result::Result<T, GraphError>;
