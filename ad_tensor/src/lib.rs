//! # ad_tensor - Strided, broadcasting tensors
//!
//! Dense `f32` tensors addressed through row-major strides, with eager
//! element-wise operations that broadcast NumPy-style. The tensor engine is
//! forward-only: the op tag on a result records how it was produced but no
//! gradients flow through it.
//!
//! ## Overview
//!
//! - [`Shape`] and [`Strides`] - dimensions and memory layout
//! - [`ShapeIter`] - every multi-index of a shape in row-major order
//! - [`Tensor`] - owned buffer plus layout, with `add`/`mul`
//! - [`TensorView`] - borrowed window with adjusted strides, used for
//!   broadcasting without copying
//!
//! ## Example
//!
//! ```
//! use ad_tensor::prelude::*;
//!
//! let t1 = Tensor::arange(0, 5)?;
//! let t2 = Tensor::arange(1, 2)?;
//! let sum = t1.add(&t2)?;
//! assert_eq!(sum.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
//!
//! let m = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], Shape::new(vec![2, 3])?)?;
//! let row = Tensor::from_vec(vec![10.0, 20.0, 30.0], Shape::new(vec![3])?)?;
//! assert_eq!(m.mul(&row)?.to_string(), "[[10, 40, 90], [40, 100, 180]]");
//!
//! assert!(m.add(&Tensor::zeros(&Shape::new(vec![4])?)).is_err());
//! # Ok::<(), TensorError>(())
//! ```

pub mod error;
pub mod shape;
pub mod tensor;

pub use error::{Result, TensorError};
pub use shape::{Shape, ShapeIter, Strides};
pub use tensor::{Tensor, TensorOp, TensorView};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::TensorError;
    pub use crate::shape::{Shape, ShapeIter, Strides};
    pub use crate::tensor::{Tensor, TensorOp, TensorView};
}
