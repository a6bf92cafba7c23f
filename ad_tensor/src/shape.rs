//! Shape and stride utilities for tensors.

use std::fmt;

use crate::error::{Result, TensorError};

/// A tensor shape (dimensions).
///
/// Always holds at least one dimension and every dimension is at least 1.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Create a shape, rejecting empty shapes and zero-sized dimensions.
    pub fn new(dims: Vec<usize>) -> Result<Self> {
        if dims.is_empty() {
            return Err(TensorError::EmptyShape);
        }
        if let Some(axis) = dims.iter().position(|&d| d == 0) {
            return Err(TensorError::ZeroDim { axis });
        }
        Ok(Shape(dims))
    }

    /// One-dimensional shape of length `len`.
    pub fn vector(len: usize) -> Result<Self> {
        Self::new(vec![len])
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Get dimension at index.
    pub fn dim(&self, idx: usize) -> usize {
        self.0[idx]
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Total number of elements, i.e. the buffer length a contiguous tensor
    /// of this shape needs.
    pub fn numel(&self) -> usize {
        self.0.iter().product()
    }

    /// Compute row-major (C-contiguous) strides for this shape.
    pub fn contiguous_strides(&self) -> Strides {
        let ndim = self.0.len();
        let mut strides = vec![1usize; ndim];
        for i in (0..ndim - 1).rev() {
            strides[i] = strides[i + 1] * self.0[i + 1];
        }
        Strides(strides)
    }

    /// Every multi-index of this shape in row-major order.
    pub fn indices(&self) -> ShapeIter {
        ShapeIter::new(self)
    }

    /// Right-aligned broadcast of two shapes.
    ///
    /// Missing leading axes count as 1. Aligned dimensions must be equal or
    /// one of them must be 1; the result takes the larger.
    pub fn broadcast_with(&self, other: &Shape) -> Result<Shape> {
        let ndim = self.ndim().max(other.ndim());
        let mut result = vec![0usize; ndim];

        for i in (0..ndim).rev() {
            let d1 = aligned_dim(self, ndim, i);
            let d2 = aligned_dim(other, ndim, i);

            result[i] = if d1 == d2 || d2 == 1 {
                d1
            } else if d1 == 1 {
                d2
            } else {
                return Err(TensorError::Broadcast {
                    lhs: self.clone(),
                    rhs: other.clone(),
                });
            };
        }

        Ok(Shape(result))
    }

    /// Strides that replay this (contiguous) shape across `target`.
    ///
    /// Axes missing from `self` and size-1 axes stretched to a larger
    /// target dimension get stride 0.
    pub fn broadcast_strides(&self, target: &Shape) -> Result<Strides> {
        let incompatible = || TensorError::Broadcast {
            lhs: self.clone(),
            rhs: target.clone(),
        };
        if self.ndim() > target.ndim() {
            return Err(incompatible());
        }

        let own = self.contiguous_strides();
        let offset = target.ndim() - self.ndim();
        let mut strides = vec![0usize; target.ndim()];

        for (i, stride) in strides.iter_mut().enumerate().skip(offset) {
            let j = i - offset;
            if self.0[j] == target.0[i] {
                *stride = own.0[j];
            } else if self.0[j] != 1 {
                return Err(incompatible());
            }
        }

        Ok(Strides(strides))
    }
}

/// Dimension of `shape` at axis `i` of a right-aligned `ndim`-axis frame.
fn aligned_dim(shape: &Shape, ndim: usize, i: usize) -> usize {
    let offset = ndim - shape.ndim();
    if i < offset {
        1
    } else {
        shape.0[i - offset]
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({:?})", self.0)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

impl TryFrom<Vec<usize>> for Shape {
    type Error = TensorError;

    fn try_from(v: Vec<usize>) -> Result<Self> {
        Shape::new(v)
    }
}

impl TryFrom<&[usize]> for Shape {
    type Error = TensorError;

    fn try_from(s: &[usize]) -> Result<Self> {
        Shape::new(s.to_vec())
    }
}

/// Tensor strides (step size in each dimension).
///
/// A stride of 0 replays the same element along that axis.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Strides(Vec<usize>);

impl Strides {
    pub fn new(strides: Vec<usize>) -> Self {
        Strides(strides)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Compute flat index from multi-dimensional indices.
    pub fn index(&self, indices: &[usize]) -> usize {
        debug_assert_eq!(self.0.len(), indices.len());
        self.0.iter().zip(indices).map(|(s, i)| s * i).sum()
    }
}

/// Iterator over all multi-dimensional indices of a shape.
///
/// Counts like an odometer: the last axis advances fastest and carries into
/// the axis before it on overflow.
#[derive(Debug, Clone)]
pub struct ShapeIter {
    dims: Vec<usize>,
    current: Vec<usize>,
    remaining: usize,
}

impl ShapeIter {
    pub fn new(shape: &Shape) -> Self {
        ShapeIter {
            dims: shape.0.clone(),
            current: vec![0; shape.ndim()],
            remaining: shape.numel(),
        }
    }
}

impl Iterator for ShapeIter {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let result = self.current.clone();

        if self.remaining > 0 {
            for axis in (0..self.dims.len()).rev() {
                self.current[axis] += 1;
                if self.current[axis] < self.dims[axis] {
                    break;
                }
                self.current[axis] = 0;
            }
        }

        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ShapeIter {}
