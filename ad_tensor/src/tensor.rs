//! Owned tensors, broadcast views, and eager element-wise operations.

use std::fmt;

use rand::Rng;

use crate::error::{Result, TensorError};
use crate::shape::{Shape, Strides};

/// Records which operation produced a tensor.
///
/// Informational only; the tensor engine does not propagate gradients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TensorOp {
    #[default]
    None,
    Add,
    Mul,
}

/// A dense row-major tensor owning its buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    strides: Strides,
    op: TensorOp,
    data: Vec<f32>,
}

impl Tensor {
    fn with_op(data: Vec<f32>, shape: Shape, op: TensorOp) -> Self {
        debug_assert_eq!(data.len(), shape.numel());
        let strides = shape.contiguous_strides();
        Tensor {
            shape,
            strides,
            op,
            data,
        }
    }

    // === Constructors ===

    /// Create a tensor from a flat row-major buffer.
    pub fn from_vec(data: Vec<f32>, shape: Shape) -> Result<Self> {
        if data.len() != shape.numel() {
            return Err(TensorError::ElementCount {
                expected: shape.numel(),
                got: data.len(),
            });
        }
        Ok(Self::with_op(data, shape, TensorOp::None))
    }

    /// Create a tensor filled with a constant value.
    pub fn full(shape: &Shape, value: f32) -> Self {
        Self::with_op(vec![value; shape.numel()], shape.clone(), TensorOp::None)
    }

    pub fn zeros(shape: &Shape) -> Self {
        Self::full(shape, 0.0)
    }

    pub fn ones(shape: &Shape) -> Self {
        Self::full(shape, 1.0)
    }

    /// One-dimensional tensor `[start, start + 1, ..., end - 1]`.
    pub fn arange(start: i64, end: i64) -> Result<Self> {
        if end <= start {
            return Err(TensorError::EmptyRange { start, end });
        }
        let data: Vec<f32> = (start..end).map(|v| v as f32).collect();
        let shape = Shape::vector(data.len())?;
        Ok(Self::with_op(data, shape, TensorOp::None))
    }

    /// Tensor of samples drawn uniformly from `[0, 1)` using `rng`.
    pub fn rand<R: Rng + ?Sized>(shape: &Shape, rng: &mut R) -> Self {
        let data: Vec<f32> = (0..shape.numel()).map(|_| rng.gen::<f32>()).collect();
        Self::with_op(data, shape.clone(), TensorOp::None)
    }

    // === Accessors ===

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &Strides {
        &self.strides
    }

    pub fn op(&self) -> TensorOp {
        self.op
    }

    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Flat row-major buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Get flat index from multi-dimensional indices.
    pub fn flat_index(&self, indices: &[usize]) -> usize {
        self.strides.index(indices)
    }

    /// Element at a multi-index, or `None` if the index has the wrong rank
    /// or is out of bounds.
    pub fn get(&self, indices: &[usize]) -> Option<f32> {
        self.view().get(indices)
    }

    /// Copy `src`'s elements into this tensor's buffer, keeping this
    /// tensor's shape.
    ///
    /// Fails when the element counts differ, whatever the shapes.
    pub fn copy_from(&mut self, src: &Tensor) -> Result<()> {
        if src.numel() != self.numel() {
            return Err(TensorError::ElementCount {
                expected: self.numel(),
                got: src.numel(),
            });
        }
        self.data.copy_from_slice(&src.data);
        Ok(())
    }

    // === Views ===

    /// Read-only view with this tensor's own shape and strides.
    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            data: &self.data,
        }
    }

    /// Read-only view replaying this tensor across `shape`.
    ///
    /// The buffer is shared, not copied; broadcast axes get stride 0.
    pub fn broadcast_to(&self, shape: &Shape) -> Result<TensorView<'_>> {
        let strides = self.shape.broadcast_strides(shape)?;
        Ok(TensorView {
            shape: shape.clone(),
            strides,
            data: &self.data,
        })
    }

    // === Element-wise operations ===

    /// Element-wise sum, broadcasting mismatched shapes.
    pub fn add(&self, other: &Tensor) -> Result<Tensor> {
        self.zip_with(other, TensorOp::Add, |a, b| a + b)
    }

    /// Element-wise product, broadcasting mismatched shapes.
    pub fn mul(&self, other: &Tensor) -> Result<Tensor> {
        self.zip_with(other, TensorOp::Mul, |a, b| a * b)
    }

    fn zip_with(&self, other: &Tensor, op: TensorOp, f: impl Fn(f32, f32) -> f32) -> Result<Tensor> {
        let (lhs, rhs) = if self.shape == other.shape {
            (self.view(), other.view())
        } else {
            let shape = self.shape.broadcast_with(&other.shape)?;
            log::debug!(
                "{op:?}: broadcasting {} and {} to {shape}",
                self.shape,
                other.shape
            );
            (self.broadcast_to(&shape)?, other.broadcast_to(&shape)?)
        };

        let shape = lhs.shape.clone();
        let out_strides = shape.contiguous_strides();
        let mut data = vec![0.0f32; shape.numel()];
        for idx in shape.indices() {
            data[out_strides.index(&idx)] = f(lhs.at(&idx), rhs.at(&idx));
        }

        Ok(Self::with_op(data, shape, op))
    }
}

impl std::ops::Add for &Tensor {
    type Output = Tensor;

    /// Panics if the shapes cannot be broadcast; see [`Tensor::add`].
    fn add(self, rhs: &Tensor) -> Tensor {
        match Tensor::add(self, rhs) {
            Ok(t) => t,
            Err(e) => panic!("{e}"),
        }
    }
}

impl std::ops::Mul for &Tensor {
    type Output = Tensor;

    /// Panics if the shapes cannot be broadcast; see [`Tensor::mul`].
    fn mul(self, rhs: &Tensor) -> Tensor {
        match Tensor::mul(self, rhs) {
            Ok(t) => t,
            Err(e) => panic!("{e}"),
        }
    }
}

impl fmt::Display for Tensor {
    /// Nested brackets in row-major order, e.g. `[[1, 2], [3, 4]]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.view(), f)
    }
}

/// Borrowed, read-only window onto a tensor buffer with its own strides.
#[derive(Debug, Clone)]
pub struct TensorView<'a> {
    shape: Shape,
    strides: Strides,
    data: &'a [f32],
}

impl TensorView<'_> {
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &Strides {
        &self.strides
    }

    /// Element at an in-bounds multi-index.
    fn at(&self, indices: &[usize]) -> f32 {
        self.data[self.strides.index(indices)]
    }

    pub fn get(&self, indices: &[usize]) -> Option<f32> {
        let in_bounds = indices.len() == self.shape.ndim()
            && indices.iter().zip(self.shape.dims()).all(|(i, d)| i < d);
        in_bounds.then(|| self.at(indices))
    }

    /// Elements in row-major order of the view's shape.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.shape.indices().map(move |idx| self.at(&idx))
    }

    /// Materialise the view into a contiguous tensor.
    pub fn to_tensor(&self) -> Tensor {
        Tensor::with_op(self.iter().collect(), self.shape.clone(), TensorOp::None)
    }

    fn fmt_axis(&self, f: &mut fmt::Formatter<'_>, axis: usize, offset: usize) -> fmt::Result {
        let stride = self.strides.as_slice()[axis];
        write!(f, "[")?;
        for i in 0..self.shape.dim(axis) {
            if i > 0 {
                write!(f, ", ")?;
            }
            let at = offset + i * stride;
            if axis + 1 == self.shape.ndim() {
                write!(f, "{}", self.data[at])?;
            } else {
                self.fmt_axis(f, axis + 1, at)?;
            }
        }
        write!(f, "]")
    }
}

impl fmt::Display for TensorView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_axis(f, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn shape(dims: &[usize]) -> Shape {
        Shape::new(dims.to_vec()).unwrap()
    }

    fn tensor(data: &[f32], dims: &[usize]) -> Tensor {
        Tensor::from_vec(data.to_vec(), shape(dims)).unwrap()
    }

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_from_vec_checks_length() {
        let err = Tensor::from_vec(vec![1.0, 2.0, 3.0], shape(&[2, 2])).unwrap_err();
        assert_eq!(err, TensorError::ElementCount { expected: 4, got: 3 });
    }

    #[test]
    fn test_arange() {
        let t = Tensor::arange(0, 5).unwrap();
        assert_eq!(t.shape(), &shape(&[5]));
        assert_eq!(t.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(t.op(), TensorOp::None);

        assert_eq!(Tensor::arange(1, 2).unwrap().as_slice(), &[1.0]);
        assert_eq!(Tensor::arange(-2, 1).unwrap().as_slice(), &[-2.0, -1.0, 0.0]);
        assert_eq!(Tensor::arange(3, 3), Err(TensorError::EmptyRange { start: 3, end: 3 }));
    }

    #[test]
    fn test_fills() {
        let s = shape(&[2, 3]);
        assert!(Tensor::zeros(&s).as_slice().iter().all(|&v| v == 0.0));
        assert!(Tensor::ones(&s).as_slice().iter().all(|&v| v == 1.0));
        assert_eq!(Tensor::full(&s, 2.5).numel(), 6);
    }

    #[test]
    fn test_rand_is_seeded_and_in_range() {
        let s = shape(&[4, 4]);
        let a = Tensor::rand(&s, &mut StdRng::seed_from_u64(7));
        let b = Tensor::rand(&s, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(a.as_slice().iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn test_get_and_flat_index() {
        let t = tensor(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        assert_eq!(t.flat_index(&[1, 2]), 5);
        assert_eq!(t.get(&[1, 0]), Some(4.0));
        assert_eq!(t.get(&[2, 0]), None);
        assert_eq!(t.get(&[0]), None);
    }

    #[test]
    fn test_add_same_shape() {
        let a = tensor(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let b = tensor(&[10.0, 20.0, 30.0, 40.0], &[2, 2]);
        let c = a.add(&b).unwrap();

        assert_eq!(c.as_slice(), &[11.0, 22.0, 33.0, 44.0]);
        assert_eq!(c.op(), TensorOp::Add);
        assert_eq!(c.strides(), &Strides::new(vec![2, 1]));
    }

    #[test]
    fn test_add_broadcast_single_element() {
        init_logging();
        let a = Tensor::arange(0, 5).unwrap();
        let b = Tensor::arange(1, 2).unwrap();
        let c = &a + &b;

        assert_eq!(c.shape(), &shape(&[5]));
        assert_eq!(c.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_add_broadcast_leading_axis() {
        let a = tensor(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let b = tensor(&[10.0, 20.0, 30.0], &[3]);

        let c = a.add(&b).unwrap();
        assert_eq!(c.shape(), &shape(&[2, 3]));
        assert_eq!(c.as_slice(), &[11.0, 22.0, 33.0, 14.0, 25.0, 36.0]);

        // Operand order does not matter.
        assert_eq!(b.add(&a).unwrap().as_slice(), c.as_slice());
    }

    #[test]
    fn test_mul_broadcasts_both_operands() {
        let col = tensor(&[1.0, 2.0], &[2, 1]);
        let row = tensor(&[10.0, 20.0, 30.0], &[1, 3]);
        let c = col.mul(&row).unwrap();

        assert_eq!(c.shape(), &shape(&[2, 3]));
        assert_eq!(c.op(), TensorOp::Mul);
        assert_eq!(c.as_slice(), &[10.0, 20.0, 30.0, 20.0, 40.0, 60.0]);
    }

    #[test]
    fn test_incompatible_shapes() {
        let a = Tensor::zeros(&shape(&[2, 3]));
        let b = Tensor::zeros(&shape(&[4]));

        let err = a.add(&b).unwrap_err();
        assert_eq!(
            err,
            TensorError::Broadcast {
                lhs: shape(&[2, 3]),
                rhs: shape(&[4]),
            }
        );
        assert_eq!(err.to_string(), "cannot broadcast shapes [2, 3] and [4]");
        assert!(a.mul(&b).is_err());
    }

    #[test]
    #[should_panic(expected = "cannot broadcast")]
    fn test_operator_panics_on_incompatible_shapes() {
        let a = Tensor::zeros(&shape(&[2]));
        let b = Tensor::zeros(&shape(&[3]));
        let _ = &a * &b;
    }

    #[test]
    fn test_reference_scenario() {
        let t1 = Tensor::arange(0, 5).unwrap();
        let t2 = Tensor::arange(1, 2).unwrap();
        let t3 = Tensor::arange(5, 10).unwrap();
        let t4 = &t1 + &t2;
        let t5 = &t3 * &t4;

        assert_eq!(t4.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(t5.as_slice(), &[5.0, 12.0, 21.0, 32.0, 45.0]);
    }

    #[test]
    fn test_broadcast_view_shares_buffer() {
        let t = tensor(&[1.0, 2.0, 3.0], &[3]);
        let view = t.broadcast_to(&shape(&[2, 3])).unwrap();

        assert_eq!(view.strides(), &Strides::new(vec![0, 1]));
        assert!(std::ptr::eq(view.data.as_ptr(), t.as_slice().as_ptr()));
        assert_eq!(view.get(&[1, 2]), Some(3.0));

        let materialised = view.to_tensor();
        assert_eq!(materialised.as_slice(), &[1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
        assert_eq!(materialised.strides(), &Strides::new(vec![3, 1]));
    }

    #[test]
    fn test_copy_from() {
        let mut dst = Tensor::zeros(&shape(&[2, 2]));
        let src = tensor(&[1.0, 2.0, 3.0, 4.0], &[4]);
        dst.copy_from(&src).unwrap();
        assert_eq!(dst.shape(), &shape(&[2, 2]));
        assert_eq!(dst.get(&[1, 1]), Some(4.0));

        let short = tensor(&[1.0, 2.0, 3.0], &[3]);
        assert_eq!(
            dst.copy_from(&short),
            Err(TensorError::ElementCount { expected: 4, got: 3 })
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Tensor::arange(0, 3).unwrap().to_string(), "[0, 1, 2]");

        let t = tensor(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[3, 2]);
        assert_eq!(t.to_string(), "[[1, 2], [3, 4], [5, 6]]");

        let row = Tensor::arange(0, 2).unwrap();
        let view = row.broadcast_to(&shape(&[2, 2])).unwrap();
        assert_eq!(view.to_string(), "[[0, 1], [0, 1]]");
    }
}
