//! Property tests for shapes, iteration, and broadcasting.

use ad_tensor::prelude::*;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Shapes of rank 1..=4 with small dimensions
fn shape_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..5, 1..=4)
}

/// A shape plus a broadcast-compatible partner: a suffix of it with some
/// axes collapsed to 1.
fn compatible_pair() -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
    shape_strategy()
        .prop_flat_map(|dims| {
            let n = dims.len();
            (Just(dims), 1..=n, prop::collection::vec(any::<bool>(), n))
        })
        .prop_map(|(dims, keep, collapse)| {
            let suffix = dims[dims.len() - keep..]
                .iter()
                .zip(collapse)
                .map(|(&d, c)| if c { 1 } else { d })
                .collect();
            (dims, suffix)
        })
}

fn shape(dims: &[usize]) -> Shape {
    Shape::new(dims.to_vec()).unwrap()
}

proptest! {
    /// Property: ShapeIter visits every index exactly once in row-major order
    #[test]
    fn prop_shape_iter_matches_strides(dims in shape_strategy()) {
        let s = shape(&dims);
        let strides = s.contiguous_strides();

        let flat: Vec<usize> = s.indices().map(|idx| strides.index(&idx)).collect();
        let expected: Vec<usize> = (0..s.numel()).collect();
        prop_assert_eq!(flat, expected);
    }

    /// Property: broadcasting is symmetric
    #[test]
    fn prop_broadcast_symmetric(a in shape_strategy(), b in shape_strategy()) {
        let (sa, sb) = (shape(&a), shape(&b));
        prop_assert_eq!(
            sa.broadcast_with(&sb).is_ok(),
            sb.broadcast_with(&sa).is_ok()
        );
        if let (Ok(ab), Ok(ba)) = (sa.broadcast_with(&sb), sb.broadcast_with(&sa)) {
            prop_assert_eq!(ab, ba);
        }
    }

    /// Property: broadcast add agrees with adding the materialised views
    #[test]
    fn prop_broadcast_add_matches_materialised((a, b) in compatible_pair(), seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let ta = Tensor::rand(&shape(&a), &mut rng);
        let tb = Tensor::rand(&shape(&b), &mut rng);

        let out = ta.add(&tb).unwrap();
        prop_assert_eq!(out.shape(), ta.shape());

        let wide = tb.broadcast_to(ta.shape()).unwrap().to_tensor();
        let expected: Vec<f32> = ta
            .as_slice()
            .iter()
            .zip(wide.as_slice())
            .map(|(x, y)| x + y)
            .collect();
        prop_assert_eq!(out.as_slice(), expected.as_slice());
    }

    /// Property: every output element of a broadcast mul reads the operands
    /// at the right-aligned, size-1-clamped index
    #[test]
    fn prop_broadcast_mul_elementwise((a, b) in compatible_pair(), seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let ta = Tensor::rand(&shape(&a), &mut rng);
        let tb = Tensor::rand(&shape(&b), &mut rng);
        let out = tb.mul(&ta).unwrap();

        let offset = a.len() - b.len();
        for idx in out.shape().indices() {
            let b_idx: Vec<usize> = idx[offset..]
                .iter()
                .zip(&b)
                .map(|(&i, &d)| if d == 1 { 0 } else { i })
                .collect();
            let expected = tb.get(&b_idx).unwrap() * ta.get(&idx).unwrap();
            prop_assert_eq!(out.get(&idx).unwrap(), expected);
        }
    }

    /// Property: shapes are rejected as soon as one dimension is zero
    #[test]
    fn prop_zero_dim_rejected(mut dims in shape_strategy(), pos in any::<prop::sample::Index>()) {
        let axis = pos.index(dims.len());
        dims[axis] = 0;
        prop_assert_eq!(Shape::new(dims), Err(TensorError::ZeroDim { axis }));
    }
}
