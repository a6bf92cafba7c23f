//! Local derivative rules for each operation.
//!
//! The backward pass multiplies these local partials by the upstream
//! gradient and accumulates the products into the operands' slots.

use crate::node::{Node, Op};

/// Local partials `d(node)/d(p1)` and `d(node)/d(p2)`.
///
/// `operand_values` holds the forward values of `p1` and `p2` (0 for absent
/// operands). Entries for absent operands are 0.
pub(crate) fn local_gradients(node: &Node, operand_values: [f64; 2]) -> [f64; 2] {
    let [a, b] = operand_values;
    match node.op {
        Op::Const => [0.0, 0.0],

        // z = a + b
        Op::Add => [1.0, 1.0],

        // z = a * b
        Op::Mul => [b, a],

        // z = sin(a)
        Op::Sin => [a.cos(), 0.0],

        // z = ln(a)
        Op::Log => [1.0 / a, 0.0],

        // z = exp(a), dz/da = exp(a) = z
        Op::Exp => [node.value, 0.0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(op: Op, value: f64) -> Node {
        Node {
            op,
            value,
            grad: 0.0,
            p1: None,
            p2: None,
        }
    }

    #[test]
    fn test_mul_swaps_operands() {
        assert_eq!(local_gradients(&node(Op::Mul, 6.0), [2.0, 3.0]), [3.0, 2.0]);
    }

    #[test]
    fn test_exp_uses_output_value() {
        let x = 0.5_f64;
        let grads = local_gradients(&node(Op::Exp, x.exp()), [x, 0.0]);
        assert!((grads[0] - x.exp()).abs() < 1e-12);
        // The quotient rule `1 / x` would give 2.0 here.
        assert!((grads[0] - 1.0 / x).abs() > 0.1);
    }

    #[test]
    fn test_log_and_sin() {
        assert_eq!(local_gradients(&node(Op::Log, 4.0_f64.ln()), [4.0, 0.0]), [0.25, 0.0]);
        let g = local_gradients(&node(Op::Sin, 1.0_f64.sin()), [1.0, 0.0]);
        assert!((g[0] - 1.0_f64.cos()).abs() < 1e-12);
    }
}
