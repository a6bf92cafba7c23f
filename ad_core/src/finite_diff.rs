//! Numerical gradient checks for validating the backward pass.

use crate::node::{Graph, Value};

/// Central finite-difference gradient of `f` at `point`.
///
/// ```
/// use ad_core::finite_diff_grad;
///
/// // f(x, y) = x^2 + y^2
/// let f = |v: &[f64]| v[0] * v[0] + v[1] * v[1];
/// let grads = finite_diff_grad(f, &[3.0, 4.0], 1e-7);
///
/// assert!((grads[0] - 6.0).abs() < 1e-5);
/// assert!((grads[1] - 8.0).abs() < 1e-5);
/// ```
pub fn finite_diff_grad<F>(f: F, point: &[f64], eps: f64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut perturbed = point.to_vec();
    (0..point.len())
        .map(|i| {
            perturbed[i] = point[i] + eps;
            let f_plus = f(&perturbed);
            perturbed[i] = point[i] - eps;
            let f_minus = f(&perturbed);
            perturbed[i] = point[i];
            (f_plus - f_minus) / (2.0 * eps)
        })
        .collect()
}

/// Largest absolute elementwise difference between two gradient vectors.
///
/// Panics if the lengths differ.
pub fn max_grad_error(lhs: &[f64], rhs: &[f64]) -> f64 {
    assert_eq!(lhs.len(), rhs.len(), "gradient vectors differ in length");
    lhs.iter()
        .zip(rhs)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}

/// Analytic and numeric gradients of one expression at one point.
#[derive(Debug, Clone, PartialEq)]
pub struct GradCheck {
    pub value: f64,
    pub analytic: Vec<f64>,
    pub numeric: Vec<f64>,
}

impl GradCheck {
    pub fn max_error(&self) -> f64 {
        max_grad_error(&self.analytic, &self.numeric)
    }

    pub fn passes(&self, tolerance: f64) -> bool {
        self.max_error() < tolerance
    }
}

/// Build the expression returned by `build` over constant leaves holding
/// `point`, differentiate it, and compare the leaf gradients with central
/// finite differences of step `eps`.
///
/// ```
/// use ad_core::check_gradients;
///
/// let check = check_gradients(|_, x| x[0].sin() * x[1], &[0.4, 1.5], 1e-6);
/// assert!(check.passes(1e-6));
/// ```
pub fn check_gradients<F>(build: F, point: &[f64], eps: f64) -> GradCheck
where
    F: for<'g> Fn(&'g Graph, &[Value<'g>]) -> Value<'g>,
{
    let eval = |at: &[f64]| {
        let graph = Graph::new();
        let leaves: Vec<Value<'_>> = at.iter().map(|&v| graph.constant(v)).collect();
        let root = build(&graph, &leaves);
        root.value()
    };

    let graph = Graph::new();
    let leaves: Vec<Value<'_>> = point.iter().map(|&v| graph.constant(v)).collect();
    let root = build(&graph, &leaves);
    root.backward();

    let check = GradCheck {
        value: root.value(),
        analytic: leaves.iter().map(Value::grad).collect(),
        numeric: finite_diff_grad(eval, point, eps),
    };
    log::debug!(
        "gradient check over {} leaves: max error {:e}",
        point.len(),
        check.max_error()
    );
    check
}
