//! # ad_core - Reverse-mode Automatic Differentiation Engine
//!
//! A scalar reverse-mode autodiff engine. Every operation computes its
//! forward value immediately and records a node in an arena-backed
//! computation graph; a backward pass from a chosen root then fills each
//! reachable node's gradient slot via the chain rule.
//!
//! ## Quick Start
//!
//! ```
//! use ad_core::Graph;
//!
//! let g = Graph::new();
//! let x1 = g.constant(2.0);
//! let x2 = g.constant(5.0);
//!
//! // v = ln(x1) + x1 * x2 - sin(x2)
//! let v = x1.log() + x1 * x2 - x2.sin();
//! assert!((v.value() - 11.652071455223084).abs() < 1e-9);
//!
//! v.backward();
//! // dv/dx1 = 1/x1 + x2
//! assert!((x1.grad() - 5.5).abs() < 1e-12);
//! // dv/dx2 = x1 - cos(x2)
//! assert!((x2.grad() - (2.0 - 5.0_f64.cos())).abs() < 1e-12);
//! ```
//!
//! ## Supported Operations
//!
//! | Category | Operations |
//! |----------|------------|
//! | Leaves | [`Graph::constant`] |
//! | Arithmetic | `+`, `*`, `-` (as `a + b * -1`), unary `-` |
//! | Transcendental | [`Value::sin`], [`Value::log`], [`Value::try_log`], [`Value::exp`] |
//!
//! ## Architecture
//!
//! - **[`Graph`]**: arena owning every node; dropping it frees the graph.
//! - **[`Value`]**: `Copy` handle into the arena, used to build expressions
//!   and read values and gradients.
//! - **[`Propagation`]**: backward strategy, topological by default.
//! - **[`check_gradients`]**: validates gradients against finite differences.

mod backward;
mod error;
mod finite_diff;
mod node;
mod ops;

pub use backward::{BackwardStats, Propagation};
pub use error::{GraphError, Result};
pub use finite_diff::{check_gradients, finite_diff_grad, max_grad_error, GradCheck};
pub use node::{Graph, Node, NodeId, Op, Value};
