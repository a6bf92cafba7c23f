//! Core data structures for the computation graph.
//!
//! Nodes live in an arena owned by [`Graph`] and refer to their operands by
//! index. [`Value`] is a lightweight `Copy` handle borrowing the arena, so
//! handles can never outlive the graph that produced them.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;

use crate::backward::{self, BackwardStats, Propagation};
use crate::error::{GraphError, Result};

/// Stable index of a node inside its [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the arena. Operands always have a smaller
    /// index than the nodes built from them.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The operation performed by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// A leaf holding a fixed value.
    Const,
    /// p1 + p2
    Add,
    /// p1 * p2
    Mul,
    /// sin(p1)
    Sin,
    /// ln(p1)
    Log,
    /// exp(p1)
    Exp,
}

impl Op {
    /// Lower-case name used when printing a node.
    pub fn name(self) -> &'static str {
        match self {
            Op::Const => "const",
            Op::Add => "add",
            Op::Mul => "mul",
            Op::Sin => "sin",
            Op::Log => "log",
            Op::Exp => "exp",
        }
    }

    /// Number of operands a node with this op carries.
    pub fn arity(self) -> usize {
        match self {
            Op::Const => 0,
            Op::Sin | Op::Log | Op::Exp => 1,
            Op::Add | Op::Mul => 2,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single node of the expression DAG.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub op: Op,
    /// Forward value, fixed at construction.
    pub value: f64,
    /// Gradient of the most recent backward root with respect to this node.
    pub grad: f64,
    pub p1: Option<NodeId>,
    pub p2: Option<NodeId>,
}

impl Node {
    /// Operand ids in order (`p1` then `p2`).
    pub fn operands(&self) -> impl DoubleEndedIterator<Item = NodeId> {
        self.p1.into_iter().chain(self.p2)
    }
}

/// Arena holding every node created through its handles.
///
/// The graph is single-threaded: gradient slots are mutated in place during
/// backward propagation, so `Graph` is `!Sync`.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: RefCell<Vec<Node>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes recorded so far.
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    /// Create a constant leaf.
    pub fn constant(&self, value: f64) -> Value<'_> {
        self.push(Op::Const, value, None, None)
    }

    /// Snapshot of the node stored under `id`.
    ///
    /// Panics if `id` was not issued by this graph.
    pub fn node(&self, id: NodeId) -> Node {
        let nodes = self.nodes.borrow();
        match nodes.get(id.0) {
            Some(node) => node.clone(),
            None => panic!("node {id} does not belong to this graph ({} nodes)", nodes.len()),
        }
    }

    pub(crate) fn push(
        &self,
        op: Op,
        value: f64,
        p1: Option<NodeId>,
        p2: Option<NodeId>,
    ) -> Value<'_> {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        nodes.push(Node {
            op,
            value,
            grad: 0.0,
            p1,
            p2,
        });
        log::trace!("{id} = {op}({p1:?}, {p2:?}) -> {value}");
        Value { graph: self, id }
    }

    pub(crate) fn nodes(&self) -> Ref<'_, Vec<Node>> {
        self.nodes.borrow()
    }

    pub(crate) fn nodes_mut(&self) -> RefMut<'_, Vec<Node>> {
        self.nodes.borrow_mut()
    }
}

/// Handle to a node in a [`Graph`].
///
/// Building an expression computes its forward value immediately and records
/// a new node linked to its operands. The same handle may feed several
/// parents, so the recorded structure is a DAG rather than a tree.
#[derive(Clone, Copy)]
pub struct Value<'g> {
    graph: &'g Graph,
    id: NodeId,
}

impl<'g> Value<'g> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn op(&self) -> Op {
        self.graph.nodes()[self.id.0].op
    }

    /// Forward value computed when this node was built.
    pub fn value(&self) -> f64 {
        self.graph.nodes()[self.id.0].value
    }

    /// Gradient slot, populated by the last backward pass over this graph.
    pub fn grad(&self) -> f64 {
        self.graph.nodes()[self.id.0].grad
    }

    /// Handles to this node's operands, `p1` first.
    pub fn operands(&self) -> Vec<Value<'g>> {
        self.graph.nodes()[self.id.0]
            .operands()
            .map(|id| Value {
                graph: self.graph,
                id,
            })
            .collect()
    }

    fn binary(self, op: Op, rhs: Value<'g>, f: fn(f64, f64) -> f64) -> Value<'g> {
        assert!(
            std::ptr::eq(self.graph, rhs.graph),
            "cannot combine {} and {}: values belong to different graphs",
            self.id,
            rhs.id
        );
        let value = f(self.value(), rhs.value());
        self.graph.push(op, value, Some(self.id), Some(rhs.id))
    }

    fn unary(self, op: Op, value: f64) -> Value<'g> {
        self.graph.push(op, value, Some(self.id), None)
    }

    pub fn add(self, rhs: Value<'g>) -> Value<'g> {
        self.binary(Op::Add, rhs, |a, b| a + b)
    }

    pub fn mul(self, rhs: Value<'g>) -> Value<'g> {
        self.binary(Op::Mul, rhs, |a, b| a * b)
    }

    /// `self - rhs`, recorded as `self + rhs * (-1)`.
    pub fn sub(self, rhs: Value<'g>) -> Value<'g> {
        self.add(rhs.neg())
    }

    /// `-self`, recorded as `self * (-1)`.
    pub fn neg(self) -> Value<'g> {
        self.mul(self.graph.constant(-1.0))
    }

    pub fn sin(self) -> Value<'g> {
        self.unary(Op::Sin, self.value().sin())
    }

    /// Natural logarithm.
    ///
    /// Non-positive inputs follow IEEE semantics (`NaN`, or `-inf` for zero)
    /// and the non-finite value flows on through the graph. Use
    /// [`Value::try_log`] to reject them instead.
    pub fn log(self) -> Value<'g> {
        let x = self.value();
        if x <= 0.0 {
            log::warn!("log of non-positive value {x} at {}; result is {}", self.id, x.ln());
        }
        self.unary(Op::Log, x.ln())
    }

    /// Natural logarithm that fails on inputs outside `(0, inf)`.
    pub fn try_log(self) -> Result<Value<'g>> {
        let x = self.value();
        if x <= 0.0 || x.is_nan() {
            return Err(GraphError::Domain { op: Op::Log, value: x });
        }
        Ok(self.unary(Op::Log, x.ln()))
    }

    pub fn exp(self) -> Value<'g> {
        self.unary(Op::Exp, self.value().exp())
    }

    /// Run reverse-mode differentiation from this node with the default
    /// [`Propagation::Topological`] strategy.
    ///
    /// Every gradient slot in the graph is reset first, then this node is
    /// seeded with 1. Afterwards `grad()` on any node reachable from here is
    /// its partial derivative with respect to this node; all other nodes
    /// read 0.
    pub fn backward(&self) -> BackwardStats {
        self.backward_with(Propagation::default())
    }

    pub fn backward_with(&self, propagation: Propagation) -> BackwardStats {
        backward::backward(self.graph, self.id, propagation)
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.graph.node(self.id);
        f.debug_struct("Value")
            .field("id", &self.id)
            .field("op", &node.op)
            .field("value", &node.value)
            .field("grad", &node.grad)
            .finish()
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.graph.node(self.id);
        write!(f, "{}: {:.6} {:.6}", node.op, node.value, node.grad)
    }
}

// === Operator overloads ===

impl<'g> std::ops::Add for Value<'g> {
    type Output = Value<'g>;

    fn add(self, rhs: Value<'g>) -> Value<'g> {
        Value::add(self, rhs)
    }
}

impl<'g> std::ops::Add<f64> for Value<'g> {
    type Output = Value<'g>;

    fn add(self, rhs: f64) -> Value<'g> {
        Value::add(self, self.graph.constant(rhs))
    }
}

impl<'g> std::ops::Sub for Value<'g> {
    type Output = Value<'g>;

    fn sub(self, rhs: Value<'g>) -> Value<'g> {
        Value::sub(self, rhs)
    }
}

impl<'g> std::ops::Sub<f64> for Value<'g> {
    type Output = Value<'g>;

    fn sub(self, rhs: f64) -> Value<'g> {
        Value::sub(self, self.graph.constant(rhs))
    }
}

impl<'g> std::ops::Mul for Value<'g> {
    type Output = Value<'g>;

    fn mul(self, rhs: Value<'g>) -> Value<'g> {
        Value::mul(self, rhs)
    }
}

impl<'g> std::ops::Mul<f64> for Value<'g> {
    type Output = Value<'g>;

    fn mul(self, rhs: f64) -> Value<'g> {
        Value::mul(self, self.graph.constant(rhs))
    }
}

impl<'g> std::ops::Neg for Value<'g> {
    type Output = Value<'g>;

    fn neg(self) -> Value<'g> {
        Value::neg(self)
    }
}
