//! Reverse-mode gradient propagation.
//!
//! Two strategies are available:
//! 1. [`Propagation::Topological`] orders the reachable subgraph once and
//!    walks it in reverse, so every node's gradient is complete before it is
//!    pushed to its operands. Each node is visited exactly once.
//! 2. [`Propagation::PerEdge`] walks depth-first from the root, pushing
//!    each edge's contribution straight down the path it arrived on. A node
//!    is re-entered once per path into it, which grows quickly on graphs
//!    with many shared subterms.

use crate::node::{Graph, Node, NodeId};
use crate::ops::local_gradients;

/// How gradients are pushed from the root to its ancestors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Propagation {
    /// Single reverse pass over a topological order.
    #[default]
    Topological,
    /// Depth-first walk, `p1` before `p2`, re-entering shared nodes once
    /// per incoming path.
    PerEdge,
}

/// Work performed by one backward pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackwardStats {
    /// Times a node had its local rules applied.
    pub nodes_visited: usize,
    /// Gradient contributions added into operand slots.
    pub edges_propagated: usize,
}

pub(crate) fn backward(graph: &Graph, root: NodeId, propagation: Propagation) -> BackwardStats {
    let mut nodes = graph.nodes_mut();
    assert!(
        root.0 < nodes.len(),
        "node {root} does not belong to this graph ({} nodes)",
        nodes.len()
    );

    for node in nodes.iter_mut() {
        node.grad = 0.0;
    }
    nodes[root.0].grad = 1.0;

    let mut stats = BackwardStats::default();
    match propagation {
        Propagation::Topological => propagate_topological(&mut nodes, root, &mut stats),
        Propagation::PerEdge => propagate_per_edge(&mut nodes, root, &mut stats),
    }

    log::debug!(
        "backward from {root} ({propagation:?}): {} visits, {} edge contributions over {} nodes",
        stats.nodes_visited,
        stats.edges_propagated,
        nodes.len()
    );
    stats
}

/// Forward values of a node's operands, 0 where absent.
fn operand_values(nodes: &[Node], node: &Node) -> [f64; 2] {
    [
        node.p1.map_or(0.0, |id| nodes[id.0].value),
        node.p2.map_or(0.0, |id| nodes[id.0].value),
    ]
}

fn propagate_topological(nodes: &mut [Node], root: NodeId, stats: &mut BackwardStats) {
    let order = topological_order(nodes, root);

    for &id in order.iter().rev() {
        let node = nodes[id.0].clone();
        stats.nodes_visited += 1;

        let local = local_gradients(&node, operand_values(nodes, &node));
        for (operand, partial) in node.operands().zip(local) {
            let contribution = node.grad * partial;
            log::trace!("{id} -> {operand}: += {contribution}");
            nodes[operand.0].grad += contribution;
            stats.edges_propagated += 1;
        }
    }
}

/// Depth-first propagation from `root`, forwarding each contribution down
/// the single path it arrived on.
///
/// Only the incoming contribution is forwarded, never the node's whole
/// accumulated slot, so a shared interior node re-entered from a second
/// parent does not re-send what the first parent already delivered. Driven
/// by an explicit work stack so that deep chains do not exhaust the call
/// stack.
fn propagate_per_edge(nodes: &mut [Node], root: NodeId, stats: &mut BackwardStats) {
    let mut stack = vec![(root, 1.0)];

    while let Some((id, upstream)) = stack.pop() {
        let node = nodes[id.0].clone();
        stats.nodes_visited += 1;

        let local = local_gradients(&node, operand_values(nodes, &node));
        let mut pending = [None, None];
        for (slot, (operand, partial)) in node.operands().zip(local).enumerate() {
            let contribution = upstream * partial;
            log::trace!("{id} -> {operand}: += {contribution}");
            nodes[operand.0].grad += contribution;
            stats.edges_propagated += 1;
            pending[slot] = Some((operand, contribution));
        }

        // Reversed so that p1 is expanded before p2.
        stack.extend(pending.into_iter().flatten().rev());
    }
}

/// Post-order of every node reachable from `root`, operands before users.
///
/// Iterative so that deep chains do not exhaust the call stack.
pub(crate) fn topological_order(nodes: &[Node], root: NodeId) -> Vec<NodeId> {
    let mut visited = vec![false; nodes.len()];
    let mut order = Vec::new();
    let mut stack = vec![(root, false)];

    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            order.push(id);
            continue;
        }
        if visited[id.0] {
            continue;
        }
        visited[id.0] = true;
        stack.push((id, true));

        // Reversed so that p1 is expanded before p2.
        for operand in nodes[id.0].operands().rev() {
            if !visited[operand.0] {
                stack.push((operand, false));
            }
        }
    }

    order
}
