//! BFS/DFS walks over a [`NetworkGraph`].
//!
//! Walks take a [`FlowView`]: `Downstream` follows edges along their
//! orientation, `Upstream` against it. All walks use explicit queues or
//! stacks, so deep networks cannot overflow the call stack.

use std::collections::VecDeque;

use super::graph::NetworkGraph;
use super::node::{EdgeId, NodeId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlowView {
    Downstream,
    Upstream,
}

impl FlowView {
    /// Edges leaving `n` in this view.
    #[inline]
    pub fn out_edges(self, g: &NetworkGraph, n: NodeId) -> &[EdgeId] {
        match self {
            FlowView::Downstream => g.outgoing(n),
            FlowView::Upstream => g.incoming(n),
        }
    }

    #[inline]
    pub fn in_degree(self, g: &NetworkGraph, n: NodeId) -> usize {
        match self {
            FlowView::Downstream => g.in_degree(n),
            FlowView::Upstream => g.out_degree(n),
        }
    }

    #[inline]
    pub fn out_degree(self, g: &NetworkGraph, n: NodeId) -> usize {
        match self {
            FlowView::Downstream => g.out_degree(n),
            FlowView::Upstream => g.in_degree(n),
        }
    }

    /// Far end of `e` when walking in this view.
    #[inline]
    pub fn head(self, g: &NetworkGraph, e: EdgeId) -> NodeId {
        match self {
            FlowView::Downstream => g.target(e),
            FlowView::Upstream => g.source(e),
        }
    }
}

/// Breadth-first walk from `start` that stops at the first visited node
/// accepted by `stop` (the start node is offered first).
///
/// Returns the accepted node and the edges of the BFS-tree path leading to
/// it, ordered from `start`.
pub fn bfs_path_to<F>(
    g: &NetworkGraph,
    start: NodeId,
    view: FlowView,
    mut stop: F,
) -> Option<(NodeId, Vec<EdgeId>)>
where
    F: FnMut(NodeId) -> bool,
{
    let mut parent: Vec<Option<EdgeId>> = vec![None; g.node_count()];
    let mut seen = vec![false; g.node_count()];
    let mut queue = VecDeque::from([start]);
    seen[start.index()] = true;
    while let Some(n) = queue.pop_front() {
        if stop(n) {
            let mut path = Vec::new();
            let mut cur = n;
            while let Some(e) = parent[cur.index()] {
                path.push(e);
                cur = g.opposite(e, cur);
            }
            path.reverse();
            return Some((n, path));
        }
        for &e in view.out_edges(g, n) {
            let m = view.head(g, e);
            if !seen[m.index()] {
                seen[m.index()] = true;
                parent[m.index()] = Some(e);
                queue.push_back(m);
            }
        }
    }
    None
}

/// `true` if a directed path leads from `n` back to itself.
pub fn lies_on_cycle(g: &NetworkGraph, n: NodeId) -> bool {
    let mut seen = vec![false; g.node_count()];
    let mut stack: Vec<NodeId> = g.outgoing(n).iter().map(|&e| g.target(e)).collect();
    while let Some(m) = stack.pop() {
        if m == n {
            return true;
        }
        if std::mem::replace(&mut seen[m.index()], true) {
            continue;
        }
        stack.extend(g.outgoing(m).iter().map(|&e| g.target(e)));
    }
    false
}

/// Weakly connected components, each listed in discovery order. Components
/// are ordered by their smallest node.
pub fn connected_components(g: &NetworkGraph) -> Vec<Vec<NodeId>> {
    let mut seen = vec![false; g.node_count()];
    let mut components = Vec::new();
    for root in g.node_ids() {
        if seen[root.index()] {
            continue;
        }
        seen[root.index()] = true;
        let mut component = vec![root];
        let mut queue = VecDeque::from([root]);
        while let Some(n) = queue.pop_front() {
            for e in g.incident_edges(n) {
                let m = g.opposite(e, n);
                if !seen[m.index()] {
                    seen[m.index()] = true;
                    component.push(m);
                    queue.push_back(m);
                }
            }
        }
        components.push(component);
    }
    components
}
