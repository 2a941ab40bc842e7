//! Elementary circuits of a directed [`NetworkGraph`] (Johnson's algorithm).
//!
//! Strongly connected components are found first with an iterative Tarjan
//! pass; only non-trivial components (more than one node, or a self-loop)
//! can hold cycles, so acyclic parts of a large network cost one linear scan.
//! Inside each component, circuits are enumerated from every start node
//! against the nodes that follow it, with Johnson's blocking sets. Both
//! passes use explicit stacks.
//!
//! A cycle is reported as its node sequence; parallel edges between two
//! consecutive nodes do not produce distinct cycles.

use super::graph::NetworkGraph;
use super::node::NodeId;

const UNVISITED: usize = usize::MAX;

/// All simple directed cycles of `g`, each as a node sequence starting at
/// its smallest node.
pub fn simple_cycles(g: &NetworkGraph) -> Vec<Vec<NodeId>> {
    let succ = successor_lists(g);
    let mut components = strongly_connected(&succ);
    components.retain(|c| c.len() > 1 || succ[c[0]].contains(&c[0]));
    for c in &mut components {
        c.sort_unstable();
    }
    components.sort_unstable_by_key(|c| c[0]);

    let n = succ.len();
    let mut search = Johnson {
        succ: &succ,
        in_scope: vec![false; n],
        blocked: vec![false; n],
        blocked_by: vec![Vec::new(); n],
        cycles: Vec::new(),
    };
    for component in &components {
        for (i, &s) in component.iter().enumerate() {
            for &v in &component[i..] {
                search.in_scope[v] = true;
                search.blocked[v] = false;
                search.blocked_by[v].clear();
            }
            search.circuits_from(s);
            for &v in &component[i..] {
                search.in_scope[v] = false;
            }
        }
    }
    log::debug!(
        "simple cycles: {} in {} cyclic components",
        search.cycles.len(),
        components.len()
    );
    search.cycles
}

/// `true` if every consecutive pair of `cycle` (closing pair included) is
/// still joined by an edge in its direction.
pub fn is_intact(g: &NetworkGraph, cycle: &[NodeId]) -> bool {
    let Some(&first) = cycle.first() else {
        return false;
    };
    cycle
        .iter()
        .zip(cycle.iter().skip(1).chain(std::iter::once(&first)))
        .all(|(&a, &b)| g.has_edge(a, b))
}

/// Distinct successors of every node, in outgoing-edge order.
fn successor_lists(g: &NetworkGraph) -> Vec<Vec<usize>> {
    g.node_ids()
        .map(|n| {
            let mut out: Vec<usize> = Vec::with_capacity(g.out_degree(n));
            for &e in g.outgoing(n) {
                let t = g.target(e).index();
                if !out.contains(&t) {
                    out.push(t);
                }
            }
            out
        })
        .collect()
}

/// Iterative Tarjan SCC.
fn strongly_connected(succ: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let n = succ.len();
    let mut index = vec![UNVISITED; n];
    let mut low = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut components = Vec::new();
    let mut counter = 0usize;

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        let mut calls: Vec<(usize, usize)> = vec![(root, 0)];
        index[root] = counter;
        low[root] = counter;
        counter += 1;
        stack.push(root);
        on_stack[root] = true;

        while let Some(&(v, next)) = calls.last() {
            if let Some(&w) = succ[v].get(next) {
                if let Some(top) = calls.last_mut() {
                    top.1 += 1;
                }
                if index[w] == UNVISITED {
                    index[w] = counter;
                    low[w] = counter;
                    counter += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    calls.push((w, 0));
                } else if on_stack[w] {
                    low[v] = low[v].min(index[w]);
                }
                continue;
            }
            calls.pop();
            if let Some(&(parent, _)) = calls.last() {
                low[parent] = low[parent].min(low[v]);
            }
            if low[v] == index[v] {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                components.push(component);
            }
        }
    }
    components
}

#[derive(Copy, Clone)]
struct Frame {
    v: usize,
    next: usize,
    found: bool,
}

struct Johnson<'a> {
    succ: &'a [Vec<usize>],
    in_scope: Vec<bool>,
    blocked: Vec<bool>,
    blocked_by: Vec<Vec<usize>>,
    cycles: Vec<Vec<NodeId>>,
}

impl Johnson<'_> {
    fn circuits_from(&mut self, s: usize) {
        let succ = self.succ;
        let mut path = vec![s];
        let mut frames = vec![Frame {
            v: s,
            next: 0,
            found: false,
        }];
        self.blocked[s] = true;

        while let Some(top) = frames.last().copied() {
            if let Some(&w) = succ[top.v].get(top.next) {
                if let Some(f) = frames.last_mut() {
                    f.next += 1;
                }
                if !self.in_scope[w] {
                    continue;
                }
                if w == s {
                    self.cycles.push(path.iter().map(|&v| NodeId::new(v)).collect());
                    if let Some(f) = frames.last_mut() {
                        f.found = true;
                    }
                } else if !self.blocked[w] {
                    self.blocked[w] = true;
                    path.push(w);
                    frames.push(Frame {
                        v: w,
                        next: 0,
                        found: false,
                    });
                }
                continue;
            }
            frames.pop();
            if top.found {
                self.unblock(top.v);
            } else {
                for &w in &succ[top.v] {
                    if self.in_scope[w] && !self.blocked_by[w].contains(&top.v) {
                        self.blocked_by[w].push(top.v);
                    }
                }
            }
            path.pop();
            if let Some(parent) = frames.last_mut() {
                parent.found |= top.found;
            }
        }
    }

    fn unblock(&mut self, u: usize) {
        self.blocked[u] = false;
        let mut stack = vec![u];
        while let Some(x) = stack.pop() {
            for w in std::mem::take(&mut self.blocked_by[x]) {
                if self.blocked[w] {
                    self.blocked[w] = false;
                    stack.push(w);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FeatureId;
    use crate::geometry::{Coord, LineString};
    use crate::topology::graph::Directedness;
    use crate::topology::node::Dimension;

    /// Node `i` sits at `(i, 0)`; edges are given as index pairs.
    fn digraph(n: usize, arcs: &[(usize, usize)]) -> NetworkGraph {
        let mut g = NetworkGraph::new(Directedness::Directed, Dimension::Xy);
        for i in 0..n {
            g.add_node(&Coord::xy(i as f64, 0.0));
        }
        for (k, &(a, b)) in arcs.iter().enumerate() {
            let line = LineString::from_xy(&[(a as f64, 0.0), (a as f64 + 0.5, 1.0), (b as f64, 0.0)]);
            g.add_line(k, FeatureId(k as u64), &line);
        }
        g
    }

    fn ids(cycles: Vec<Vec<NodeId>>) -> Vec<Vec<usize>> {
        cycles
            .into_iter()
            .map(|c| c.into_iter().map(NodeId::index).collect())
            .collect()
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let g = digraph(4, &[(0, 1), (1, 2), (0, 2), (2, 3)]);
        assert!(simple_cycles(&g).is_empty());
    }

    #[test]
    fn finds_every_elementary_circuit() {
        // two triangles sharing the edge 1 -> 2
        let g = digraph(4, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 1)]);
        let mut found = ids(simple_cycles(&g));
        found.sort();
        assert_eq!(found, vec![vec![0, 1, 2], vec![1, 2, 3]]);
    }

    #[test]
    fn self_loops_and_two_cycles() {
        let g = digraph(3, &[(0, 0), (0, 1), (1, 0), (1, 2)]);
        let mut found = ids(simple_cycles(&g));
        found.sort();
        assert_eq!(found, vec![vec![0], vec![0, 1]]);
    }

    #[test]
    fn parallel_edges_do_not_duplicate_cycles() {
        let g = digraph(2, &[(0, 1), (0, 1), (1, 0)]);
        assert_eq!(simple_cycles(&g).len(), 1);
    }

    #[test]
    fn complete_digraph_cycle_count() {
        // K4 with both directions: 6 two-cycles, 8 three-cycles, 6 four-cycles
        let mut arcs = Vec::new();
        for a in 0..4 {
            for b in 0..4 {
                if a != b {
                    arcs.push((a, b));
                }
            }
        }
        let g = digraph(4, &arcs);
        assert_eq!(simple_cycles(&g).len(), 20);
    }

    #[test]
    fn intact_checks_direction() {
        let mut g = digraph(3, &[(0, 1), (1, 2), (2, 0)]);
        let cycles = simple_cycles(&g);
        assert_eq!(cycles.len(), 1);
        assert!(is_intact(&g, &cycles[0]));
        g.reverse_edge(crate::topology::node::EdgeId::new(1)).unwrap();
        assert!(!is_intact(&g, &cycles[0]));
    }
}
