//! Strahler orders and Shreve magnitudes.

use hashbrown::HashSet;

use super::{OrderState, StrahlerAlgorithm, Sweep};
use crate::progress::{Completion, ProgressMonitor, checkpoint};
use crate::topology::{EdgeId, NodeId};

#[derive(Copy, Clone)]
struct UpstreamFrame {
    edge: EdgeId,
    next: usize,
    cyclic: bool,
}

#[derive(Copy, Clone)]
struct DownstreamFrame {
    edge: EdgeId,
    next: usize,
    assigned: bool,
}

impl Sweep<'_> {
    pub(super) fn strahler_pass(
        &mut self,
        algorithm: StrahlerAlgorithm,
        shreve: bool,
        monitor: &mut dyn ProgressMonitor,
    ) -> Completion {
        let total = self.graph.edge_count();
        for (done, e) in self.graph.edge_ids().enumerate() {
            if checkpoint(monitor, done, total, "strahler") {
                return Completion::Cancelled;
            }
            if self.strahler[e.index()] != OrderState::Unset {
                continue;
            }
            match algorithm {
                StrahlerAlgorithm::SegmentOrigin => self.segment_origin_strahler(e, shreve),
                StrahlerAlgorithm::Legacy => self.legacy_strahler(e, shreve),
            }
        }
        Completion::Finished
    }

    /// Resolves `root` and everything upstream of it. An edge whose upstream
    /// closure contains an edge still on the stack stays `Pending`.
    fn segment_origin_strahler(&mut self, root: EdgeId, shreve: bool) {
        let g = self.graph;
        self.strahler[root.index()] = OrderState::Pending;
        let mut stack = vec![UpstreamFrame {
            edge: root,
            next: 0,
            cyclic: false,
        }];
        while let Some(&UpstreamFrame { edge, next, cyclic }) = stack.last() {
            if let Some(&up) = g.incoming(g.source(edge)).get(next) {
                match self.strahler[up.index()] {
                    OrderState::Unset => {
                        // revisit the same slot once `up` is resolved
                        self.strahler[up.index()] = OrderState::Pending;
                        stack.push(UpstreamFrame {
                            edge: up,
                            next: 0,
                            cyclic: false,
                        });
                    }
                    state => {
                        if let Some(top) = stack.last_mut() {
                            top.cyclic |= state == OrderState::Pending;
                            top.next += 1;
                        }
                    }
                }
                continue;
            }
            stack.pop();
            if !cyclic {
                self.assign_by_origin(edge, shreve);
            }
        }
    }

    fn assign_by_origin(&mut self, edge: EdgeId, shreve: bool) {
        let g = self.graph;
        let source = g.source(edge);
        let mut max_order = 0u32;
        let mut max_origin: Option<NodeId> = None;
        let mut ties = 0usize;
        for &up in g.incoming(source) {
            let Some(order) = self.strahler_of(up) else {
                continue;
            };
            let origin = self.origin[up.index()];
            if order > max_order {
                max_order = order;
                max_origin = origin;
                ties = 1;
            } else if order == max_order && origin != max_origin {
                ties += 1;
            }
        }
        let (order, origin) = match max_order {
            0 => (1, source),
            _ if ties > 1 => (max_order + 1, source),
            _ => (max_order, max_origin.unwrap_or(source)),
        };
        self.strahler[edge.index()] = OrderState::Order(order);
        self.origin[edge.index()] = Some(origin);
        if shreve {
            self.assign_shreve(edge, max_order == 0);
        }
    }

    /// Assigns `root` once its upstream edges are all ordered, then walks
    /// downstream into edges that are still unset.
    fn legacy_strahler(&mut self, root: EdgeId, shreve: bool) {
        let g = self.graph;
        let mut stack = vec![DownstreamFrame {
            edge: root,
            next: 0,
            assigned: false,
        }];
        while let Some(&frame) = stack.last() {
            if !frame.assigned {
                if !self.assign_by_ancestry(frame.edge, shreve) {
                    stack.pop();
                    continue;
                }
                if let Some(top) = stack.last_mut() {
                    top.assigned = true;
                }
            }
            let downstream = g.outgoing(g.target(frame.edge));
            let Some(&down) = downstream.get(frame.next) else {
                stack.pop();
                continue;
            };
            if let Some(top) = stack.last_mut() {
                top.next += 1;
            }
            if self.strahler[down.index()] == OrderState::Unset {
                stack.push(DownstreamFrame {
                    edge: down,
                    next: 0,
                    assigned: false,
                });
            }
        }
    }

    /// Returns `false` (and leaves `edge` unset) while an upstream edge is
    /// not ordered yet.
    fn assign_by_ancestry(&mut self, edge: EdgeId, shreve: bool) -> bool {
        let g = self.graph;
        let source = g.source(edge);
        let mut max_order = 0u32;
        let mut max_upstream: Option<EdgeId> = None;
        let mut ties = 0usize;
        for &up in g.incoming(source) {
            let Some(order) = self.strahler_of(up) else {
                return false;
            };
            if order > max_order {
                max_order = order;
                max_upstream = Some(up);
                ties = 1;
            } else if order == max_order
                && max_upstream.is_some_and(|best| !self.have_common_ancestors(up, best))
            {
                ties += 1;
            }
        }
        let order = match max_order {
            0 => 1,
            _ if ties > 1 => max_order + 1,
            _ => max_order,
        };
        self.strahler[edge.index()] = OrderState::Order(order);
        if shreve {
            self.assign_shreve(edge, max_order == 0);
        }
        true
    }

    fn ancestors(&self, edge: EdgeId) -> HashSet<EdgeId> {
        let g = self.graph;
        let mut seen = HashSet::new();
        let mut stack = vec![edge];
        while let Some(e) = stack.pop() {
            for &up in g.incoming(g.source(e)) {
                if seen.insert(up) {
                    stack.push(up);
                }
            }
        }
        seen
    }

    fn have_common_ancestors(&self, a: EdgeId, b: EdgeId) -> bool {
        let left = self.ancestors(a);
        let right = self.ancestors(b);
        let (small, large) = if left.len() <= right.len() {
            (&left, &right)
        } else {
            (&right, &left)
        };
        small.iter().any(|e| large.contains(e))
    }

    /// 1 for a head edge, otherwise the upstream magnitude shared among the
    /// edges leaving the source node.
    fn assign_shreve(&mut self, edge: EdgeId, head: bool) {
        let g = self.graph;
        let value = if head {
            1.0
        } else {
            let source = g.source(edge);
            let sum: f64 = g
                .incoming(source)
                .iter()
                .map(|&up| self.shreve[up.index()].unwrap_or(0.0))
                .sum();
            sum / g.out_degree(source) as f64
        };
        self.shreve[edge.index()] = Some(value);
    }
}
