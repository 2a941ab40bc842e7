//! Horton orders: the main stem of every confluence carries the highest
//! order found downstream of it, side branches keep their Strahler order.

use super::Sweep;
use crate::progress::{Completion, ProgressMonitor, checkpoint};
use crate::topology::{EdgeId, NodeId};

#[derive(Copy, Clone)]
struct Frame {
    edge: EdgeId,
    next: usize,
    descended: bool,
    max_down: u32,
}

impl Frame {
    fn new(edge: EdgeId) -> Self {
        Self {
            edge,
            next: 0,
            descended: false,
            max_down: 0,
        }
    }
}

impl Sweep<'_> {
    pub(super) fn horton_pass(&mut self, monitor: &mut dyn ProgressMonitor) -> Completion {
        let total = self.graph.edge_count();
        let mut on_stack = vec![false; total];
        for (done, e) in self.graph.edge_ids().enumerate() {
            if checkpoint(monitor, done, total, "horton") {
                return Completion::Cancelled;
            }
            if self.horton[e.index()].is_none() {
                self.horton_from(e, &mut on_stack);
            }
        }
        Completion::Finished
    }

    fn horton_from(&mut self, root: EdgeId, on_stack: &mut [bool]) {
        let g = self.graph;
        on_stack[root.index()] = true;
        let mut stack = vec![Frame::new(root)];
        while let Some(&frame) = stack.last() {
            let edge = frame.edge;
            let Some(order) = self.strahler_of(edge) else {
                on_stack[edge.index()] = false;
                stack.pop();
                continue;
            };
            let target = g.target(edge);
            let downstream = g.outgoing(target);
            if downstream.is_empty() {
                self.horton[edge.index()] = Some(order);
                on_stack[edge.index()] = false;
                stack.pop();
                continue;
            }
            if let Some(&down) = downstream.get(frame.next) {
                let descend = !frame.descended
                    && self.horton[down.index()].is_none()
                    && !on_stack[down.index()];
                if descend {
                    if let Some(top) = stack.last_mut() {
                        top.descended = true;
                    }
                    on_stack[down.index()] = true;
                    stack.push(Frame::new(down));
                } else if let Some(top) = stack.last_mut() {
                    if let Some(h) = self.horton[down.index()] {
                        top.max_down = top.max_down.max(h);
                    }
                    top.next += 1;
                    top.descended = false;
                }
                continue;
            }
            on_stack[edge.index()] = false;
            stack.pop();
            self.settle_confluence(target, frame.max_down);
        }
    }

    /// Gives `max_down` to the main stem entering `node` and each other
    /// entering edge its own Strahler order.
    fn settle_confluence(&mut self, node: NodeId, max_down: u32) {
        let g = self.graph;
        let mut main: Option<EdgeId> = None;
        let mut max_order = 0u32;
        let mut max_flow = 0.0f64;
        for &e in g.incoming(node) {
            let Some(order) = self.strahler_of(e) else {
                continue;
            };
            let flow = self.flow[e.index()].unwrap_or(0.0);
            if order > max_order || (order == max_order && flow > max_flow) {
                max_order = order;
                max_flow = flow;
                main = Some(e);
            }
        }
        for &e in g.incoming(node) {
            self.horton[e.index()] = if Some(e) == main {
                Some(max_down)
            } else {
                self.strahler_of(e)
            };
        }
    }
}
