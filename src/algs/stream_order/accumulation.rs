//! Longest upstream path and flow accumulation.
//!
//! Both start from the edge's own length. Max distance adds the largest max
//! distance among the edges entering the source node; flow accumulation adds
//! their summed flow divided among the edges leaving that node.

use super::Sweep;
use crate::progress::{Completion, ProgressMonitor, checkpoint};
use crate::topology::EdgeId;

impl Sweep<'_> {
    pub(super) fn accumulation_pass(&mut self, monitor: &mut dyn ProgressMonitor) -> Completion {
        let total = self.graph.edge_count();
        for (done, e) in self.graph.edge_ids().enumerate() {
            if checkpoint(monitor, done, total, "metrics") {
                return Completion::Cancelled;
            }
            if self.max_distance[e.index()].is_none() {
                self.accumulate(e);
            }
        }
        Completion::Finished
    }

    fn seed(&mut self, e: EdgeId) {
        let len = self.lengths[e.index()];
        self.max_distance[e.index()] = Some(len);
        self.flow[e.index()] = Some(len);
    }

    fn accumulate(&mut self, root: EdgeId) {
        let g = self.graph;
        self.seed(root);
        let mut stack: Vec<(EdgeId, usize)> = vec![(root, 0)];
        while let Some(&(edge, next)) = stack.last() {
            let upstream = g.incoming(g.source(edge));
            if let Some(&up) = upstream.get(next) {
                if self.max_distance[up.index()].is_none() {
                    self.seed(up);
                    stack.push((up, 0));
                } else if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                continue;
            }
            stack.pop();

            // edges still on the stack contribute their seeded length
            let mut longest = 0.0f64;
            let mut inflow = 0.0f64;
            for &up in upstream {
                let d = self.max_distance[up.index()].unwrap_or(0.0);
                if d > longest {
                    longest = d;
                }
                inflow += self.flow[up.index()].unwrap_or(0.0);
            }
            let i = edge.index();
            let len = self.lengths[i];
            self.max_distance[i] = Some(len + longest);
            self.flow[i] = Some(len + inflow / g.out_degree(g.source(edge)) as f64);
        }
    }
}
