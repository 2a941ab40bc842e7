//! Hack orders, computed from the outlets up.
//!
//! An outlet edge has order 1. At each confluence the entering edge with the
//! largest flow (respectively max distance, or their product) continues the
//! order of the main downstream edge; every other entering edge starts a new
//! stream with that order plus one. The main downstream edge of a diffluence
//! is the one with the largest `mouth distance / order`.

use super::Sweep;
use crate::progress::{Completion, ProgressMonitor, checkpoint};
use crate::topology::{EdgeId, NodeId};

/// A Hack order, or the marker of an edge still being resolved.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Rank {
    Pending,
    Of(u32),
}

impl Rank {
    /// Pending edges divide as if their order were unbounded.
    fn divisor(self) -> f64 {
        match self {
            Rank::Pending => f64::from(i32::MAX),
            Rank::Of(r) => f64::from(r),
        }
    }

    fn next(self) -> Rank {
        match self {
            Rank::Pending => Rank::Pending,
            Rank::Of(r) => Rank::Of(r + 1),
        }
    }

    fn value(self) -> Option<u32> {
        match self {
            Rank::Pending => None,
            Rank::Of(r) => Some(r),
        }
    }
}

/// One Hack metric: its order and the value the order was derived from.
#[derive(Clone, Default)]
struct Column {
    order: Vec<Option<Rank>>,
    value: Vec<Option<f64>>,
}

impl Column {
    fn new(n: usize) -> Self {
        Self {
            order: vec![None; n],
            value: vec![None; n],
        }
    }

    fn set(&mut self, e: EdgeId, rank: Rank, value: f64) {
        self.order[e.index()] = Some(rank);
        self.value[e.index()] = Some(value);
    }

    /// The downstream edge with the largest `mouth / order`, strictly.
    fn main_downstream(&self, downstream: &[EdgeId], mouth: &[Option<f64>]) -> Option<EdgeId> {
        let mut best = None;
        let mut best_ratio = 0.0f64;
        for &d in downstream {
            if let (Some(rank), Some(m)) = (self.order[d.index()], mouth[d.index()]) {
                let ratio = m / rank.divisor();
                if ratio > best_ratio {
                    best_ratio = ratio;
                    best = Some(d);
                }
            }
        }
        best
    }

    /// Order and value carried on by the main stem.
    fn continued(&self, main: Option<EdgeId>) -> (Rank, f64) {
        main.and_then(|d| {
            self.order[d.index()].map(|r| (r, self.value[d.index()].unwrap_or(0.0)))
        })
        .unwrap_or((Rank::Of(1), 0.0))
    }
}

#[derive(Clone, Default)]
pub(crate) struct HackColumns {
    distance: Column,
    flow: Column,
    combined: Column,
    mouth: Vec<Option<f64>>,
}

/// Finalized Hack values of one edge.
pub(crate) struct HackRow {
    pub distance_order: Option<u32>,
    pub distance: Option<f64>,
    pub flow_order: Option<u32>,
    pub flow: Option<f64>,
    pub df_order: Option<u32>,
    pub df: Option<f64>,
    pub mouth: Option<f64>,
}

impl HackColumns {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            distance: Column::new(n),
            flow: Column::new(n),
            combined: Column::new(n),
            mouth: vec![None; n],
        }
    }

    /// Values of edge `i`; pending orders read as undefined.
    pub(crate) fn row(&self, i: usize) -> HackRow {
        let order = |c: &Column| c.order.get(i).copied().flatten().and_then(Rank::value);
        let value = |c: &Column| c.value.get(i).copied().flatten();
        HackRow {
            distance_order: order(&self.distance),
            distance: value(&self.distance),
            flow_order: order(&self.flow),
            flow: value(&self.flow),
            df_order: order(&self.combined),
            df: value(&self.combined),
            mouth: self.mouth.get(i).copied().flatten(),
        }
    }

    fn is_unresolved(&self, e: EdgeId) -> bool {
        self.distance.order[e.index()].is_none() || self.flow.order[e.index()].is_none()
    }

    fn mark_pending(&mut self, e: EdgeId) {
        self.distance.order[e.index()] = Some(Rank::Pending);
        self.flow.order[e.index()] = Some(Rank::Pending);
    }
}

#[derive(Copy, Clone)]
struct Frame {
    edge: EdgeId,
    next: usize,
    descended: bool,
}

impl Sweep<'_> {
    pub(super) fn hack_pass(&mut self, monitor: &mut dyn ProgressMonitor) -> Completion {
        let total = self.graph.edge_count();
        for (done, e) in self.graph.edge_ids().enumerate() {
            if checkpoint(monitor, done, total, "hack") {
                return Completion::Cancelled;
            }
            if self.hack.distance.order[e.index()].is_none() {
                self.hack_from(e);
            }
        }
        Completion::Finished
    }

    fn hack_from(&mut self, root: EdgeId) {
        let g = self.graph;
        self.hack.mark_pending(root);
        let mut stack = vec![Frame {
            edge: root,
            next: 0,
            descended: false,
        }];
        while let Some(&frame) = stack.last() {
            let target = g.target(frame.edge);
            let downstream = g.outgoing(target);
            if downstream.is_empty() {
                stack.pop();
                self.settle_outlet(frame.edge);
                continue;
            }
            if let Some(&down) = downstream.get(frame.next) {
                if !frame.descended && self.hack.is_unresolved(down) {
                    if let Some(top) = stack.last_mut() {
                        top.descended = true;
                    }
                    self.hack.mark_pending(down);
                    stack.push(Frame {
                        edge: down,
                        next: 0,
                        descended: false,
                    });
                } else if let Some(top) = stack.last_mut() {
                    top.next += 1;
                    top.descended = false;
                }
                continue;
            }
            stack.pop();
            self.settle_hack_confluence(frame.edge, target);
        }
    }

    fn settle_outlet(&mut self, e: EdgeId) {
        let i = e.index();
        let distance = self.max_distance[i].unwrap_or(0.0);
        let flow = self.flow[i].unwrap_or(0.0);
        self.hack.distance.set(e, Rank::Of(1), distance);
        self.hack.flow.set(e, Rank::Of(1), flow);
        self.hack.combined.set(e, Rank::Of(1), flow * distance);
        self.hack.mouth[i] = Some(self.lengths[i]);
    }

    /// Settles `edge` and every other edge entering `node`, once the edges
    /// leaving `node` are resolved.
    fn settle_hack_confluence(&mut self, edge: EdgeId, node: NodeId) {
        let g = self.graph;
        let downstream = g.outgoing(node);
        let hack = &self.hack;
        let main_distance = hack.distance.main_downstream(downstream, &hack.mouth);
        let main_flow = hack.flow.main_downstream(downstream, &hack.mouth);
        let main_combined = hack.combined.main_downstream(downstream, &hack.mouth);
        let max_mouth = downstream
            .iter()
            .filter_map(|d| hack.mouth[d.index()])
            .fold(0.0f64, |acc, m| if m > acc { m } else { acc });
        self.hack.mouth[edge.index()] = Some(self.lengths[edge.index()] + max_mouth);

        let (d_rank, d_value) = self.hack.distance.continued(main_distance);
        let (f_rank, f_value) = self.hack.flow.continued(main_flow);
        let (c_rank, c_value) = self.hack.combined.continued(main_combined);

        let upstream = g.incoming(node);
        let (mut best_flow, mut best_dist, mut best_df) = (0.0f64, 0.0f64, 0.0f64);
        let (mut flow_edge, mut dist_edge, mut df_edge) = (None, None, None);
        for &e in upstream {
            let flow = self.flow[e.index()].unwrap_or(0.0);
            let dist = self.max_distance[e.index()].unwrap_or(0.0);
            if flow > best_flow {
                best_flow = flow;
                flow_edge = Some(e);
            }
            if dist > best_dist {
                best_dist = dist;
                dist_edge = Some(e);
            }
            if dist * flow > best_df {
                best_df = dist * flow;
                df_edge = Some(e);
            }
        }
        for &e in upstream {
            let i = e.index();
            let flow = self.flow[i].unwrap_or(0.0);
            let dist = self.max_distance[i].unwrap_or(0.0);
            if Some(e) == flow_edge {
                self.hack.flow.set(e, f_rank, f_value);
            } else {
                self.hack.flow.set(e, f_rank.next(), flow);
            }
            if Some(e) == dist_edge {
                self.hack.distance.set(e, d_rank, d_value);
            } else {
                self.hack.distance.set(e, d_rank.next(), dist);
            }
            if Some(e) == df_edge {
                self.hack.combined.set(e, c_rank, c_value);
            } else {
                self.hack.combined.set(e, c_rank.next(), dist * flow);
            }
            self.hack.mouth[i] = Some(self.lengths[i] + max_mouth);
        }
    }
}
