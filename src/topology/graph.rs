//! `NetworkGraph`: an arena multigraph built from line features.
//!
//! Each linear feature becomes one edge from the node at its first vertex to
//! the node at its last vertex. Parallel edges and self-loops are kept. In a
//! directed graph an edge's orientation is the digitized orientation of its
//! line; [`NetworkGraph::reverse_edge`] flips it in place and records the
//! parity so callers can tell which features ended up reversed.
//!
//! Adjacency lists are ordered by insertion: an edge appears in its
//! endpoints' lists in input order, and a reversed edge moves to the end of
//! its new lists.

use hashbrown::HashSet;

use super::node::{Dimension, EdgeId, NodeId, NodeRegistry};
use crate::data::{Feature, FeatureId};
use crate::geometry::{Coord, LineString};
use crate::network_error::NetworkError;

/// Whether edge orientation carries meaning.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Directedness {
    #[default]
    Undirected,
    Directed,
}

#[derive(Clone, Debug, Default)]
struct Incidence {
    incoming: Vec<EdgeId>,
    outgoing: Vec<EdgeId>,
}

/// One edge of the graph and the feature it was built from.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeData {
    feature: usize,
    feature_id: FeatureId,
    source: NodeId,
    target: NodeId,
    reversed: bool,
}

impl EdgeData {
    /// Index of the originating feature in the input slice.
    #[inline]
    pub fn feature_index(&self) -> usize {
        self.feature
    }

    #[inline]
    pub fn feature_id(&self) -> FeatureId {
        self.feature_id
    }

    #[inline]
    pub fn source(&self) -> NodeId {
        self.source
    }

    #[inline]
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// `true` if the edge has been reversed an odd number of times.
    #[inline]
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    #[inline]
    pub fn is_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Outcome of building a graph from features.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuildReport {
    pub edges: usize,
    /// Features left out because they are not a non-empty line.
    pub skipped: Vec<FeatureId>,
}

#[derive(Clone, Debug)]
pub struct NetworkGraph {
    directedness: Directedness,
    registry: NodeRegistry,
    nodes: Vec<Incidence>,
    edges: Vec<EdgeData>,
}

impl NetworkGraph {
    pub fn new(directedness: Directedness, dimension: Dimension) -> Self {
        Self {
            directedness,
            registry: NodeRegistry::new(dimension),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Builds a graph with one edge per linear feature.
    pub fn from_features(
        features: &[Feature],
        directedness: Directedness,
        dimension: Dimension,
    ) -> (Self, BuildReport) {
        Self::from_indexed(features, 0..features.len(), directedness, dimension)
    }

    /// Builds a graph from the features at `indices`, in that order.
    pub fn from_indexed<I>(
        features: &[Feature],
        indices: I,
        directedness: Directedness,
        dimension: Dimension,
    ) -> (Self, BuildReport)
    where
        I: IntoIterator<Item = usize>,
    {
        let mut graph = Self::new(directedness, dimension);
        let mut report = BuildReport::default();
        for i in indices {
            let feature = &features[i];
            let added = feature
                .line()
                .and_then(|line| graph.add_line(i, feature.id, line));
            if added.is_none() {
                log::warn!(
                    "feature {}: {} geometry is not a usable line, skipped",
                    feature.id,
                    feature.geometry.kind_name()
                );
                report.skipped.push(feature.id);
            }
        }
        report.edges = graph.edge_count();
        log::debug!(
            "built {:?} graph: {} nodes, {} edges, {} skipped",
            directedness,
            graph.node_count(),
            graph.edge_count(),
            report.skipped.len()
        );
        (graph, report)
    }

    /// Adds an edge from the first to the last vertex of `line`. Returns
    /// `None` and leaves the graph untouched when `line` is empty.
    pub fn add_line(
        &mut self,
        feature: usize,
        feature_id: FeatureId,
        line: &LineString,
    ) -> Option<EdgeId> {
        let (first, last) = (line.first()?, line.last()?);
        let source = self.resolve(first);
        let target = self.resolve(last);
        let id = EdgeId::new(self.edges.len());
        self.edges.push(EdgeData {
            feature,
            feature_id,
            source,
            target,
            reversed: false,
        });
        self.nodes[source.index()].outgoing.push(id);
        self.nodes[target.index()].incoming.push(id);
        Some(id)
    }

    /// Returns the node at `c`, creating an isolated one if needed.
    pub fn add_node(&mut self, c: &Coord) -> NodeId {
        self.resolve(c)
    }

    fn resolve(&mut self, c: &Coord) -> NodeId {
        let id = self.registry.resolve(c);
        if id.index() == self.nodes.len() {
            self.nodes.push(Incidence::default());
        }
        id
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[inline]
    pub fn directedness(&self) -> Directedness {
        self.directedness
    }

    #[inline]
    pub fn is_directed(&self) -> bool {
        self.directedness == Directedness::Directed
    }

    #[inline]
    pub fn dimension(&self) -> Dimension {
        self.registry.dimension()
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len()).map(NodeId::new)
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + use<> {
        (0..self.edges.len()).map(EdgeId::new)
    }

    /// Coordinate the node was first seen with.
    pub fn coord(&self, n: NodeId) -> Coord {
        self.registry
            .coord(n)
            .copied()
            .unwrap_or(Coord::xy(f64::NAN, f64::NAN))
    }

    pub fn node_at(&self, c: &Coord) -> Option<NodeId> {
        self.registry.get(c)
    }

    #[inline]
    pub fn edge(&self, e: EdgeId) -> &EdgeData {
        &self.edges[e.index()]
    }

    pub fn try_edge(&self, e: EdgeId) -> Result<&EdgeData, NetworkError> {
        self.edges.get(e.index()).ok_or(NetworkError::MissingEdge(e))
    }

    pub fn try_coord(&self, n: NodeId) -> Result<Coord, NetworkError> {
        self.registry
            .coord(n)
            .copied()
            .ok_or(NetworkError::MissingNode(n))
    }

    #[inline]
    pub fn source(&self, e: EdgeId) -> NodeId {
        self.edges[e.index()].source
    }

    #[inline]
    pub fn target(&self, e: EdgeId) -> NodeId {
        self.edges[e.index()].target
    }

    /// The endpoint of `e` that is not `n` (or `n` itself for a self-loop).
    pub fn opposite(&self, e: EdgeId, n: NodeId) -> NodeId {
        let edge = self.edge(e);
        if edge.source == n { edge.target } else { edge.source }
    }

    #[inline]
    pub fn incoming(&self, n: NodeId) -> &[EdgeId] {
        &self.nodes[n.index()].incoming
    }

    #[inline]
    pub fn outgoing(&self, n: NodeId) -> &[EdgeId] {
        &self.nodes[n.index()].outgoing
    }

    #[inline]
    pub fn in_degree(&self, n: NodeId) -> usize {
        self.nodes[n.index()].incoming.len()
    }

    #[inline]
    pub fn out_degree(&self, n: NodeId) -> usize {
        self.nodes[n.index()].outgoing.len()
    }

    /// Edge-end count at `n`; a self-loop counts twice.
    #[inline]
    pub fn degree(&self, n: NodeId) -> usize {
        self.in_degree(n) + self.out_degree(n)
    }

    /// Distinct edges touching `n`: outgoing first, then incoming.
    pub fn incident_edges(&self, n: NodeId) -> Vec<EdgeId> {
        let node = &self.nodes[n.index()];
        let mut out = node.outgoing.clone();
        out.extend(
            node.incoming
                .iter()
                .copied()
                .filter(|&e| !self.edges[e.index()].is_loop()),
        );
        out
    }

    /// Edges whose both endpoints are in `nodes`, in edge order.
    pub fn induced_edges(&self, nodes: &HashSet<NodeId>) -> Vec<EdgeId> {
        let mut out: Vec<EdgeId> = nodes
            .iter()
            .flat_map(|&n| self.outgoing(n).iter().copied())
            .filter(|&e| nodes.contains(&self.target(e)))
            .collect();
        out.sort_unstable();
        out
    }

    /// `true` if some edge runs from `from` to `to`.
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.outgoing(from).iter().any(|&e| self.target(e) == to)
    }

    /// Edges that have been reversed an odd number of times, in edge order.
    pub fn reversed_edges(&self) -> Vec<EdgeId> {
        self.edge_ids().filter(|&e| self.edge(e).reversed).collect()
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Swaps the endpoints of `e`.
    ///
    /// The edge leaves the adjacency lists of its old orientation and is
    /// appended to those of the new one; its reversal parity flips.
    pub fn reverse_edge(&mut self, e: EdgeId) -> Result<(), NetworkError> {
        if !self.is_directed() {
            return Err(NetworkError::UndirectedGraph("reverse_edge"));
        }
        let edge = self
            .edges
            .get_mut(e.index())
            .ok_or(NetworkError::MissingEdge(e))?;
        let (old_source, old_target) = (edge.source, edge.target);
        edge.source = old_target;
        edge.target = old_source;
        edge.reversed = !edge.reversed;

        self.nodes[old_source.index()].outgoing.retain(|&x| x != e);
        self.nodes[old_target.index()].incoming.retain(|&x| x != e);
        self.nodes[old_target.index()].outgoing.push(e);
        self.nodes[old_source.index()].incoming.push(e);
        log::trace!("reversed edge {e}: now {old_target} -> {old_source}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;

    fn line(points: &[(f64, f64)]) -> Feature {
        Feature::new(0, LineString::from_xy(points))
    }

    fn with_ids(mut features: Vec<Feature>) -> Vec<Feature> {
        for (i, f) in features.iter_mut().enumerate() {
            f.id = FeatureId(i as u64 + 1);
        }
        features
    }

    #[test]
    fn endpoints_become_shared_nodes() {
        let features = with_ids(vec![
            line(&[(0.0, 0.0), (5.0, 5.0), (10.0, 0.0)]),
            line(&[(10.0, 0.0), (20.0, 0.0)]),
            line(&[(10.0, 0.0), (10.0, -10.0)]),
        ]);
        let (g, report) =
            NetworkGraph::from_features(&features, Directedness::Directed, Dimension::Xy);
        assert_eq!(report.edges, 3);
        assert!(report.skipped.is_empty());
        assert_eq!(g.node_count(), 4);
        let hub = g.node_at(&Coord::xy(10.0, 0.0)).unwrap();
        assert_eq!(g.in_degree(hub), 1);
        assert_eq!(g.out_degree(hub), 2);
        assert_eq!(g.degree(hub), 3);
        assert_eq!(g.edge(EdgeId::new(1)).feature_id(), FeatureId(2));
    }

    #[test]
    fn non_linear_features_are_skipped() {
        let mut features = with_ids(vec![line(&[(0.0, 0.0), (1.0, 0.0)])]);
        features.push(Feature::new(9, Geometry::Point(Coord::xy(3.0, 3.0))));
        features.push(Feature::new(10, LineString::new(vec![])));
        let (g, report) =
            NetworkGraph::from_features(&features, Directedness::Undirected, Dimension::Xy);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(report.skipped, vec![FeatureId(9), FeatureId(10)]);
    }

    #[test]
    fn parallel_edges_and_loops_are_kept() {
        let features = with_ids(vec![
            line(&[(0.0, 0.0), (1.0, 1.0)]),
            line(&[(0.0, 0.0), (0.5, 2.0), (1.0, 1.0)]),
            line(&[(1.0, 1.0), (2.0, 2.0), (2.0, 1.0), (1.0, 1.0)]),
        ]);
        let (g, _) = NetworkGraph::from_features(&features, Directedness::Directed, Dimension::Xy);
        assert_eq!(g.node_count(), 2);
        let b = g.node_at(&Coord::xy(1.0, 1.0)).unwrap();
        assert_eq!(g.in_degree(b), 3);
        assert_eq!(g.out_degree(b), 1);
        assert_eq!(g.degree(b), 4);
        assert_eq!(g.incident_edges(b).len(), 3);
        assert!(g.edge(EdgeId::new(2)).is_loop());
    }

    #[test]
    fn reversal_moves_edge_and_tracks_parity() {
        let features = with_ids(vec![
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            line(&[(1.0, 0.0), (2.0, 0.0)]),
            line(&[(3.0, 0.0), (1.0, 0.0)]),
        ]);
        let (mut g, _) =
            NetworkGraph::from_features(&features, Directedness::Directed, Dimension::Xy);
        let mid = g.node_at(&Coord::xy(1.0, 0.0)).unwrap();
        let e0 = EdgeId::new(0);
        g.reverse_edge(e0).unwrap();
        assert_eq!(g.incoming(mid), &[EdgeId::new(2)]);
        assert_eq!(g.outgoing(mid), &[EdgeId::new(1), e0]);
        assert_eq!(g.reversed_edges(), vec![e0]);
        g.reverse_edge(e0).unwrap();
        assert!(g.reversed_edges().is_empty());
        assert_eq!(g.incoming(mid), &[EdgeId::new(2), e0]);
    }

    #[test]
    fn reversal_requires_directed_graph() {
        let features = with_ids(vec![line(&[(0.0, 0.0), (1.0, 0.0)])]);
        let (mut g, _) =
            NetworkGraph::from_features(&features, Directedness::Undirected, Dimension::Xy);
        assert_eq!(
            g.reverse_edge(EdgeId::new(0)),
            Err(NetworkError::UndirectedGraph("reverse_edge"))
        );
        let (mut d, _) =
            NetworkGraph::from_features(&features, Directedness::Directed, Dimension::Xy);
        assert_eq!(
            d.reverse_edge(EdgeId::new(5)),
            Err(NetworkError::MissingEdge(EdgeId::new(5)))
        );
    }
}
